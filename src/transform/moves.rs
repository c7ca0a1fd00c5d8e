//! History-preserving file relocation.
//!
//! Modeled as a capability: a mover either supports preserving per-line
//! history for a move or reports why it cannot, and the caller falls back to
//! copy+delete with the degradation recorded. A missing capability is never
//! a failure by itself.

use crate::errors::SplitmapError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryOutcome {
    /// The storage layer recorded a rename; per-line history follows the file
    Preserved,
    /// Copy+delete fallback; the reason names the missing capability
    Degraded(String),
}

pub enum MoveSupport {
    Supported,
    Unsupported(String),
}

pub trait HistoryPreservingMove {
    /// Relocate `src` to `dst` if the capability is available. On
    /// `Unsupported` before any filesystem change, the caller performs the
    /// fallback; on `Unsupported` after relocation the move stands and only
    /// the history flag degrades.
    fn try_move(&self, src: &Path, dst: &Path) -> Result<MoveSupport, SplitmapError>;
}

/// Rename through the git index, so the move is recorded where git's
/// similarity detection will follow per-line history across it.
pub struct GitIndexMove;

impl HistoryPreservingMove for GitIndexMove {
    fn try_move(&self, src: &Path, dst: &Path) -> Result<MoveSupport, SplitmapError> {
        let repo = match git2::Repository::discover(src.parent().unwrap_or(src)) {
            Ok(repo) => repo,
            Err(_) => return Ok(MoveSupport::Unsupported("not a git repository".to_string())),
        };
        let Some(workdir) = repo.workdir().map(Path::to_path_buf) else {
            return Ok(MoveSupport::Unsupported("bare repository".to_string()));
        };
        let (Some(rel_src), Some(rel_dst)) = (
            pathdiff::diff_paths(src, &workdir),
            pathdiff::diff_paths(dst, &workdir),
        ) else {
            return Ok(MoveSupport::Unsupported(
                "paths outside the repository work tree".to_string(),
            ));
        };

        let mut index = repo
            .index()
            .map_err(|e| SplitmapError::Backup { message: format!("git index: {e}") })?;
        if index.get_path(&rel_src, 0).is_none() {
            return Ok(MoveSupport::Unsupported(
                "source not tracked in the git index".to_string(),
            ));
        }

        if let Some(parent) = dst.parent() {
            crate::io::retry_transient(parent, || std::fs::create_dir_all(parent))?;
        }
        crate::io::retry_transient(src, || std::fs::rename(src, dst))?;

        let result = index
            .remove_path(&rel_src)
            .and_then(|_| index.add_path(&rel_dst))
            .and_then(|_| index.write());
        if let Err(e) = result {
            // The rename already happened; only the history flag degrades.
            log::warn!("git index update failed after rename: {e}");
            return Ok(MoveSupport::Unsupported(format!("git index update failed: {e}")));
        }
        Ok(MoveSupport::Supported)
    }
}

/// Move `src` to `dst`, preferring history preservation and falling back to
/// copy+delete. Returns how the move was accomplished; never fails solely
/// for lacking history support.
pub fn move_with_history(src: &Path, dst: &Path) -> Result<HistoryOutcome, SplitmapError> {
    match GitIndexMove.try_move(src, dst)? {
        MoveSupport::Supported => Ok(HistoryOutcome::Preserved),
        MoveSupport::Unsupported(reason) => {
            if !dst.exists() {
                let contents = crate::io::read_retry(src)?;
                crate::io::write_retry(dst, &contents)?;
                crate::io::retry_transient(src, || std::fs::remove_file(src))?;
            }
            log::debug!("history-preserving move unavailable ({reason}), used copy+delete");
            Ok(HistoryOutcome::Degraded(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn fallback_moves_the_file_and_flags_degradation() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.rs");
        let dst = tmp.path().join("sub/b.rs");
        fs::write(&src, "pub fn f() {}\n").unwrap();

        let outcome = move_with_history(&src, &dst).unwrap();
        assert!(matches!(outcome, HistoryOutcome::Degraded(_)));
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "pub fn f() {}\n");
    }

    #[test]
    fn tracked_files_move_through_the_git_index() {
        let tmp = TempDir::new().unwrap();
        let repo = git2::Repository::init(tmp.path()).unwrap();
        let src = tmp.path().join("a.rs");
        fs::write(&src, "pub fn f() {}\n").unwrap();
        {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("a.rs")).unwrap();
            index.write().unwrap();
        }

        let dst = tmp.path().join("sub/b.rs");
        let outcome = move_with_history(&src, &dst).unwrap();
        assert_eq!(outcome, HistoryOutcome::Preserved);
        assert!(!src.exists());
        assert!(dst.exists());

        let index = repo.index().unwrap();
        assert!(index.get_path(Path::new("sub/b.rs"), 0).is_some());
        assert!(index.get_path(Path::new("a.rs"), 0).is_none());
    }

    #[test]
    fn untracked_files_degrade_without_failing() {
        let tmp = TempDir::new().unwrap();
        git2::Repository::init(tmp.path()).unwrap();
        let src = tmp.path().join("a.rs");
        fs::write(&src, "pub fn f() {}\n").unwrap();

        let dst = tmp.path().join("b.rs");
        let outcome = move_with_history(&src, &dst).unwrap();
        assert!(matches!(outcome, HistoryOutcome::Degraded(_)));
        assert!(dst.exists());
    }
}
