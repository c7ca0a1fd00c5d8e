use crate::config::WalkPolicy;
use anyhow::Result;
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Gitignore-aware walk over a root path, restricted to Rust sources under
/// the policy's include/exclude globs.
pub struct FileWalker {
    root: PathBuf,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl FileWalker {
    pub fn new(root: PathBuf, policy: &WalkPolicy) -> Self {
        Self {
            root,
            include: compile_patterns(&policy.include),
            exclude: compile_patterns(&policy.exclude),
        }
    }

    /// Sorted, deduplicated list of candidate files.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && self.should_process(path) {
                files.insert(path.to_path_buf());
            }
        }

        Ok(files.into_iter().collect())
    }

    fn should_process(&self, path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            return false;
        }

        let candidate = pathdiff::diff_paths(path, &self.root).unwrap_or_else(|| path.to_path_buf());
        let candidate = candidate.to_string_lossy();

        if self.exclude.iter().any(|p| p.matches(&candidate)) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        self.include.iter().any(|p| p.matches(&candidate))
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match glob::Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                log::warn!("ignoring malformed glob pattern {raw:?}: {err}");
                None
            }
        })
        .collect()
}
