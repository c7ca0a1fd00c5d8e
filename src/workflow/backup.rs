//! Backups: the sole unit of recovery.
//!
//! One backup directory per run holds a manifest (path, content hash, or an
//! absent marker for paths the plan will create), a raw snapshot of every
//! pre-existing touched path, and the append-only transition log. Restore
//! replays the manifest: present entries come back byte-for-byte, absent
//! entries are deleted.

use crate::errors::SplitmapError;
use crate::workflow::plan::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SNAPSHOT_DIR: &str = "snapshot";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntryState {
    /// File existed before the run; hash of its snapshot
    Present { sha256: String },
    /// Path did not exist; restore deletes whatever appeared there
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Relative to the analyzed root
    pub path: PathBuf,
    pub state: EntryState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub root: PathBuf,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug)]
pub struct BackupHandle {
    pub id: String,
    pub dir: PathBuf,
    pub manifest: Manifest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackReport {
    pub backup_id: String,
    pub restored: usize,
    pub deleted: usize,
}

pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Snapshot every path the plan may touch. The backup directory is
/// `<backup_root>/<id>/`; a collision on the timestamp id gets a numeric
/// suffix rather than overwriting an older backup.
pub fn create(root: &Path, backup_root: &Path, plan: &Plan) -> Result<BackupHandle, SplitmapError> {
    let id = allocate_id(backup_root)?;
    let dir = backup_root.join(&id);
    let snapshot_dir = dir.join(SNAPSHOT_DIR);
    crate::io::retry_transient(&snapshot_dir, || std::fs::create_dir_all(&snapshot_dir))?;

    let mut entries = Vec::new();
    for path in plan.touched_paths() {
        let rel = pathdiff::diff_paths(&path, root).ok_or_else(|| SplitmapError::Backup {
            message: format!("{} is outside the analyzed root", path.display()),
        })?;
        let state = if path.exists() {
            let content = crate::io::read_retry(&path)?;
            let copy_to = snapshot_dir.join(&rel);
            crate::io::write_retry(&copy_to, &content)?;
            EntryState::Present {
                sha256: sha256_hex(&content),
            }
        } else {
            EntryState::Absent
        };
        entries.push(ManifestEntry { path: rel, state });
    }

    let manifest = Manifest {
        id: id.clone(),
        created_at: Utc::now(),
        root: root.to_path_buf(),
        entries,
    };
    let manifest_path = dir.join(MANIFEST_FILE);
    let rendered = serde_json::to_vec_pretty(&manifest).map_err(|e| SplitmapError::Backup {
        message: format!("manifest serialization: {e}"),
    })?;
    crate::io::write_retry(&manifest_path, &rendered)?;

    Ok(BackupHandle { id, dir, manifest })
}

fn allocate_id(backup_root: &Path) -> Result<String, SplitmapError> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S").to_string();
    let mut counter = 1;
    loop {
        let candidate = if counter == 1 {
            stamp.clone()
        } else {
            format!("{stamp}-{counter}")
        };
        if !backup_root.join(&candidate).exists() {
            return Ok(candidate);
        }
        counter += 1;
    }
}

pub fn load_manifest(backup_root: &Path, id: &str) -> Result<Manifest, SplitmapError> {
    let path = backup_root.join(id).join(MANIFEST_FILE);
    let raw = crate::io::read_retry(&path)?;
    serde_json::from_slice(&raw).map_err(|e| SplitmapError::Backup {
        message: format!("manifest at {} is unreadable: {e}", path.display()),
    })
}

/// Restore every manifest path byte-for-byte, verifying content hashes, and
/// delete paths that did not exist before the run.
pub fn restore(root: &Path, backup_root: &Path, id: &str) -> Result<RollbackReport, SplitmapError> {
    let manifest = load_manifest(backup_root, id)?;
    let snapshot_dir = backup_root.join(id).join(SNAPSHOT_DIR);

    let mut restored = 0;
    let mut deleted = 0;
    for entry in &manifest.entries {
        let live = root.join(&entry.path);
        match &entry.state {
            EntryState::Present { sha256 } => {
                let content = crate::io::read_retry(&snapshot_dir.join(&entry.path))?;
                if sha256_hex(&content) != *sha256 {
                    return Err(SplitmapError::Backup {
                        message: format!(
                            "snapshot of {} no longer matches its manifest hash",
                            entry.path.display()
                        ),
                    });
                }
                crate::io::write_retry(&live, &content)?;
                restored += 1;
            }
            EntryState::Absent => {
                if live.exists() {
                    crate::io::retry_transient(&live, || std::fs::remove_file(&live))?;
                    deleted += 1;
                }
            }
        }
    }

    log::info!("rollback {id}: restored {restored}, deleted {deleted}");
    Ok(RollbackReport {
        backup_id: id.to_string(),
        restored,
        deleted,
    })
}

/// Most recent backup id under `backup_root`, by directory name order
/// (timestamp ids sort chronologically).
pub fn latest_id(backup_root: &Path) -> Option<String> {
    let mut ids: Vec<String> = walkdir::WalkDir::new(backup_root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .collect();
    ids.sort();
    ids.pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DeclKind;
    use crate::core::MemberRef;
    use crate::workflow::plan::{OpKind, Operation};
    use std::fs;
    use tempfile::TempDir;

    fn plan_touching(root: &Path, source: &str, target: &str) -> Plan {
        Plan {
            operations: vec![Operation {
                id: "op-001".to_string(),
                kind: OpKind::Split,
                source: root.join(source),
                targets: vec![root.join(target)],
                depends_on: vec![],
                group_name: Some("g".to_string()),
                members: vec![MemberRef {
                    kind: DeclKind::Function,
                    name: "f".to_string(),
                }],
                prefer_move: false,
            }],
        }
    }

    #[test]
    fn backup_then_restore_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let source = root.join("src/big.rs");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        let original = "pub fn f() -> u32 { 1 }\n";
        fs::write(&source, original).unwrap();

        let backup_root = root.join(".splitmap/backups");
        let plan = plan_touching(root, "src/big.rs", "src/big/part.rs");
        let handle = create(root, &backup_root, &plan).unwrap();

        // mutate the tree the way an execution would
        fs::write(&source, "pub fn f() -> u32 { 2 }\n").unwrap();
        let created = root.join("src/big/part.rs");
        fs::create_dir_all(created.parent().unwrap()).unwrap();
        fs::write(&created, "pub fn g() {}\n").unwrap();

        let report = restore(root, &backup_root, &handle.id).unwrap();
        assert_eq!(report.restored, 1);
        assert_eq!(report.deleted, 1);
        assert_eq!(fs::read_to_string(&source).unwrap(), original);
        assert!(!created.exists());
    }

    #[test]
    fn manifest_records_absent_targets() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/big.rs"), "pub fn f() {}\n").unwrap();

        let plan = plan_touching(root, "src/big.rs", "src/big/part.rs");
        let handle = create(root, &root.join("b"), &plan).unwrap();

        assert_eq!(handle.manifest.entries.len(), 2);
        let absent = handle
            .manifest
            .entries
            .iter()
            .find(|e| e.path.ends_with("part.rs"))
            .unwrap();
        assert!(matches!(absent.state, EntryState::Absent));
    }

    #[test]
    fn tampered_snapshots_refuse_to_restore() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/big.rs"), "pub fn f() {}\n").unwrap();

        let backup_root = root.join("b");
        let plan = plan_touching(root, "src/big.rs", "src/big/part.rs");
        let handle = create(root, &backup_root, &plan).unwrap();

        let snapshot = backup_root
            .join(&handle.id)
            .join(SNAPSHOT_DIR)
            .join("src/big.rs");
        fs::write(&snapshot, "tampered\n").unwrap();

        assert!(matches!(
            restore(root, &backup_root, &handle.id),
            Err(SplitmapError::Backup { .. })
        ));
    }

    #[test]
    fn latest_id_orders_by_name() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("20260101T000000")).unwrap();
        fs::create_dir_all(tmp.path().join("20260201T000000")).unwrap();
        assert_eq!(
            latest_id(tmp.path()),
            Some("20260201T000000".to_string())
        );
    }
}
