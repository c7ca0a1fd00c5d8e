//! Child-module path derivation for extracted groups.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Reserved words that cannot name a module file.
static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "as", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false",
        "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
        "ref", "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while", "async", "await", "try", "macro",
    ]
    .into_iter()
    .collect()
});

/// Directory that holds child modules of `source`: `src/foo.rs` owns
/// `src/foo/`, while `mod.rs`, `lib.rs` and `main.rs` share their own
/// directory.
pub fn child_dir_for(source: &Path) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    match source.file_stem().and_then(|s| s.to_str()) {
        Some("mod") | Some("lib") | Some("main") | None => parent.to_path_buf(),
        Some(stem) => parent.join(stem),
    }
}

pub fn sanitize_module_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        cleaned.insert(0, '_');
    }
    if cleaned.is_empty() {
        cleaned.push_str("part");
    }
    if KEYWORDS.contains(cleaned.as_str()) {
        cleaned.push_str("_mod");
    }
    cleaned
}

/// Deterministic new-file path for a group, with a numeric suffix on
/// collisions against files already on disk or already proposed this run.
pub fn derive_child_path(
    source: &Path,
    group_name: &str,
    taken: &mut HashSet<PathBuf>,
) -> PathBuf {
    let dir = child_dir_for(source);
    let base = sanitize_module_name(group_name);

    let mut counter = 1;
    loop {
        let file_name = if counter == 1 {
            format!("{base}.rs")
        } else {
            format!("{base}_{counter}.rs")
        };
        let candidate = dir.join(file_name);
        if !taken.contains(&candidate) && !candidate.exists() && candidate != source {
            taken.insert(candidate.clone());
            return candidate;
        }
        counter += 1;
    }
}

/// Module name a target file is declared as in its parent.
pub fn module_name_of(target: &Path) -> String {
    target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "part".to_string())
}
