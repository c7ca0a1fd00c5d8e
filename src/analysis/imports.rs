//! Reverse-import index: which files import a given file.
//!
//! Built once per run over every parsed file in the tree, so dependent
//! lookups during recommendation are map reads instead of re-scans.
//! Resolution is purely structural: module paths derive from file locations,
//! `use` paths resolve against them (`crate::`, `self::`, `super::` aware),
//! and the longest known module prefix wins.

use crate::core::ParsedFile;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use syn::{Item, UseTree};

#[derive(Debug, Default)]
pub struct ReverseImportIndex {
    /// module path -> defining file
    modules: BTreeMap<Vec<String>, PathBuf>,
    /// defining file -> files that import from it
    importers: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    root: PathBuf,
}

impl ReverseImportIndex {
    pub fn build(root: &Path, files: &[&ParsedFile]) -> Self {
        let mut index = ReverseImportIndex {
            root: root.to_path_buf(),
            ..Default::default()
        };

        for file in files {
            if let Some(module) = module_path_of(root, &file.path) {
                index.modules.insert(module, file.path.clone());
            }
        }
        let top_level: BTreeSet<String> = index
            .modules
            .keys()
            .filter_map(|m| m.first().cloned())
            .collect();

        for file in files {
            let Some(importer_module) = module_path_of(root, &file.path) else {
                continue;
            };
            for item in &file.ast.items {
                let Item::Use(use_item) = item else { continue };
                for target in use_target_paths(&use_item.tree) {
                    let Some(resolved) = resolve(&importer_module, &target, &top_level) else {
                        continue;
                    };
                    if let Some(defining) = index.longest_module_match(&resolved) {
                        if *defining != file.path {
                            index
                                .importers
                                .entry(defining.clone())
                                .or_default()
                                .insert(file.path.clone());
                        }
                    }
                }
            }
        }
        index
    }

    /// Files that import the given file, sorted.
    pub fn dependents_of(&self, file: &Path) -> Vec<PathBuf> {
        self.importers
            .get(file)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn longest_module_match(&self, path: &[String]) -> Option<&PathBuf> {
        (1..=path.len())
            .rev()
            .find_map(|len| self.modules.get(&path[..len]))
    }
}

/// Module path of a file relative to the analyzed root: `src/a/b.rs` is
/// `[a, b]`, `src/a/mod.rs` is `[a]`, and `src/lib.rs`/`src/main.rs` are the
/// crate root `[]`.
pub fn module_path_of(root: &Path, file: &Path) -> Option<Vec<String>> {
    let rel = pathdiff::diff_paths(file, root)?;
    let mut parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let last = parts.pop()?;
    let stem = last.strip_suffix(".rs")?;

    if parts.first().map(String::as_str) == Some("src") {
        parts.remove(0);
    }
    match stem {
        "mod" => {}
        "lib" | "main" if parts.is_empty() => {}
        other => parts.push(other.to_string()),
    }
    Some(parts)
}

/// Every module path a use tree may import from: for each leaf both the
/// parent prefix and the leaf itself (the leaf name may be a module).
fn use_target_paths(tree: &UseTree) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    collect_targets(tree, &mut Vec::new(), &mut out);
    out
}

fn collect_targets(tree: &UseTree, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match tree {
        UseTree::Path(p) => {
            prefix.push(p.ident.to_string());
            collect_targets(&p.tree, prefix, out);
            prefix.pop();
        }
        UseTree::Name(n) => {
            if !prefix.is_empty() {
                out.push(prefix.clone());
            }
            let mut with_leaf = prefix.clone();
            with_leaf.push(n.ident.to_string());
            out.push(with_leaf);
        }
        UseTree::Rename(r) => {
            if !prefix.is_empty() {
                out.push(prefix.clone());
            }
            let mut with_leaf = prefix.clone();
            with_leaf.push(r.ident.to_string());
            out.push(with_leaf);
        }
        UseTree::Glob(_) => {
            if !prefix.is_empty() {
                out.push(prefix.clone());
            }
        }
        UseTree::Group(g) => {
            for item in &g.items {
                collect_targets(item, prefix, out);
            }
        }
    }
}

/// Resolve a use path against the importing module. Returns a crate-relative
/// module path, or `None` for external crates.
fn resolve(
    importer: &[String],
    target: &[String],
    top_level: &BTreeSet<String>,
) -> Option<Vec<String>> {
    let first = target.first()?;
    match first.as_str() {
        "crate" => Some(target[1..].to_vec()),
        "self" => {
            let mut path = importer.to_vec();
            path.extend_from_slice(&target[1..]);
            Some(path)
        }
        "super" => {
            let supers = target.iter().take_while(|s| s.as_str() == "super").count();
            if supers > importer.len() {
                return None;
            }
            let mut path = importer[..importer.len() - supers].to_vec();
            path.extend_from_slice(&target[supers..]);
            Some(path)
        }
        name if top_level.contains(name) => Some(target.to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ast::ParsedFile;

    fn file(path: &str, source: &str) -> ParsedFile {
        ParsedFile::from_source(Path::new(path), source.to_string()).unwrap()
    }

    #[test]
    fn module_paths_derive_from_layout() {
        let root = Path::new("/proj");
        assert_eq!(
            module_path_of(root, Path::new("/proj/src/lib.rs")),
            Some(vec![])
        );
        assert_eq!(
            module_path_of(root, Path::new("/proj/src/net.rs")),
            Some(vec!["net".to_string()])
        );
        assert_eq!(
            module_path_of(root, Path::new("/proj/src/net/mod.rs")),
            Some(vec!["net".to_string()])
        );
        assert_eq!(
            module_path_of(root, Path::new("/proj/src/net/tcp.rs")),
            Some(vec!["net".to_string(), "tcp".to_string()])
        );
        assert_eq!(module_path_of(root, Path::new("/proj/src/net/tcp.txt")), None);
    }

    #[test]
    fn crate_rooted_imports_resolve_to_dependents() {
        let big = file("/proj/src/big.rs", "pub fn f() {}\n");
        let user = file("/proj/src/user.rs", "use crate::big::f;\n");
        let other = file("/proj/src/other.rs", "pub fn g() {}\n");

        let files = [&big, &user, &other];
        let index = ReverseImportIndex::build(Path::new("/proj"), &files);

        assert_eq!(
            index.dependents_of(Path::new("/proj/src/big.rs")),
            vec![PathBuf::from("/proj/src/user.rs")]
        );
        assert!(index.dependents_of(Path::new("/proj/src/other.rs")).is_empty());
    }

    #[test]
    fn super_imports_resolve_within_the_tree() {
        let parent = file("/proj/src/net/mod.rs", "pub fn shared() {}\n");
        let child = file("/proj/src/net/tcp.rs", "use super::shared;\n");

        let files = [&parent, &child];
        let index = ReverseImportIndex::build(Path::new("/proj"), &files);

        assert_eq!(
            index.dependents_of(Path::new("/proj/src/net/mod.rs")),
            vec![PathBuf::from("/proj/src/net/tcp.rs")]
        );
    }

    #[test]
    fn external_crates_are_not_indexed() {
        let a = file("/proj/src/a.rs", "use serde::Serialize;\n");
        let b = file("/proj/src/b.rs", "pub fn f() {}\n");

        let files = [&a, &b];
        let index = ReverseImportIndex::build(Path::new("/proj"), &files);
        assert!(index.dependents_of(Path::new("/proj/src/b.rs")).is_empty());
    }

    #[test]
    fn glob_imports_count_as_dependents() {
        let big = file("/proj/src/big.rs", "pub fn f() {}\n");
        let user = file("/proj/src/user.rs", "use crate::big::*;\n");

        let files = [&big, &user];
        let index = ReverseImportIndex::build(Path::new("/proj"), &files);
        assert_eq!(
            index.dependents_of(Path::new("/proj/src/big.rs")),
            vec![PathBuf::from("/proj/src/user.rs")]
        );
    }
}
