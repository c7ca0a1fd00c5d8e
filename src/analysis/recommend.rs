//! Recommendation engine: turns detector findings into ranked,
//! confidence-scored, dependency-aware decomposition recommendations.

use crate::analysis::detector::Detection;
use crate::analysis::imports::ReverseImportIndex;
use crate::analysis::responsibility::group_declarations;
use crate::config::Policy;
use crate::core::ast::{declarations, import_bindings};
use crate::core::{GroupProposal, Recommendation};
use crate::transform::paths::derive_child_path;
use std::collections::HashSet;
use std::path::PathBuf;

/// Produce one recommendation per oversized, parse-clean file, suppressing
/// anything below the policy confidence floor. Deterministically ranked by
/// (risk, confidence, path).
pub fn recommend(
    detection: &Detection,
    index: &ReverseImportIndex,
    policy: &Policy,
) -> Vec<Recommendation> {
    // In-run registry so two files never propose the same new path.
    let mut taken: HashSet<PathBuf> = HashSet::new();
    let mut recommendations = Vec::new();

    for record in detection.oversized(policy) {
        let Some(parsed) = record.parsed.as_ref() else {
            continue;
        };
        let decls = declarations(parsed);
        let imports = import_bindings(parsed);
        let (groups, ungrouped) = group_declarations(&decls, &imports, &policy.grouping);
        if groups.is_empty() {
            log::debug!(
                "no safely groupable declarations in {}, suppressing",
                parsed.path.display()
            );
            continue;
        }

        let groupable_total = decls.iter().filter(|d| d.is_groupable()).count();
        let grouped: usize = groups.iter().map(|g| g.decl_indices.len()).sum();
        let grouped_fraction = if groupable_total == 0 {
            0.0
        } else {
            grouped as f64 / groupable_total as f64
        };
        let mean_cohesion =
            groups.iter().map(|g| g.cohesion).sum::<f64>() / groups.len() as f64;
        let dependents = index.dependents_of(&parsed.path);

        let confidence = score_confidence(mean_cohesion, grouped_fraction, dependents.len());
        if confidence < policy.grouping.min_confidence {
            log::debug!(
                "confidence {confidence:.2} below floor for {}, suppressing",
                parsed.path.display()
            );
            continue;
        }

        let proposals: Vec<GroupProposal> = groups
            .into_iter()
            .map(|group| {
                let new_path = derive_child_path(&parsed.path, &group.name, &mut taken);
                GroupProposal { group, new_path }
            })
            .collect();

        recommendations.push(Recommendation {
            path: parsed.path.clone(),
            risk: record.metrics.risk,
            confidence,
            proposals,
            ungrouped: ungrouped.len(),
            dependents,
        });
    }

    recommendations.sort_by(|a, b| {
        b.risk
            .cmp(&a.risk)
            .then(b.confidence.total_cmp(&a.confidence))
            .then(a.path.cmp(&b.path))
    });
    recommendations
}

/// Grouping quality, coverage, and blast radius combined into [0, 1].
/// More importers means more call sites to trust the re-export shim, so
/// confidence shrinks with the dependent count.
fn score_confidence(mean_cohesion: f64, grouped_fraction: f64, dependents: usize) -> f64 {
    let inverse_dependents = 1.0 / (1.0 + dependents as f64);
    (0.5 * mean_cohesion + 0.3 * grouped_fraction + 0.2 * inverse_dependents).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::detector::scan_tree;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn oversized_source() -> String {
        // Two unrelated clusters, padded past the default 1000-line threshold.
        let mut src = String::from("use std::collections::HashMap;\nuse std::net::TcpStream;\n\n");
        src.push_str("pub struct Parser { table: HashMap<String, u32> }\n\n");
        src.push_str("impl Parser {\n    pub fn parse_bulk(&self) -> usize {\n");
        for i in 0..520 {
            src.push_str(&format!("        let _x{i} = {i};\n"));
        }
        src.push_str("        self.table.len()\n    }\n}\n\n");
        src.push_str("pub struct Connection { stream: Option<TcpStream> }\n\n");
        src.push_str("impl Connection {\n    pub fn connect_bulk(&self) -> usize {\n");
        for i in 0..520 {
            src.push_str(&format!("        let _y{i} = {i};\n"));
        }
        src.push_str("        0\n    }\n}\n");
        src
    }

    fn detect_in(tmp: &TempDir) -> (Detection, Vec<Recommendation>) {
        let policy = Policy::default();
        let detection = scan_tree(tmp.path(), &policy, false).unwrap();
        let parsed: Vec<_> = detection
            .records
            .iter()
            .filter_map(|r| r.parsed.as_ref())
            .collect();
        let index = ReverseImportIndex::build(tmp.path(), &parsed);
        let recs = recommend(&detection, &index, &policy);
        (detection, recs)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn small_files_get_no_recommendation() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/small.rs", "pub fn tiny() {}\n");
        let (_, recs) = detect_in(&tmp);
        assert!(recs.is_empty());
    }

    #[test]
    fn oversized_files_get_one_ranked_recommendation() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/lib.rs", "pub mod big;\n");
        write(tmp.path(), "src/big.rs", &oversized_source());

        let (_, recs) = detect_in(&tmp);
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert!(rec.path.ends_with("src/big.rs"));
        assert_eq!(rec.proposals.len(), 2);
        assert!((0.0..=1.0).contains(&rec.confidence));
        // proposed paths live in the child-module directory
        for proposal in &rec.proposals {
            assert!(proposal.new_path.starts_with(tmp.path().join("src/big")));
        }
    }

    #[test]
    fn dependents_lower_confidence() {
        let tmp_isolated = TempDir::new().unwrap();
        write(tmp_isolated.path(), "src/lib.rs", "pub mod big;\n");
        write(tmp_isolated.path(), "src/big.rs", &oversized_source());
        let (_, isolated) = detect_in(&tmp_isolated);

        let tmp_imported = TempDir::new().unwrap();
        write(tmp_imported.path(), "src/lib.rs", "pub mod big;\npub mod a;\npub mod b;\n");
        write(tmp_imported.path(), "src/big.rs", &oversized_source());
        write(tmp_imported.path(), "src/a.rs", "use crate::big::Parser;\n");
        write(tmp_imported.path(), "src/b.rs", "use crate::big::Connection;\n");
        let (_, imported) = detect_in(&tmp_imported);

        assert_eq!(imported[0].dependents.len(), 2);
        assert!(imported[0].confidence < isolated[0].confidence);
    }

    #[test]
    fn in_run_path_collisions_get_numeric_suffixes() {
        let tmp = TempDir::new().unwrap();
        // lib.rs and main.rs both place children directly under src/, so
        // identical dominant names collide and need suffixes.
        write(tmp.path(), "src/lib.rs", &oversized_source());
        write(tmp.path(), "src/main.rs", &oversized_source());

        let (_, recs) = detect_in(&tmp);
        assert_eq!(recs.len(), 2);
        let all_paths: Vec<_> = recs
            .iter()
            .flat_map(|r| r.proposals.iter().map(|p| p.new_path.clone()))
            .collect();
        assert_eq!(all_paths.len(), 4);
        let mut deduped = all_paths.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(all_paths.len(), deduped.len());
        assert!(all_paths
            .iter()
            .any(|p| p.file_name().unwrap().to_string_lossy().contains("_2")));
    }
}
