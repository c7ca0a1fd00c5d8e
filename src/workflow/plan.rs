//! Operations and plans. A plan is an ordered list of operations whose
//! dependency graph has been proven acyclic; anything else is rejected at
//! construction and nothing executes.

use crate::core::{MemberRef, Recommendation};
use crate::errors::SplitmapError;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Extract one responsibility group into a child module
    Split,
    /// Relocate a whole file
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Dependent of a failed operation in continue-on-error mode
    Skipped,
    RolledBack,
}

/// One unit of work, owned exclusively by the workflow. Status transitions
/// are recorded append-only in the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub kind: OpKind,
    pub source: PathBuf,
    pub targets: Vec<PathBuf>,
    pub depends_on: Vec<String>,
    /// Split operations carry their group identity
    pub group_name: Option<String>,
    pub members: Vec<MemberRef>,
    /// Prefer a history-preserving move when creating the target
    pub prefer_move: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub operations: Vec<Operation>,
}

/// Which recommendations to act on.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Restrict to these target files; empty means all
    pub paths: Vec<PathBuf>,
    /// Keep only the top N recommendations after ranking
    pub top: Option<usize>,
}

impl Selection {
    fn accepts(&self, path: &std::path::Path) -> bool {
        self.paths.is_empty() || self.paths.iter().any(|p| path.ends_with(p) || p == path)
    }
}

/// Build an executable plan from ranked recommendations.
///
/// Operations on the same source file chain sequentially (each rewrites the
/// parent the next one reads), and target-path collisions across files add
/// ordering edges. The result is cycle-checked before it is returned.
pub fn build_plan(
    recommendations: &[Recommendation],
    selection: &Selection,
) -> Result<Plan, SplitmapError> {
    let mut operations = Vec::new();
    let mut op_counter = 0;
    let mut targets_seen: HashMap<PathBuf, String> = HashMap::new();

    let selected = recommendations
        .iter()
        .filter(|rec| selection.accepts(&rec.path))
        .take(selection.top.unwrap_or(usize::MAX));

    for rec in selected {
        let dominant = rec
            .proposals
            .iter()
            .enumerate()
            .max_by_key(|(i, p)| (p.group.estimated_lines, std::cmp::Reverse(*i)))
            .map(|(i, _)| i);
        let mut previous: Option<String> = None;

        for (i, proposal) in rec.proposals.iter().enumerate() {
            op_counter += 1;
            let id = format!("op-{op_counter:03}");
            let mut depends_on = Vec::new();
            if let Some(prev) = previous.take() {
                depends_on.push(prev);
            }
            if let Some(holder) = targets_seen.get(&proposal.new_path) {
                depends_on.push(holder.clone());
            }
            targets_seen.insert(proposal.new_path.clone(), id.clone());

            operations.push(Operation {
                id: id.clone(),
                kind: OpKind::Split,
                source: rec.path.clone(),
                targets: vec![proposal.new_path.clone()],
                depends_on,
                group_name: Some(proposal.group.name.clone()),
                members: proposal.group.members.clone(),
                prefer_move: dominant == Some(i),
            });
            previous = Some(id);
        }
    }

    let plan = Plan { operations };
    plan.validate()?;
    Ok(plan)
}

impl Plan {
    /// Structural validation: known dependency ids, unique operation ids,
    /// and an acyclic dependency graph.
    pub fn validate(&self) -> Result<(), SplitmapError> {
        let mut ids = HashSet::new();
        for op in &self.operations {
            if !ids.insert(op.id.as_str()) {
                return Err(SplitmapError::structural(format!(
                    "duplicate operation id {}",
                    op.id
                )));
            }
        }
        for op in &self.operations {
            for dep in &op.depends_on {
                if !ids.contains(dep.as_str()) {
                    return Err(SplitmapError::structural(format!(
                        "operation {} depends on unknown operation {dep}",
                        op.id
                    )));
                }
            }
        }

        let index_of: HashMap<&str, usize> = self
            .operations
            .iter()
            .enumerate()
            .map(|(i, op)| (op.id.as_str(), i))
            .collect();
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        for (i, _) in self.operations.iter().enumerate() {
            graph.add_node(i);
        }
        for (i, op) in self.operations.iter().enumerate() {
            for dep in &op.depends_on {
                graph.add_edge(index_of[dep.as_str()], i, ());
            }
        }
        toposort(&graph, None).map_err(|cycle| {
            SplitmapError::structural(format!(
                "cyclic dependency through operation {}",
                self.operations[cycle.node_id()].id
            ))
        })?;
        Ok(())
    }

    /// Every path any operation may touch, deduplicated.
    pub fn touched_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let mut seen = HashSet::new();
        for op in &self.operations {
            for path in std::iter::once(&op.source).chain(op.targets.iter()) {
                if seen.insert(path.clone()) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }

    /// Ids of every operation transitively dependent on `failed`.
    pub fn dependents_of(&self, failed: &str) -> HashSet<String> {
        let mut out: HashSet<String> = HashSet::new();
        loop {
            let mut grew = false;
            for op in &self.operations {
                if out.contains(&op.id) {
                    continue;
                }
                if op
                    .depends_on
                    .iter()
                    .any(|d| d == failed || out.contains(d))
                {
                    out.insert(op.id.clone());
                    grew = true;
                }
            }
            if !grew {
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeclKind, GroupProposal, ResponsibilityGroup, RiskLevel};
    use std::collections::BTreeSet;

    fn group(name: &str, lines: usize) -> ResponsibilityGroup {
        ResponsibilityGroup {
            name: name.to_string(),
            members: vec![MemberRef {
                kind: DeclKind::Function,
                name: format!("{name}_fn"),
            }],
            decl_indices: vec![0],
            needed_imports: BTreeSet::new(),
            cohesion: 0.8,
            estimated_lines: lines,
        }
    }

    fn recommendation(path: &str, groups: &[(&str, usize)]) -> Recommendation {
        Recommendation {
            path: PathBuf::from(path),
            risk: RiskLevel::High,
            confidence: 0.9,
            proposals: groups
                .iter()
                .map(|(name, lines)| GroupProposal {
                    group: group(name, *lines),
                    new_path: PathBuf::from(format!("src/big/{name}.rs")),
                })
                .collect(),
            ungrouped: 0,
            dependents: vec![],
        }
    }

    #[test]
    fn same_file_operations_chain_in_order() {
        let rec = recommendation("src/big.rs", &[("alpha", 100), ("beta", 300), ("gamma", 50)]);
        let plan = build_plan(&[rec], &Selection::default()).unwrap();
        assert_eq!(plan.operations.len(), 3);
        assert!(plan.operations[0].depends_on.is_empty());
        assert_eq!(plan.operations[1].depends_on, vec!["op-001"]);
        assert_eq!(plan.operations[2].depends_on, vec!["op-002"]);
        // largest group gets the history-preserving move
        assert!(!plan.operations[0].prefer_move);
        assert!(plan.operations[1].prefer_move);
    }

    #[test]
    fn cyclic_plans_are_rejected() {
        let mut plan = Plan {
            operations: vec![
                Operation {
                    id: "op-001".to_string(),
                    kind: OpKind::Split,
                    source: PathBuf::from("a.rs"),
                    targets: vec![PathBuf::from("a/x.rs")],
                    depends_on: vec!["op-002".to_string()],
                    group_name: None,
                    members: vec![],
                    prefer_move: false,
                },
                Operation {
                    id: "op-002".to_string(),
                    kind: OpKind::Split,
                    source: PathBuf::from("b.rs"),
                    targets: vec![PathBuf::from("b/y.rs")],
                    depends_on: vec!["op-001".to_string()],
                    group_name: None,
                    members: vec![],
                    prefer_move: false,
                },
            ],
        };
        let err = plan.validate().unwrap_err();
        assert!(matches!(err, SplitmapError::Structural { .. }));

        plan.operations[0].depends_on.clear();
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn unknown_dependencies_are_structural_errors() {
        let plan = Plan {
            operations: vec![Operation {
                id: "op-001".to_string(),
                kind: OpKind::Split,
                source: PathBuf::from("a.rs"),
                targets: vec![],
                depends_on: vec!["op-999".to_string()],
                group_name: None,
                members: vec![],
                prefer_move: false,
            }],
        };
        assert!(matches!(
            plan.validate().unwrap_err(),
            SplitmapError::Structural { .. }
        ));
    }

    #[test]
    fn selection_filters_and_caps() {
        let recs = vec![
            recommendation("src/big.rs", &[("alpha", 10)]),
            recommendation("src/other.rs", &[("beta", 10)]),
        ];
        let plan = build_plan(
            &recs,
            &Selection {
                paths: vec![PathBuf::from("src/big.rs")],
                top: None,
            },
        )
        .unwrap();
        assert_eq!(plan.operations.len(), 1);
        assert_eq!(plan.operations[0].source, PathBuf::from("src/big.rs"));

        let capped = build_plan(&recs, &Selection { paths: vec![], top: Some(1) }).unwrap();
        assert_eq!(capped.operations.len(), 1);
    }

    #[test]
    fn touched_paths_cover_sources_and_targets() {
        let rec = recommendation("src/big.rs", &[("alpha", 10), ("beta", 20)]);
        let plan = build_plan(&[rec], &Selection::default()).unwrap();
        let touched = plan.touched_paths();
        assert!(touched.contains(&PathBuf::from("src/big.rs")));
        assert!(touched.contains(&PathBuf::from("src/big/alpha.rs")));
        assert!(touched.contains(&PathBuf::from("src/big/beta.rs")));
        assert_eq!(touched.len(), 3);
    }

    #[test]
    fn transitive_dependents_are_found() {
        let rec = recommendation("src/big.rs", &[("a", 1), ("b", 2), ("c", 3)]);
        let plan = build_plan(&[rec], &Selection::default()).unwrap();
        let dependents = plan.dependents_of("op-001");
        assert_eq!(dependents.len(), 2);
        assert!(dependents.contains("op-002"));
        assert!(dependents.contains("op-003"));
    }
}
