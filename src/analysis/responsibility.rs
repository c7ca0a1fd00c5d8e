//! Responsibility grouping: clusters a file's top-level declarations by
//! inferred purpose.
//!
//! Three clustering rules feed one union-find:
//!   (a) an impl block always joins the type it implements,
//!   (b) declarations with matching name stems join,
//!   (c) declarations whose needed-import sets are similar (Jaccard) join.
//! The result is deterministic for identical input; ties break on
//! declaration order.

use crate::config::GroupingPolicy;
use crate::core::{Decl, DeclKind, ImportBinding, MemberRef, ResponsibilityGroup};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};

/// Group the groupable declarations of one file. Returns the qualified groups
/// in declaration order plus the indices of declarations left ungrouped.
pub fn group_declarations(
    decls: &[Decl],
    imports: &[ImportBinding],
    policy: &GroupingPolicy,
) -> (Vec<ResponsibilityGroup>, Vec<usize>) {
    let groupable: Vec<&Decl> = decls.iter().filter(|d| d.is_groupable()).collect();
    if groupable.is_empty() {
        return (Vec::new(), Vec::new());
    }

    // Needed-import name set per groupable declaration.
    let needed: Vec<BTreeSet<String>> = groupable
        .iter()
        .map(|decl| {
            imports
                .iter()
                .flat_map(|binding| binding.names.iter())
                .filter(|name| decl.referenced.contains(*name))
                .cloned()
                .collect()
        })
        .collect();

    let mut uf: UnionFind<usize> = UnionFind::new(groupable.len());

    // (a) impls join their self type
    let mut type_position: BTreeMap<&str, usize> = BTreeMap::new();
    for (pos, decl) in groupable.iter().enumerate() {
        if decl.kind == DeclKind::Type {
            if let Some(name) = decl.name.as_deref() {
                type_position.entry(name).or_insert(pos);
            }
        }
    }
    for (pos, decl) in groupable.iter().enumerate() {
        if decl.kind == DeclKind::Impl {
            if let Some(name) = decl.name.as_deref() {
                if let Some(&type_pos) = type_position.get(name) {
                    uf.union(pos, type_pos);
                }
            }
        }
    }

    // (b) name-stem proximity
    let stems: Vec<Option<String>> = groupable
        .iter()
        .map(|decl| decl.name.as_deref().map(name_stem))
        .collect();
    for i in 0..groupable.len() {
        for j in (i + 1)..groupable.len() {
            if let (Some(a), Some(b)) = (&stems[i], &stems[j]) {
                if stems_match(a, b, policy.min_stem_len) {
                    uf.union(i, j);
                }
            }
        }
    }

    // (c) shared-import affinity
    for i in 0..groupable.len() {
        for j in (i + 1)..groupable.len() {
            if jaccard(&needed[i], &needed[j]) >= policy.similarity_threshold {
                uf.union(i, j);
            }
        }
    }

    // Clusters keyed by representative, ordered by first member.
    let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for pos in 0..groupable.len() {
        let root = uf.find(pos);
        clusters.entry(root).or_default().push(pos);
    }
    let mut ordered: Vec<Vec<usize>> = clusters.into_values().collect();
    ordered.sort_by_key(|members| members[0]);

    let mut groups = Vec::new();
    let mut ungrouped = Vec::new();
    for members in ordered {
        let has_type = members
            .iter()
            .any(|&pos| groupable[pos].kind == DeclKind::Type);
        if members.len() < policy.min_group_size && !has_type {
            ungrouped.extend(members.iter().map(|&pos| groupable[pos].index));
            continue;
        }
        groups.push(build_group(&members, &groupable, &needed, policy));
    }

    (groups, ungrouped)
}

fn build_group(
    members: &[usize],
    groupable: &[&Decl],
    needed: &[BTreeSet<String>],
    policy: &GroupingPolicy,
) -> ResponsibilityGroup {
    let dominant = *members
        .iter()
        .max_by_key(|&&pos| (groupable[pos].line_span(), std::cmp::Reverse(pos)))
        .expect("groups are never empty");
    let dominant_name = groupable[dominant]
        .name
        .as_deref()
        .expect("groupable declarations are named");

    let mut member_refs: Vec<MemberRef> = Vec::new();
    let mut needed_imports = BTreeSet::new();
    let mut estimated_lines = 0;
    for &pos in members {
        let decl = groupable[pos];
        let member = MemberRef {
            kind: decl.kind,
            name: decl.name.clone().expect("groupable declarations are named"),
        };
        if !member_refs.contains(&member) {
            member_refs.push(member);
        }
        needed_imports.extend(needed[pos].iter().cloned());
        estimated_lines += decl.line_span();
    }

    ResponsibilityGroup {
        name: to_snake_case(dominant_name),
        members: member_refs,
        decl_indices: members.iter().map(|&pos| groupable[pos].index).collect(),
        needed_imports,
        cohesion: cohesion_score(members, groupable, needed, dominant, policy),
        estimated_lines,
    }
}

/// Cohesion in [0, 1]: import-set similarity, naming affinity with the
/// dominant member, and a structural bonus for type-plus-impl clusters.
fn cohesion_score(
    members: &[usize],
    groupable: &[&Decl],
    needed: &[BTreeSet<String>],
    dominant: usize,
    policy: &GroupingPolicy,
) -> f64 {
    let import_cohesion = {
        let mut sum = 0.0;
        let mut pairs = 0;
        for (a, &i) in members.iter().enumerate() {
            for &j in &members[a + 1..] {
                if !needed[i].is_empty() || !needed[j].is_empty() {
                    sum += jaccard(&needed[i], &needed[j]);
                    pairs += 1;
                }
            }
        }
        if pairs == 0 {
            0.4
        } else {
            sum / pairs as f64
        }
    };

    let dominant_stem = groupable[dominant].name.as_deref().map(name_stem);
    let naming = match &dominant_stem {
        Some(stem) => {
            let matching = members
                .iter()
                .filter(|&&pos| {
                    groupable[pos]
                        .name
                        .as_deref()
                        .map(name_stem)
                        .is_some_and(|other| stems_match(stem, &other, policy.min_stem_len))
                })
                .count();
            matching as f64 / members.len() as f64
        }
        None => 0.0,
    };

    let has_type = members
        .iter()
        .any(|&pos| groupable[pos].kind == DeclKind::Type);
    let has_impl = members
        .iter()
        .any(|&pos| groupable[pos].kind == DeclKind::Impl);
    let structural = if has_type && has_impl { 0.2 } else { 0.0 };

    (0.5 * import_cohesion + 0.3 * naming + structural).clamp(0.0, 1.0)
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Leading snake_case segment, or the leading CamelCase word, lowercased.
pub fn name_stem(name: &str) -> String {
    if let Some(first) = name.split('_').next() {
        if first.len() < name.len() {
            return first.to_lowercase();
        }
    }
    let mut stem = String::new();
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            break;
        }
        stem.push(c);
    }
    stem.to_lowercase()
}

fn stems_match(a: &str, b: &str, min_len: usize) -> bool {
    let shorter = a.len().min(b.len());
    shorter >= min_len && (a.starts_with(b) || b.starts_with(a))
}

pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}
