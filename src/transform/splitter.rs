//! Behavior-preserving extraction of one responsibility group into a child
//! module.
//!
//! Everything is computed in memory first — extracted item text, the child
//! file, the rewritten parent — and parse-checked before a single byte is
//! written. The parent keeps its public surface: extracted names are
//! re-exported under their original exposure, so every path that imported
//! them before the split still resolves.

use crate::core::ast::{declarations, import_bindings, vis_location, ImportBinding, ParsedFile, VisLocation};
use crate::core::{Decl, DeclKind, DeclVisibility, MemberRef};
use crate::errors::SplitmapError;
use crate::transform::moves::{move_with_history, HistoryOutcome};
use crate::transform::paths::module_name_of;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SplitRequest<'a> {
    pub source_path: &'a Path,
    pub group_name: &'a str,
    pub members: &'a [MemberRef],
    pub target_path: &'a Path,
    /// Prefer a history-preserving move for this group's file creation
    pub prefer_move: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOutcome {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    /// `None` when no move was attempted (plain file creation)
    pub history: Option<HistoryOutcome>,
    /// Names of the extracted declarations
    pub extracted: Vec<String>,
    pub reexported: usize,
}

struct Artifacts {
    child_content: String,
    parent_content: String,
    extracted: Vec<String>,
    reexported: usize,
}

/// Extract one group from `source_path` into `target_path`. All-or-nothing:
/// an unresolved reference or a malformed artifact fails the split before
/// any file is written.
pub fn split_file(request: &SplitRequest) -> Result<SplitOutcome, SplitmapError> {
    let parsed = ParsedFile::read(request.source_path)?;
    let artifacts = prepare(&parsed, request)?;
    write_artifacts(request, artifacts)
}

fn prepare(parsed: &ParsedFile, request: &SplitRequest) -> Result<Artifacts, SplitmapError> {
    let decls = declarations(parsed);
    let imports = import_bindings(parsed);

    let selected: Vec<&Decl> = decls
        .iter()
        .filter(|decl| {
            decl.name.as_ref().is_some_and(|name| {
                request
                    .members
                    .iter()
                    .any(|m| m.kind == decl.kind && &m.name == name)
            })
        })
        .collect();
    if selected.is_empty() {
        return Err(SplitmapError::validation(
            request.group_name,
            format!("no group members found in {}", request.source_path.display()),
        ));
    }
    if let Some(fixed) = selected.iter().find(|d| !d.movable) {
        return Err(SplitmapError::validation(
            request.group_name,
            format!(
                "declaration `{}` cannot be relocated",
                fixed.name.as_deref().unwrap_or("?")
            ),
        ));
    }

    let referenced: BTreeSet<&str> = selected
        .iter()
        .flat_map(|d| d.referenced.iter().map(String::as_str))
        .collect();
    let group_names: BTreeSet<&str> = selected
        .iter()
        .filter_map(|d| d.name.as_deref())
        .collect();
    let selected_indices: BTreeSet<usize> = selected.iter().map(|d| d.index).collect();
    let remaining_names: BTreeSet<&str> = decls
        .iter()
        .filter(|d| !selected_indices.contains(&d.index))
        .filter_map(|d| d.name.as_deref())
        .collect();
    let import_names: BTreeSet<&str> = imports
        .iter()
        .flat_map(|b| b.names.iter().map(String::as_str))
        .collect();
    let has_glob = imports.iter().any(|b| b.has_glob);

    // Resolution gate: every free identifier must land somewhere.
    for ident in &referenced {
        let resolvable = group_names.contains(ident)
            || remaining_names.contains(ident)
            || import_names.contains(ident)
            || has_glob;
        if !resolvable {
            return Err(SplitmapError::ImportResolution {
                path: request.source_path.to_path_buf(),
                group: request.group_name.to_string(),
                identifier: ident.to_string(),
            });
        }
    }

    let child_content = render_child(parsed, request, &selected, &imports, &referenced, &remaining_names)?;
    syn::parse_file(&child_content).map_err(|e| {
        SplitmapError::validation(
            request.group_name,
            format!("generated child module does not parse: {e}"),
        )
    })?;

    let (parent_content, reexported) = render_parent(parsed, request, &decls, &selected, &imports)?;
    syn::parse_file(&parent_content).map_err(|e| {
        SplitmapError::validation(
            request.group_name,
            format!("rewritten parent does not parse: {e}"),
        )
    })?;

    let mut extracted: Vec<String> = Vec::new();
    for decl in &selected {
        if let Some(name) = &decl.name {
            if !extracted.contains(name) {
                extracted.push(name.clone());
            }
        }
    }

    Ok(Artifacts {
        child_content,
        parent_content,
        extracted,
        reexported,
    })
}

fn render_child(
    parsed: &ParsedFile,
    request: &SplitRequest,
    selected: &[&Decl],
    imports: &[ImportBinding],
    referenced: &BTreeSet<&str>,
    remaining_names: &BTreeSet<&str>,
) -> Result<String, SplitmapError> {
    let mut sections: Vec<String> = Vec::new();

    // Minimal import set: every `use` that binds a referenced name, plus
    // globs (over-approximation is the tolerated direction).
    let mut import_lines: Vec<String> = Vec::new();
    for binding in imports {
        let needed = binding.has_glob
            || binding.names.iter().any(|n| referenced.contains(n.as_str()));
        if needed {
            let text = parsed.slice_lines(binding.line_start, binding.line_end);
            import_lines.push(reroot_import(&text, &binding.root));
        }
    }
    let super_refs: Vec<&str> = referenced
        .iter()
        .filter(|ident| {
            remaining_names.contains(*ident) && !request.members.iter().any(|m| m.name == **ident)
        })
        .copied()
        .collect();
    if !super_refs.is_empty() {
        import_lines.push(format!("use super::{{{}}};", super_refs.join(", ")));
    }
    if !import_lines.is_empty() {
        sections.push(import_lines.join("\n"));
    }

    for decl in selected {
        let text = parsed.slice_lines(decl.line_start, decl.line_end);
        let text = normalize_visibility(parsed, decl, text, request)?;
        sections.push(text);
    }

    Ok(format!("{}\n", sections.join("\n\n")))
}

/// Keep `pub` as-is; widen everything else to `pub(crate)` so the parent's
/// re-export can restore the original exposure.
fn normalize_visibility(
    parsed: &ParsedFile,
    decl: &Decl,
    text: String,
    request: &SplitRequest,
) -> Result<String, SplitmapError> {
    if decl.kind == DeclKind::Impl || decl.visibility == DeclVisibility::Public {
        return Ok(text);
    }
    let Some(location) = vis_location(&parsed.ast.items[decl.index]) else {
        return Ok(text);
    };

    let mut lines: Vec<String> = text.lines().map(String::from).collect();
    match location {
        VisLocation::Explicit { start, end } => {
            if start.line != end.line {
                return Err(SplitmapError::validation(
                    request.group_name,
                    "multi-line visibility qualifier is not supported",
                ));
            }
            let row = start.line - decl.line_start;
            let line = &lines[row];
            let chars: Vec<char> = line.chars().collect();
            let mut rebuilt: String = chars[..start.column].iter().collect();
            rebuilt.push_str("pub(crate)");
            rebuilt.extend(&chars[end.column.min(chars.len())..]);
            lines[row] = rebuilt;
        }
        VisLocation::Missing { insert } => {
            let row = insert.line - decl.line_start;
            let line = &lines[row];
            let chars: Vec<char> = line.chars().collect();
            let mut rebuilt: String = chars[..insert.column].iter().collect();
            rebuilt.push_str("pub(crate) ");
            rebuilt.extend(&chars[insert.column..]);
            lines[row] = rebuilt;
        }
    }
    Ok(lines.join("\n"))
}

/// One level deeper: module-relative import roots gain a `super`.
fn reroot_import(text: &str, root: &str) -> String {
    match root {
        "self" => text.replacen("self::", "super::", 1),
        "super" => text.replacen("super::", "super::super::", 1),
        _ => text.to_string(),
    }
}

fn render_parent(
    parsed: &ParsedFile,
    request: &SplitRequest,
    decls: &[Decl],
    selected: &[&Decl],
    imports: &[ImportBinding],
) -> Result<(String, usize), SplitmapError> {
    let total_lines = parsed.source.lines().count();
    let mut removed = vec![false; total_lines + 1];
    for decl in selected {
        for line in decl.line_start..=decl.line_end.min(total_lines) {
            removed[line] = true;
        }
    }

    let module_name = module_name_of(request.target_path);
    let mut block = vec![format!("mod {module_name};")];
    let selected_index_set: BTreeSet<usize> = selected.iter().map(|d| d.index).collect();
    // Names the surviving parent code still references; private extractions
    // are only re-imported when something actually uses them.
    let remaining_referenced: BTreeSet<&str> = decls
        .iter()
        .filter(|d| !selected_index_set.contains(&d.index))
        .flat_map(|d| d.referenced.iter().map(String::as_str))
        .collect();
    let mut public = BTreeSet::new();
    let mut crate_visible = BTreeSet::new();
    let mut private = BTreeSet::new();
    for decl in selected {
        if decl.kind == DeclKind::Impl {
            continue;
        }
        let Some(name) = decl.name.as_deref() else { continue };
        match decl.visibility {
            DeclVisibility::Public => public.insert(name),
            DeclVisibility::Restricted => crate_visible.insert(name),
            DeclVisibility::Private => {
                if remaining_referenced.contains(name) {
                    private.insert(name)
                } else {
                    false
                }
            }
        };
    }
    let reexported = public.len() + crate_visible.len() + private.len();
    if !public.is_empty() {
        block.push(format!(
            "pub use self::{module_name}::{{{}}};",
            join_names(&public)
        ));
    }
    if !crate_visible.is_empty() {
        block.push(format!(
            "pub(crate) use self::{module_name}::{{{}}};",
            join_names(&crate_visible)
        ));
    }
    if !private.is_empty() {
        block.push(format!(
            "use self::{module_name}::{{{}}};",
            join_names(&private)
        ));
    }

    // Insert the module block after the surviving imports, or after the
    // file-level header when no import survives.
    let last_import_line = imports
        .iter()
        .filter(|b| !selected_index_set.contains(&b.index))
        .map(|b| b.line_end)
        .max()
        .unwrap_or(0);
    let insertion_line = last_import_line.max(header_end(&parsed.source));

    let mut out: Vec<&str> = Vec::new();
    let mut inserted = false;
    let block_text = block.join("\n");
    if insertion_line == 0 {
        out.push(&block_text);
        inserted = true;
    }
    for (i, line) in parsed.source.lines().enumerate() {
        let line_no = i + 1;
        if !removed[line_no] {
            out.push(line);
        }
        if line_no == insertion_line && !inserted {
            out.push(&block_text);
            inserted = true;
        }
    }
    if !inserted {
        out.push(&block_text);
    }

    let mut text = out.join("\n");
    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok((text, reexported))
}

fn join_names(names: &BTreeSet<&str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(", ")
}

/// Last line of the file-level header: inner doc comments, inner attributes,
/// and the blanks between them.
fn header_end(source: &str) -> usize {
    let mut end = 0;
    for (i, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//!") || trimmed.starts_with("#![") {
            end = i + 1;
        } else {
            break;
        }
    }
    end
}

fn write_artifacts(
    request: &SplitRequest,
    artifacts: Artifacts,
) -> Result<SplitOutcome, SplitmapError> {
    let history = if request.prefer_move {
        Some(move_with_history(request.source_path, request.target_path)?)
    } else {
        None
    };
    crate::io::write_retry(request.target_path, artifacts.child_content.as_bytes())?;
    crate::io::write_retry(request.source_path, artifacts.parent_content.as_bytes())?;

    Ok(SplitOutcome {
        source_path: request.source_path.to_path_buf(),
        target_path: request.target_path.to_path_buf(),
        history,
        extracted: artifacts.extracted,
        reexported: artifacts.reexported,
    })
}
