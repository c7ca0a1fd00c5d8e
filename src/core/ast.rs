//! Parsing helpers: span-located top-level declarations, referenced-identifier
//! collection, and import bindings.
//!
//! Everything here is pure syntax. Spans come from `proc-macro2` with
//! span-locations enabled, so declaration text can be sliced back out of the
//! original source byte-for-byte.

use crate::core::types::{Decl, DeclKind, DeclVisibility};
use crate::errors::SplitmapError;
use once_cell::sync::Lazy;
use proc_macro2::{LineColumn, TokenStream, TokenTree};
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use syn::spanned::Spanned;
use syn::visit::Visit;
use syn::{Item, UseTree};

/// Names that resolve without any import: primitives, prelude items, common
/// macros, and path keywords. Referenced identifiers in this set never count
/// as free.
static AMBIENT_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // primitives
        "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32",
        "i64", "i128", "isize", "f32", "f64",
        // prelude types and traits
        "Option", "Some", "None", "Result", "Ok", "Err", "Box", "Vec", "String", "ToString",
        "Clone", "Copy", "Debug", "Default", "Drop", "Eq", "PartialEq", "Ord", "PartialOrd",
        "Hash", "Iterator", "IntoIterator", "DoubleEndedIterator", "ExactSizeIterator", "Extend",
        "From", "Into", "TryFrom", "TryInto", "AsRef", "AsMut", "Send", "Sync", "Sized", "Unpin",
        "Fn", "FnMut", "FnOnce", "ToOwned",
        // root crates, always addressable
        "std", "core", "alloc",
        // common macros
        "println", "eprintln", "print", "eprint", "format", "write", "writeln", "vec", "panic",
        "assert", "assert_eq", "assert_ne", "debug_assert", "matches", "todo", "unimplemented",
        "unreachable", "dbg", "include_str", "include_bytes", "env", "concat", "stringify",
        "line", "file", "column", "cfg", "derive",
    ]
    .into_iter()
    .collect()
});

/// A source file parsed once, with its text retained for span slicing.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub ast: syn::File,
}

impl ParsedFile {
    pub fn from_source(path: &Path, source: String) -> Result<Self, SplitmapError> {
        let ast = syn::parse_file(&source)
            .map_err(|e| SplitmapError::parse(path, e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            source,
            ast,
        })
    }

    pub fn read(path: &Path) -> Result<Self, SplitmapError> {
        let source = crate::io::read_to_string_retry(path)?;
        Self::from_source(path, source)
    }

    pub fn lines(&self) -> Vec<&str> {
        self.source.lines().collect()
    }

    /// Source text of an inclusive 1-based line range.
    pub fn slice_lines(&self, start: usize, end: usize) -> String {
        self.source
            .lines()
            .skip(start.saturating_sub(1))
            .take(end.saturating_sub(start) + 1)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Kind and name identity of an item, if it has one.
pub fn item_identity(item: &Item) -> (DeclKind, Option<String>) {
    match item {
        Item::Struct(s) => (DeclKind::Type, Some(s.ident.to_string())),
        Item::Enum(e) => (DeclKind::Type, Some(e.ident.to_string())),
        Item::Union(u) => (DeclKind::Type, Some(u.ident.to_string())),
        Item::Trait(t) => (DeclKind::Type, Some(t.ident.to_string())),
        Item::TraitAlias(t) => (DeclKind::Type, Some(t.ident.to_string())),
        Item::Fn(f) => (DeclKind::Function, Some(f.sig.ident.to_string())),
        Item::Impl(i) => (DeclKind::Impl, impl_self_type_name(i)),
        Item::Use(_) => (DeclKind::Import, None),
        Item::Const(c) => (DeclKind::Other, Some(c.ident.to_string())),
        Item::Static(s) => (DeclKind::Other, Some(s.ident.to_string())),
        Item::Type(t) => (DeclKind::Other, Some(t.ident.to_string())),
        Item::Mod(m) => (DeclKind::Other, Some(m.ident.to_string())),
        Item::Macro(m) => (
            DeclKind::Other,
            m.ident.as_ref().map(|i| i.to_string()),
        ),
        _ => (DeclKind::Other, None),
    }
}

/// Declarations the splitter may relocate. Module declarations anchor file
/// layout and macro definitions have textual-order scoping; both stay put.
pub fn is_movable(item: &Item) -> bool {
    !matches!(
        item,
        Item::Mod(_) | Item::Macro(_) | Item::ExternCrate(_) | Item::ForeignMod(_) | Item::Verbatim(_)
    )
}

/// Last path segment of an impl block's self type, e.g. `Foo` for
/// `impl fmt::Display for Foo`.
pub fn impl_self_type_name(item: &syn::ItemImpl) -> Option<String> {
    match item.self_ty.as_ref() {
        syn::Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

pub fn visibility_class(vis: &syn::Visibility) -> DeclVisibility {
    match vis {
        syn::Visibility::Public(_) => DeclVisibility::Public,
        syn::Visibility::Restricted(_) => DeclVisibility::Restricted,
        syn::Visibility::Inherited => DeclVisibility::Private,
    }
}

pub fn item_visibility(item: &Item) -> DeclVisibility {
    match item {
        Item::Struct(s) => visibility_class(&s.vis),
        Item::Enum(e) => visibility_class(&e.vis),
        Item::Union(u) => visibility_class(&u.vis),
        Item::Trait(t) => visibility_class(&t.vis),
        Item::TraitAlias(t) => visibility_class(&t.vis),
        Item::Fn(f) => visibility_class(&f.vis),
        Item::Use(u) => visibility_class(&u.vis),
        Item::Const(c) => visibility_class(&c.vis),
        Item::Static(s) => visibility_class(&s.vis),
        Item::Type(t) => visibility_class(&t.vis),
        Item::Mod(m) => visibility_class(&m.vis),
        // impls, macros, foreign mods carry no visibility of their own
        _ => DeclVisibility::Private,
    }
}

/// Where the splitter edits an item's visibility: either the span of an
/// explicit `pub`/`pub(...)`, or the position a visibility would occupy.
#[derive(Debug, Clone, Copy)]
pub enum VisLocation {
    Explicit { start: LineColumn, end: LineColumn },
    Missing { insert: LineColumn },
}

pub fn vis_location(item: &Item) -> Option<VisLocation> {
    let (vis, anchor) = match item {
        Item::Struct(s) => (Some(&s.vis), s.struct_token.span),
        Item::Enum(e) => (Some(&e.vis), e.enum_token.span),
        Item::Union(u) => (Some(&u.vis), u.union_token.span),
        Item::Trait(t) => (
            Some(&t.vis),
            t.unsafety
                .map(|u| u.span)
                .unwrap_or(t.trait_token.span),
        ),
        Item::TraitAlias(t) => (Some(&t.vis), t.trait_token.span),
        Item::Fn(f) => (Some(&f.vis), fn_anchor_span(&f.sig)),
        Item::Const(c) => (Some(&c.vis), c.const_token.span),
        Item::Static(s) => (Some(&s.vis), s.static_token.span),
        Item::Type(t) => (Some(&t.vis), t.type_token.span),
        Item::Mod(m) => (Some(&m.vis), m.mod_token.span),
        Item::Use(u) => (Some(&u.vis), u.use_token.span),
        _ => (None, item.span()),
    };
    let vis = vis?;
    Some(match vis {
        syn::Visibility::Public(p) => VisLocation::Explicit {
            start: p.span.start(),
            end: p.span.end(),
        },
        syn::Visibility::Restricted(r) => VisLocation::Explicit {
            start: r.pub_token.span.start(),
            end: r.paren_token.span.close().end(),
        },
        syn::Visibility::Inherited => VisLocation::Missing {
            insert: anchor.start(),
        },
    })
}

fn fn_anchor_span(sig: &syn::Signature) -> proc_macro2::Span {
    if let Some(c) = &sig.constness {
        return c.span;
    }
    if let Some(a) = &sig.asyncness {
        return a.span;
    }
    if let Some(u) = &sig.unsafety {
        return u.span;
    }
    if let Some(abi) = &sig.abi {
        return abi.extern_token.span;
    }
    sig.fn_token.span
}

/// Collects path-root identifiers an item references and the names it binds
/// locally. `free()` is the difference, minus ambient names.
#[derive(Default)]
struct IdentCollector {
    referenced: BTreeSet<String>,
    bound: BTreeSet<String>,
    module_relative: bool,
}

impl IdentCollector {
    fn free(self) -> (BTreeSet<String>, bool) {
        let IdentCollector {
            mut referenced,
            bound,
            module_relative,
        } = self;
        referenced.retain(|name| !bound.contains(name) && !AMBIENT_NAMES.contains(name.as_str()));
        (referenced, module_relative)
    }

    fn collect_stream(&mut self, tokens: TokenStream) {
        for tree in tokens {
            match tree {
                TokenTree::Ident(ident) => {
                    let name = ident.to_string();
                    if !matches!(name.as_str(), "self" | "Self" | "super" | "crate") {
                        self.referenced.insert(name);
                    }
                }
                TokenTree::Group(group) => self.collect_stream(group.stream()),
                _ => {}
            }
        }
    }
}

impl<'ast> Visit<'ast> for IdentCollector {
    fn visit_path(&mut self, path: &'ast syn::Path) {
        if let Some(first) = path.segments.first() {
            let root = first.ident.to_string();
            match root.as_str() {
                "crate" | "Self" => {}
                "self" | "super" => {
                    // Inline module-relative paths do not survive relocation
                    // into a child module.
                    self.module_relative = true;
                }
                _ => {
                    self.referenced.insert(root);
                }
            }
        }
        syn::visit::visit_path(self, path);
    }

    fn visit_pat_ident(&mut self, pat: &'ast syn::PatIdent) {
        self.bound.insert(pat.ident.to_string());
        syn::visit::visit_pat_ident(self, pat);
    }

    fn visit_type_param(&mut self, param: &'ast syn::TypeParam) {
        self.bound.insert(param.ident.to_string());
        syn::visit::visit_type_param(self, param);
    }

    fn visit_const_param(&mut self, param: &'ast syn::ConstParam) {
        self.bound.insert(param.ident.to_string());
        syn::visit::visit_const_param(self, param);
    }

    fn visit_item_use(&mut self, item: &'ast syn::ItemUse) {
        // A nested `use` binds names locally rather than referencing them.
        let mut names = Vec::new();
        let mut glob = false;
        flatten_use_tree(&item.tree, &mut names, &mut glob);
        self.bound.extend(names);
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        // Macro bodies are opaque token streams; lexing their identifiers
        // over-approximates the reference set, which is the safe direction.
        self.collect_stream(mac.tokens.clone());
        syn::visit::visit_macro(self, mac);
    }
}

/// Extract the top-level declarations of a parsed file, span-located and with
/// referenced identifiers resolved.
pub fn declarations(file: &ParsedFile) -> Vec<Decl> {
    let lines = file.lines();
    file.ast
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let (kind, name) = item_identity(item);
            let span = item.span();
            let start = extend_over_leading_comments(&lines, span.start().line);
            let (referenced, module_relative) = if kind == DeclKind::Import {
                (BTreeSet::new(), false)
            } else {
                let mut collector = IdentCollector::default();
                collector.visit_item(item);
                collector.free()
            };
            let mut decl = Decl {
                index,
                kind,
                name,
                visibility: item_visibility(item),
                line_start: start,
                line_end: span.end().line,
                referenced,
                movable: is_movable(item),
            };
            if module_relative {
                // Poison the reference set so the splitter's resolution gate
                // refuses to relocate this declaration.
                decl.referenced.insert("super".to_string());
            }
            decl
        })
        .collect()
}

/// Pull a declaration's start line upward over the `//` comment block sitting
/// directly above it. Inner doc comments (`//!`) belong to the file header and
/// are never captured.
fn extend_over_leading_comments(lines: &[&str], start_line: usize) -> usize {
    let mut start = start_line;
    while start > 1 {
        let above = lines
            .get(start.saturating_sub(2))
            .map(|l| l.trim())
            .unwrap_or("");
        if above.starts_with("//") && !above.starts_with("//!") {
            start -= 1;
        } else {
            break;
        }
    }
    start
}

/// One `use` declaration flattened to the names it binds.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// Index into the file's item list
    pub index: usize,
    pub line_start: usize,
    pub line_end: usize,
    /// Names this declaration brings into scope (rename-aware)
    pub names: Vec<String>,
    pub has_glob: bool,
    /// First path segment, e.g. `std`, `crate`, `self`, `super`
    pub root: String,
}

pub fn import_bindings(file: &ParsedFile) -> Vec<ImportBinding> {
    let lines = file.lines();
    file.ast
        .items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let Item::Use(use_item) = item else {
                return None;
            };
            let mut names = Vec::new();
            let mut has_glob = false;
            flatten_use_tree(&use_item.tree, &mut names, &mut has_glob);
            let span = use_item.span();
            Some(ImportBinding {
                index,
                line_start: extend_over_leading_comments(&lines, span.start().line),
                line_end: span.end().line,
                names,
                has_glob,
                root: use_tree_root(&use_item.tree),
            })
        })
        .collect()
}

fn use_tree_root(tree: &UseTree) -> String {
    match tree {
        UseTree::Path(p) => p.ident.to_string(),
        UseTree::Name(n) => n.ident.to_string(),
        UseTree::Rename(r) => r.ident.to_string(),
        UseTree::Glob(_) => "*".to_string(),
        UseTree::Group(_) => String::new(),
    }
}

pub fn flatten_use_tree(tree: &UseTree, names: &mut Vec<String>, has_glob: &mut bool) {
    match tree {
        UseTree::Path(p) => flatten_use_tree(&p.tree, names, has_glob),
        UseTree::Name(n) => names.push(n.ident.to_string()),
        UseTree::Rename(r) => names.push(r.rename.to_string()),
        UseTree::Glob(_) => *has_glob = true,
        UseTree::Group(g) => {
            for item in &g.items {
                flatten_use_tree(item, names, has_glob);
            }
        }
    }
}
