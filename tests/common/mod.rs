//! Shared fixtures: a synthetic oversized module with three unrelated
//! responsibility clusters, and tree hashing helpers.
#![allow(dead_code)] // not every test binary uses every helper

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Padded method body: `count` distinct statements.
fn pad(out: &mut String, prefix: &str, count: usize) {
    for i in 0..count {
        let _ = writeln!(out, "        let _{prefix}{i} = {i}usize;");
    }
}

/// A ~1,200-line file with three unrelated clusters (parser / renderer /
/// session), each tied together by a shared import and a shared name stem.
/// Declaration shares are roughly 40% / 35% / 25%.
pub fn three_cluster_source() -> String {
    let mut src = String::new();
    src.push_str("use std::collections::HashMap;\n");
    src.push_str("use std::fmt::Write;\n");
    src.push_str("use std::net::TcpStream;\n\n");

    // cluster 1: parsing, backed by HashMap
    src.push_str("pub struct Parser {\n    table: HashMap<String, u32>,\n}\n\n");
    src.push_str("impl Parser {\n");
    src.push_str("    pub fn parse_block(&self) -> usize {\n");
    pad(&mut src, "pb", 180);
    src.push_str("        self.table.len()\n    }\n\n");
    src.push_str("    pub fn parse_reset(&mut self) {\n");
    pad(&mut src, "pr", 60);
    src.push_str("        self.table.clear();\n    }\n");
    src.push_str("}\n\n");
    src.push_str("pub fn parse_header(input: &str) -> HashMap<String, u32> {\n");
    src.push_str("    let mut table: HashMap<String, u32> = HashMap::new();\n");
    pad(&mut src, "ph", 100);
    src.push_str("    table.insert(input.to_string(), 1);\n    table\n}\n\n");
    src.push_str("pub fn parse_body(input: &str) -> HashMap<String, u32> {\n");
    src.push_str("    let mut table: HashMap<String, u32> = HashMap::new();\n");
    pad(&mut src, "pd", 100);
    src.push_str("    table.insert(input.to_string(), 2);\n    table\n}\n\n");

    // cluster 2: rendering, backed by fmt::Write
    src.push_str("pub struct Renderer {\n    buffer: String,\n}\n\n");
    src.push_str("impl Renderer {\n");
    src.push_str("    pub fn render_block(&mut self, sink: &mut dyn Write) -> usize {\n");
    pad(&mut src, "rb", 170);
    src.push_str("        let _ = sink.write_str(&self.buffer);\n        self.buffer.len()\n    }\n");
    src.push_str("}\n\n");
    src.push_str("pub fn render_header(sink: &mut dyn Write) {\n");
    pad(&mut src, "rh", 90);
    src.push_str("    let _ = sink.write_str(\"header\");\n}\n\n");
    src.push_str("pub fn render_footer(sink: &mut dyn Write) {\n");
    pad(&mut src, "rf", 90);
    src.push_str("    let _ = sink.write_str(\"footer\");\n}\n\n");

    // cluster 3: connections, backed by TcpStream
    src.push_str("pub struct Session {\n    stream: Option<TcpStream>,\n}\n\n");
    src.push_str("impl Session {\n");
    src.push_str("    pub fn session_open(&mut self, addr: &str) -> bool {\n");
    src.push_str("        self.stream = TcpStream::connect(addr).ok();\n");
    pad(&mut src, "so", 150);
    src.push_str("        self.stream.is_some()\n    }\n");
    src.push_str("}\n\n");
    src.push_str("pub fn session_probe(addr: &str) -> Option<TcpStream> {\n");
    pad(&mut src, "sp", 80);
    src.push_str("    TcpStream::connect(addr).ok()\n}\n");

    src
}

pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// (relative path -> content hash) for every file under `dir`.
pub fn hash_tree(dir: &Path) -> BTreeMap<PathBuf, String> {
    let mut out = BTreeMap::new();
    for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            let rel = entry.path().strip_prefix(dir).unwrap().to_path_buf();
            let content = fs::read(entry.path()).unwrap();
            out.insert(rel, splitmap::workflow::backup::sha256_hex(&content));
        }
    }
    out
}
