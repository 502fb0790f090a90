//! JSON notebook files.
//!
//! A notebook file lists cells in order. Code cells carry what a compiler
//! would have reported about them; each export's value is a JSON literal.
//!
//! ```json
//! {
//!   "cells": [
//!     { "kind": "code", "exports": { "a": 1 } },
//!     { "kind": "code", "imports": ["a"], "exports": { "b": "$a" } },
//!     { "kind": "text", "text": "Notes" },
//!     { "kind": "code", "error": "Unexpected token (1:4)" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use ignition_core::graph::{CellId, EdgeName, Port};
use ignition_core::notebook::{CellContent, Compilation, CompiledCell, Notebook};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Literal code of a cell: one JSON value per export.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralCode {
    pub exports: Vec<(EdgeName, Value)>,
}

#[derive(Debug, Deserialize)]
struct NotebookFile {
    cells: Vec<CellFile>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum CellFile {
    Code(CodeCellFile),
    Text {
        #[serde(default)]
        id: Option<usize>,
        text: String,
    },
}

#[derive(Debug, Deserialize)]
struct CodeCellFile {
    #[serde(default)]
    id: Option<usize>,
    #[serde(default)]
    imports: Vec<PortFile>,
    /// Exports in declaration order
    #[serde(default)]
    exports: Map<String, Value>,
    /// Compile error reported for the cell
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    top_level_return: bool,
    #[serde(default)]
    result_name: Option<String>,
}

/// An import given either as a bare name or as a renamed pair.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortFile {
    Named(String),
    Renamed { input: String, output: String },
}

impl From<PortFile> for Port {
    fn from(port: PortFile) -> Self {
        match port {
            PortFile::Named(name) => Port::named(name),
            PortFile::Renamed { input, output } => Port::new(input, output),
        }
    }
}

impl CodeCellFile {
    fn into_compilation(self) -> Compilation<LiteralCode> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let code = LiteralCode {
            exports: self
                .exports
                .iter()
                .map(|(name, value)| (EdgeName::new(name), value.clone()))
                .collect(),
        };
        let mut compiled = CompiledCell::new(code);
        compiled.has_top_level_return = self.top_level_return;
        compiled.result_name = self.result_name;
        compiled.imports = self.imports.into_iter().map(Port::from).collect();
        compiled.exports = self.exports.into_iter().map(|(name, _)| Port::named(name)).collect();
        Ok(compiled)
    }
}

/// Parse a notebook from JSON text.
pub fn parse(source: &str) -> anyhow::Result<Notebook<LiteralCode>> {
    let file: NotebookFile = serde_json::from_str(source).context("Invalid notebook file")?;
    let mut notebook = Notebook::new();

    for cell in file.cells {
        let (id, content) = match cell {
            CellFile::Code(code) => (code.id, CellContent::Code(code.into_compilation())),
            CellFile::Text { id, text } => (id, CellContent::Text(text)),
        };
        match (id, content) {
            (Some(id), content) => notebook.insert(CellId::new(id), content)?,
            (None, CellContent::Code(compilation)) => {
                notebook.add_code(compilation);
            }
            (None, CellContent::Text(text)) => {
                notebook.add_text(text);
            }
        }
    }

    tracing::debug!("Loaded {} cells", notebook.len());
    Ok(notebook)
}

/// Load a notebook file from disk.
pub fn load(path: &str) -> anyhow::Result<Notebook<LiteralCode>> {
    let path = Path::new(path);
    if !path.exists() {
        anyhow::bail!("Notebook not found: {}", path.display());
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&source).with_context(|| format!("Failed to load {}", path.display()))
}

/// Display name of a notebook file.
pub fn notebook_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "notebook".to_string())
}
