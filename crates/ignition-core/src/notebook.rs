//! In-memory notebook model.
//!
//! The notebook owns the ordered cell list, each cell's compiled summary
//! and the run requests made against it. Compiling source text is the job of
//! an external compiler; cells arrive here already summarised.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{CellId, DisconnectedNode, Port};
use crate::time::{EngineClock, EngineTime};

/// Type of cell in the notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Executable code cell.
    Code,
    /// Prose; never scheduled.
    Text,
}

/// What the external compiler reports for a cell that compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCell<C> {
    /// Names read from other cells.
    #[serde(default)]
    pub imports: Vec<Port>,
    /// Names produced for other cells.
    #[serde(default)]
    pub exports: Vec<Port>,
    /// Compiled form handed to the runner.
    pub code: C,
    /// Label for the cell's value, when the compiler can derive one.
    #[serde(default)]
    pub result_name: Option<String>,
    /// Whether the cell has a `return` outside any function.
    #[serde(default)]
    pub has_top_level_return: bool,
}

impl<C> CompiledCell<C> {
    pub fn new(code: C) -> Self {
        Self {
            imports: Vec::new(),
            exports: Vec::new(),
            code,
            result_name: None,
            has_top_level_return: false,
        }
    }

    pub fn with_import(mut self, port: Port) -> Self {
        self.imports.push(port);
        self
    }

    pub fn with_export(mut self, port: Port) -> Self {
        self.exports.push(port);
        self
    }

    pub fn with_result_name(mut self, name: impl Into<String>) -> Self {
        self.result_name = Some(name.into());
        self
    }
}

/// Compiler output for a code cell: the summary or the compiler's message.
pub type Compilation<C> = std::result::Result<CompiledCell<C>, String>;

/// Contents of a notebook cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent<C> {
    Code(Compilation<C>),
    Text(String),
}

/// A cell as seen by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct NotebookCell<C> {
    pub id: CellId,
    /// When a run of this cell was last requested.
    pub requested_run_time: EngineTime,
    pub content: CellContent<C>,
}

impl<C> NotebookCell<C> {
    pub fn kind(&self) -> CellKind {
        match self.content {
            CellContent::Code(_) => CellKind::Code,
            CellContent::Text(_) => CellKind::Text,
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind() == CellKind::Code
    }

    pub fn compilation(&self) -> Option<&Compilation<C>> {
        match &self.content {
            CellContent::Code(compilation) => Some(compilation),
            CellContent::Text(_) => None,
        }
    }

    /// The cell's imports and exports, empty when compilation failed.
    pub fn disconnected(&self) -> DisconnectedNode {
        match self.compilation() {
            Some(Ok(compiled)) => DisconnectedNode {
                id: self.id,
                imports: compiled.imports.clone(),
                exports: compiled.exports.clone(),
            },
            _ => DisconnectedNode::new(self.id),
        }
    }
}

/// Ordered collection of cells plus the clock stamping run requests.
#[derive(Debug, Clone)]
pub struct Notebook<C> {
    cells: Vec<NotebookCell<C>>,
    clock: EngineClock,
    next_id: usize,
}

impl<C> Default for Notebook<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Notebook<C> {
    /// Create an empty notebook.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            clock: EngineClock::new(),
            next_id: 0,
        }
    }

    /// Append a code cell and request its first run.
    pub fn add_code(&mut self, compilation: Compilation<C>) -> CellId {
        let id = self.allocate_id();
        let requested_run_time = self.clock.advance();
        self.cells.push(NotebookCell {
            id,
            requested_run_time,
            content: CellContent::Code(compilation),
        });
        id
    }

    /// Append a text cell.
    pub fn add_text(&mut self, text: impl Into<String>) -> CellId {
        let id = self.allocate_id();
        self.cells.push(NotebookCell {
            id,
            requested_run_time: EngineTime::Earliest,
            content: CellContent::Text(text.into()),
        });
        id
    }

    /// Append a cell under an id chosen by the caller.
    ///
    /// Code cells get a run request, like [`Notebook::add_code`].
    pub fn insert(&mut self, id: CellId, content: CellContent<C>) -> Result<()> {
        if self.contains(id) {
            return Err(Error::DuplicateCell(id));
        }
        let after = id
            .as_usize()
            .checked_add(1)
            .ok_or(Error::CellIdOverflow(id))?;
        self.next_id = self.next_id.max(after);
        let requested_run_time = match content {
            CellContent::Code(_) => self.clock.advance(),
            CellContent::Text(_) => EngineTime::Earliest,
        };
        self.cells.push(NotebookCell {
            id,
            requested_run_time,
            content,
        });
        Ok(())
    }

    /// Replace a cell's compiled summary after an edit and request a run.
    pub fn update_code(&mut self, id: CellId, compilation: Compilation<C>) -> Result<()> {
        let requested_run_time = self.clock.advance();
        let cell = self.cell_mut(id)?;
        cell.content = CellContent::Code(compilation);
        cell.requested_run_time = requested_run_time;
        Ok(())
    }

    /// Ask for a cell to run again without changing it.
    pub fn request_run(&mut self, id: CellId) -> Result<EngineTime> {
        let requested_run_time = self.clock.advance();
        let cell = self.cell_mut(id)?;
        cell.requested_run_time = requested_run_time;
        Ok(requested_run_time)
    }

    /// Remove a cell.
    pub fn remove(&mut self, id: CellId) -> Result<NotebookCell<C>> {
        let pos = self
            .cells
            .iter()
            .position(|cell| cell.id == id)
            .ok_or(Error::CellNotFound(id))?;
        Ok(self.cells.remove(pos))
    }

    /// Get a cell by ID.
    pub fn cell(&self, id: CellId) -> Option<&NotebookCell<C>> {
        self.cells.iter().find(|cell| cell.id == id)
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut NotebookCell<C>> {
        self.cells
            .iter_mut()
            .find(|cell| cell.id == id)
            .ok_or(Error::CellNotFound(id))
    }

    /// Whether the notebook holds a cell with this id.
    pub fn contains(&self, id: CellId) -> bool {
        self.cells.iter().any(|cell| cell.id == id)
    }

    /// All cells in notebook order.
    pub fn cells(&self) -> &[NotebookCell<C>] {
        &self.cells
    }

    /// Code cells in notebook order.
    pub fn code_cells(&self) -> impl Iterator<Item = &NotebookCell<C>> {
        self.cells.iter().filter(|cell| cell.is_code())
    }

    /// Get the number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the notebook is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn allocate_id(&mut self) -> CellId {
        let id = CellId::new(self.next_id);
        self.next_id += 1;
        id
    }
}
