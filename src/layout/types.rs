use std::collections::HashMap;
use std::fmt::Write;

use serde::Serialize;

use crate::error::{Error, Result};

/// What a placed grid cell stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    System,
    Connection,
    Input,
    LeftOutput,
    RightOutput,
}

impl NodeKind {
    /// Inputs and outputs are the peripheral terminals of the diagram.
    pub fn is_io(self) -> bool {
        matches!(
            self,
            NodeKind::Input | NodeKind::LeftOutput | NodeKind::RightOutput
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: String,
    pub kind: NodeKind,
    pub style: String,
    /// Label already rendered as math markup.
    pub label: String,
}

impl Cell {
    pub fn to_markup(&self) -> String {
        format!(r"\node [{}] ({}) {{{}}};", self.style, self.id, self.label)
    }
}

/// Square grid of cells produced by one compile pass.
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub size: usize,
    /// 1 when an input row sits above the systems.
    pub row_offset: usize,
    /// 1 when a left output column sits before the systems.
    pub col_offset: usize,
    pub(crate) cells: Vec<Option<Cell>>,
    pub(crate) row_by_id: HashMap<String, usize>,
    pub(crate) col_by_id: HashMap<String, usize>,
    pub(crate) node_kinds: HashMap<String, NodeKind>,
    pub(crate) pos_by_id: HashMap<String, (usize, usize)>,
}

impl GridLayout {
    pub(crate) fn new(size: usize, row_offset: usize, col_offset: usize) -> Self {
        Self {
            size,
            row_offset,
            col_offset,
            cells: vec![None; size * size],
            row_by_id: HashMap::new(),
            col_by_id: HashMap::new(),
            node_kinds: HashMap::new(),
            pos_by_id: HashMap::new(),
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells[row * self.size + col].as_ref()
    }

    /// Places `cell`, returning whatever occupied the slot before.
    ///
    /// A node name owns exactly one cell: placing the same name again at the
    /// same slot replaces it, anywhere else is an error.
    pub(crate) fn place(&mut self, row: usize, col: usize, cell: Cell) -> Result<Option<Cell>> {
        if let Some(&(at_row, at_col)) = self.pos_by_id.get(&cell.id) {
            if (at_row, at_col) != (row, col) {
                return Err(Error::InvalidState {
                    message: format!(
                        "node name `{}` is used by two nodes, at ({at_row}, {at_col}) and ({row}, {col})",
                        cell.id
                    ),
                });
            }
        }
        let id = cell.id.clone();
        self.node_kinds.insert(id.clone(), cell.kind);
        let previous = self.cells[row * self.size + col].replace(cell);
        if let Some(previous) = previous.as_ref().filter(|previous| previous.id != id) {
            self.pos_by_id.remove(&previous.id);
            self.node_kinds.remove(&previous.id);
        }
        self.pos_by_id.insert(id, (row, col));
        Ok(previous)
    }

    /// Diagonal position of a system.
    pub fn system_position(&self, id: &str) -> Option<(usize, usize)> {
        Some((*self.row_by_id.get(id)?, *self.col_by_id.get(id)?))
    }

    /// Position of any placed cell, looked up by node id.
    pub fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.pos_by_id.get(id).copied()
    }

    pub fn node_kind(&self, id: &str) -> Option<NodeKind> {
        self.node_kinds.get(id).copied()
    }

    /// Placed cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.cells.iter().enumerate().filter_map(|(idx, cell)| {
            cell.as_ref()
                .map(|cell| (idx / self.size, idx % self.size, cell))
        })
    }

    /// Row-major `\matrix` body: a `%Row i` comment per row, cells separated
    /// by `&`, rows terminated by `\\`.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for row in 0..self.size {
            let _ = writeln!(out, "%Row {row}");
            for col in 0..self.size {
                if col > 0 {
                    out.push_str("&\n");
                }
                if let Some(cell) = self.cell(row, col) {
                    out.push_str(&cell.to_markup());
                }
            }
            out.push_str("\\\\\n");
        }
        out
    }
}

/// The three markup fragments of a compiled diagram, plus the grid they were
/// derived from.
#[derive(Debug, Clone)]
pub struct CompiledDiagram {
    pub grid: GridLayout,
    pub nodes: String,
    pub edges: String,
    pub process: String,
}
