use crate::ir::Diagram;
use crate::layout::edges::collect_edges;
use crate::layout::{GridLayout, NodeKind};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub size: usize,
    pub row_offset: usize,
    pub col_offset: usize,
    pub cells: Vec<CellDump>,
    pub edges: Vec<EdgeDump>,
    pub processes: Vec<ProcessDump>,
}

#[derive(Debug, Serialize)]
pub struct CellDump {
    pub id: String,
    pub kind: NodeKind,
    pub row: usize,
    pub col: usize,
    pub style: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub faded: bool,
}

#[derive(Debug, Serialize)]
pub struct ProcessDump {
    pub nodes: Vec<String>,
    pub arrow: bool,
}

impl LayoutDump {
    pub fn from_grid(grid: &GridLayout, diagram: &Diagram) -> Self {
        let cells = grid
            .iter()
            .map(|(row, col, cell)| CellDump {
                id: cell.id.clone(),
                kind: cell.kind,
                row,
                col,
                style: cell.style.clone(),
                label: cell.label.clone(),
            })
            .collect();

        let edges = collect_edges(diagram)
            .iter()
            .map(|edge| EdgeDump {
                from: edge.start.clone(),
                to: edge.end.clone(),
                faded: edge.faded,
            })
            .collect();

        let processes = diagram
            .processes()
            .iter()
            .map(|process| ProcessDump {
                nodes: process.nodes.clone(),
                arrow: process.arrow,
            })
            .collect();

        LayoutDump {
            size: grid.size,
            row_offset: grid.row_offset,
            col_offset: grid.col_offset,
            cells,
            edges,
            processes,
        }
    }
}

pub fn write_layout_dump(path: &Path, grid: &GridLayout, diagram: &Diagram) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_grid(grid, diagram);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
