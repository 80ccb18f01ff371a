pub mod edges;
pub mod label;
pub mod process;
pub(crate) mod types;
pub use types::*;

use edges::build_edges;
use label::format_label;
use process::build_process_chains;

use crate::error::{Error, Result};
use crate::ir::{Diagram, Label};

fn styled(base: &str, stack: bool, faded: bool) -> String {
    let mut style = base.to_string();
    if stack {
        style.push_str(",stack");
    }
    if faded {
        style.push_str(",faded");
    }
    style
}

fn data_cell(
    id: String,
    kind: NodeKind,
    style: String,
    label: &Label,
    width: Option<usize>,
) -> Result<Cell> {
    Ok(Cell {
        id,
        kind,
        style,
        label: format_label(label, width)?,
    })
}

/// Places every entity of `diagram` on a square grid.
///
/// Systems sit on the diagonal in insertion order. An input row above them
/// shifts the diagonal down by one, a left output column shifts it right by
/// one, and a right output column only widens the grid. Connection cells land
/// at (row of source, column of target).
pub fn compute_grid(diagram: &Diagram) -> Result<GridLayout> {
    let systems = diagram.systems();
    if systems.is_empty() {
        return Err(Error::InvalidState {
            message: "diagram has no systems".to_string(),
        });
    }

    let row_offset = usize::from(!diagram.inputs().is_empty());
    let col_offset = usize::from(!diagram.left_outputs().is_empty());
    let has_right = !diagram.right_outputs().is_empty();
    let size = systems.len() + row_offset + col_offset + usize::from(has_right);

    tracing::debug!(
        systems = systems.len(),
        connections = diagram.connections().len(),
        size,
        row_offset,
        col_offset,
        "laying out xdsm grid"
    );

    let mut grid = GridLayout::new(size, row_offset, col_offset);

    for (idx, system) in systems.iter().enumerate() {
        let (row, col) = (idx + row_offset, idx + col_offset);
        let cell = data_cell(
            system.id.clone(),
            NodeKind::System,
            styled(system.kind.as_str(), system.stack, system.faded),
            &system.label,
            system.label_width,
        )?;
        grid.place(row, col, cell)?;
        grid.row_by_id.insert(system.id.clone(), row);
        grid.col_by_id.insert(system.id.clone(), col);
    }

    for conn in diagram.connections() {
        let id = conn.node_id();
        let row = *grid
            .row_by_id
            .get(&conn.src)
            .ok_or_else(|| Error::unknown_reference(&conn.src, format!("connection `{id}`")))?;
        let col = *grid
            .col_by_id
            .get(&conn.target)
            .ok_or_else(|| Error::unknown_reference(&conn.target, format!("connection `{id}`")))?;
        let cell = data_cell(
            id,
            NodeKind::Connection,
            styled(conn.style.as_str(), conn.stack, conn.faded),
            &conn.label,
            conn.label_width,
        )?;
        if let Some(previous) = grid.place(row, col, cell)? {
            tracing::warn!(
                cell = %previous.id,
                row,
                col,
                "duplicate connection replaces an earlier cell"
            );
        }
    }

    for (system, output) in diagram.left_outputs() {
        let row = *grid
            .row_by_id
            .get(system)
            .ok_or_else(|| Error::unknown_reference(system, "left output"))?;
        let cell = data_cell(
            output.node_id.clone(),
            NodeKind::LeftOutput,
            styled(output.style.as_str(), output.stack, false),
            &output.label,
            output.label_width,
        )?;
        grid.place(row, 0, cell)?;
    }

    for (system, output) in diagram.right_outputs() {
        let row = *grid
            .row_by_id
            .get(system)
            .ok_or_else(|| Error::unknown_reference(system, "right output"))?;
        let cell = data_cell(
            output.node_id.clone(),
            NodeKind::RightOutput,
            styled(output.style.as_str(), output.stack, false),
            &output.label,
            output.label_width,
        )?;
        grid.place(row, size - 1, cell)?;
    }

    for (system, input) in diagram.inputs() {
        let col = *grid
            .col_by_id
            .get(system)
            .ok_or_else(|| Error::unknown_reference(system, "input"))?;
        let cell = data_cell(
            input.node_id.clone(),
            NodeKind::Input,
            styled(input.style.as_str(), input.stack, false),
            &input.label,
            input.label_width,
        )?;
        grid.place(0, col, cell)?;
    }

    Ok(grid)
}

/// Runs the grid layout, edge and process emitters over a finished diagram.
/// Any failure aborts the whole compile.
pub fn compile_diagram(diagram: &Diagram) -> Result<CompiledDiagram> {
    let grid = compute_grid(diagram)?;
    let process = build_process_chains(diagram.processes(), &grid)?;
    let edges = build_edges(diagram);
    let nodes = grid.to_markup();
    tracing::debug!(
        cells = grid.iter().count(),
        processes = diagram.processes().len(),
        "compiled xdsm diagram"
    );
    Ok(CompiledDiagram {
        grid,
        nodes,
        edges,
        process,
    })
}
