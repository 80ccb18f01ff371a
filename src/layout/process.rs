use std::fmt::Write;

use crate::error::{Error, Result};
use crate::ir::Process;

use super::{GridLayout, NodeKind};

fn join_style(tip: bool, arrow: bool) -> &'static str {
    match (tip, arrow) {
        (true, true) => "ProcessTipA",
        (true, false) => "ProcessTip",
        (false, true) => "ProcessHVA",
        (false, false) => "ProcessHV",
    }
}

/// Resolves every node of a chain to its kind. Only systems and I/O
/// terminals may take part in a process.
fn resolve_chain(process: &Process, grid: &GridLayout) -> Result<Vec<NodeKind>> {
    process
        .nodes
        .iter()
        .map(|id| match grid.node_kind(id) {
            Some(kind) if kind == NodeKind::System || kind.is_io() => Ok(kind),
            _ => Err(Error::UnknownProcessNode { id: id.clone() }),
        })
        .collect()
}

/// Emits one `[start chain=process]` block per process.
///
/// A link touching an input or output uses the tapered `ProcessTip` style;
/// links between systems use the orthogonal `ProcessHV` style. The `A`
/// variants carry arrowheads.
pub fn build_process_chains(processes: &[Process], grid: &GridLayout) -> Result<String> {
    let mut out = String::new();
    for process in processes {
        let kinds = resolve_chain(process, grid)?;
        out.push_str("{ [start chain=process]\n \\begin{pgfonlayer}{process}\n");
        for (idx, id) in process.nodes.iter().enumerate() {
            if idx == 0 {
                let _ = writeln!(out, "\\chainin ({id});");
                continue;
            }
            let tip = kinds[idx].is_io() || kinds[idx - 1].is_io();
            let _ = writeln!(
                out,
                "\\chainin ({id}) [join=by {}];",
                join_style(tip, process.arrow)
            );
        }
        out.push_str("\\end{pgfonlayer}\n}\n");
    }
    Ok(out)
}
