use crate::ir::Diagram;

const EDGE_STYLE: &str = "DataLine";

/// One leg of a data line, between a system and a data node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub start: String,
    pub end: String,
    pub faded: bool,
}

impl Edge {
    fn new(start: &str, end: &str, faded: bool) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            faded,
        }
    }

    pub fn to_markup(&self) -> String {
        let style = if self.faded {
            format!("{EDGE_STYLE},faded")
        } else {
            EDGE_STYLE.to_string()
        };
        format!("({}) edge [{style}] ({})", self.start, self.end)
    }
}

/// Edges in drawing order, split by direction.
#[derive(Debug, Clone, Default)]
pub struct EdgeList {
    pub horizontal: Vec<Edge>,
    pub vertical: Vec<Edge>,
}

impl EdgeList {
    /// Horizontal edges followed by vertical ones.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.horizontal.iter().chain(self.vertical.iter())
    }
}

/// Collects every data line of `diagram`.
///
/// A connection is drawn as two legs through its off-diagonal cell: a
/// horizontal one from the source and a vertical one into the target. Outputs
/// get a horizontal leg, inputs a vertical one. Faded edges are listed last
/// so emphasized lines are drawn over them.
pub fn collect_edges(diagram: &Diagram) -> EdgeList {
    let mut edges = EdgeList::default();

    for conn in diagram.connections() {
        let cell = conn.node_id();
        edges.horizontal.push(Edge::new(&conn.src, &cell, conn.faded));
        edges.vertical.push(Edge::new(&cell, &conn.target, conn.faded));
    }

    for (system, output) in diagram.outputs() {
        edges.horizontal.push(Edge::new(system, &output.node_id, false));
    }

    for (system, input) in diagram.inputs() {
        edges.vertical.push(Edge::new(system, &input.node_id, false));
    }

    // stable: keeps insertion order within each group
    edges.horizontal.sort_by_key(|edge| edge.faded);
    edges.vertical.sort_by_key(|edge| edge.faded);
    edges
}

/// Builds the `\path` body connecting every data node to its systems.
pub fn build_edges(diagram: &Diagram) -> String {
    let edges = collect_edges(diagram);
    let horizontal: Vec<String> = edges.horizontal.iter().map(Edge::to_markup).collect();
    let vertical: Vec<String> = edges.vertical.iter().map(Edge::to_markup).collect();

    let mut out = String::from("% Horizontal edges\n");
    out.push_str(&horizontal.join("\n"));
    out.push('\n');
    out.push_str("% Vertical edges\n");
    out.push_str(&vertical.join("\n"));
    out.push(';');
    out
}
