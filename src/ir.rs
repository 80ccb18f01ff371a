use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{CompiledDiagram, compile_diagram};

// TikZ node names may not contain anchor/coordinate syntax (`.`, `(`, `)`,
// `,`, `;`) or group delimiters. Spec names share the pattern and double as
// file names, so no path separators either.
static NODE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_+*'!?@-]*$").unwrap());

/// Text shown inside a node: one math expression, or fragments stacked (or
/// chunked) into an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Text(String),
    Lines(Vec<String>),
}

impl Label {
    /// Label tokens as seen by the spec export: a text label is a single token.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Label::Text(text) => std::slice::from_ref(text),
            Label::Lines(lines) => lines.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Text(value)
    }
}

impl From<Vec<String>> for Label {
    fn from(value: Vec<String>) -> Self {
        Label::Lines(value)
    }
}

impl From<Vec<&str>> for Label {
    fn from(value: Vec<&str>) -> Self {
        Label::Lines(value.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Label {
    fn from(value: [&str; N]) -> Self {
        Label::Lines(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Visual category of a diagonal node. The TikZ style names are defined by
/// the style sheet in [`crate::theme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemKind {
    Optimization,
    SubOptimization,
    #[serde(rename = "MDA")]
    Mda,
    #[serde(rename = "DOE")]
    Doe,
    Function,
    ImplicitFunction,
    Group,
    ImplicitGroup,
    Metamodel,
}

impl SystemKind {
    pub const ALL: [SystemKind; 9] = [
        SystemKind::Optimization,
        SystemKind::SubOptimization,
        SystemKind::Mda,
        SystemKind::Doe,
        SystemKind::Function,
        SystemKind::ImplicitFunction,
        SystemKind::Group,
        SystemKind::ImplicitGroup,
        SystemKind::Metamodel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemKind::Optimization => "Optimization",
            SystemKind::SubOptimization => "SubOptimization",
            SystemKind::Mda => "MDA",
            SystemKind::Doe => "DOE",
            SystemKind::Function => "Function",
            SystemKind::ImplicitFunction => "ImplicitFunction",
            SystemKind::Group => "Group",
            SystemKind::ImplicitGroup => "ImplicitGroup",
            SystemKind::Metamodel => "Metamodel",
        }
    }

    /// Accepts the TikZ style name or one of the short aliases (`opt`,
    /// `solver`, `ifunc`, ...), case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        let lower = token.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "optimization" | "opt" | "optimizer" => SystemKind::Optimization,
            "suboptimization" | "subopt" => SystemKind::SubOptimization,
            "mda" | "solver" => SystemKind::Mda,
            "doe" => SystemKind::Doe,
            "function" | "func" => SystemKind::Function,
            "implicitfunction" | "ifunc" => SystemKind::ImplicitFunction,
            "group" => SystemKind::Group,
            "implicitgroup" | "igroup" => SystemKind::ImplicitGroup,
            "metamodel" => SystemKind::Metamodel,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(s)
            .ok_or_else(|| Error::invalid_argument(format!("unknown system style `{s}`")))
    }
}

/// Style of an off-diagonal or peripheral data node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataStyle {
    #[default]
    DataInter,
    #[serde(rename = "DataIO")]
    DataIo,
}

impl DataStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            DataStyle::DataInter => "DataInter",
            DataStyle::DataIo => "DataIO",
        }
    }
}

impl fmt::Display for DataStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "datainter" | "inter" => Ok(DataStyle::DataInter),
            "dataio" | "io" => Ok(DataStyle::DataIo),
            _ => Err(Error::invalid_argument(format!("unknown data style `{s}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(Error::invalid_argument(format!(
                "the option 'side' must be given as either 'left' or 'right', got `{s}`"
            ))),
        }
    }
}

/// Name under which a system's spec record is exported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpecName {
    /// Use the system identifier.
    #[default]
    Id,
    Named(String),
    /// The system produces no spec record.
    Suppressed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct System {
    pub id: String,
    pub kind: SystemKind,
    pub label: Label,
    pub stack: bool,
    pub faded: bool,
    pub label_width: Option<usize>,
    pub spec_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub src: String,
    pub target: String,
    pub label: Label,
    pub label_width: Option<usize>,
    pub style: DataStyle,
    pub stack: bool,
    pub faded: bool,
}

impl Connection {
    pub fn node_id(&self) -> String {
        connection_node_id(&self.src, &self.target)
    }
}

/// External input feeding one system from the row above the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub node_id: String,
    pub label: Label,
    pub label_width: Option<usize>,
    pub style: DataStyle,
    pub stack: bool,
}

/// External output leaving one system through the left or right column.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub node_id: String,
    pub label: Label,
    pub label_width: Option<usize>,
    pub style: DataStyle,
    pub stack: bool,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub nodes: Vec<String>,
    pub arrow: bool,
}

pub fn connection_node_id(src: &str, target: &str) -> String {
    format!("{src}-{target}")
}

pub fn input_node_id(system: &str) -> String {
    format!("output_{system}")
}

pub fn output_node_id(system: &str, side: Side) -> String {
    match side {
        Side::Left => format!("left_output_{system}"),
        Side::Right => format!("right_output_{system}"),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemOptions {
    pub stack: bool,
    pub faded: bool,
    pub label_width: Option<usize>,
    pub spec_name: SpecName,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub label_width: Option<usize>,
    pub style: DataStyle,
    pub stack: bool,
    pub faded: bool,
}

#[derive(Debug, Clone)]
pub struct InputOptions {
    pub label_width: Option<usize>,
    pub style: DataStyle,
    pub stack: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            label_width: None,
            style: DataStyle::DataIo,
            stack: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub label_width: Option<usize>,
    pub style: DataStyle,
    pub stack: bool,
    pub side: Side,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            label_width: None,
            style: DataStyle::DataIo,
            stack: false,
            side: Side::Left,
        }
    }
}

/// Accumulates systems, connections, inputs, outputs and process chains.
///
/// Every registration validates its arguments before touching the model, so a
/// rejected call leaves the diagram exactly as it was. References between
/// entities are resolved by [`Diagram::compile`].
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    systems: Vec<System>,
    connections: Vec<Connection>,
    inputs: IndexMap<String, Input>,
    left_outputs: IndexMap<String, Output>,
    right_outputs: IndexMap<String, Output>,
    processes: Vec<Process>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_system(
        &mut self,
        id: &str,
        kind: SystemKind,
        label: impl Into<Label>,
    ) -> Result<&mut Self> {
        self.add_system_with(id, kind, label, SystemOptions::default())
    }

    pub fn add_system_with(
        &mut self,
        id: &str,
        kind: SystemKind,
        label: impl Into<Label>,
        options: SystemOptions,
    ) -> Result<&mut Self> {
        validate_node_id(id)?;
        if self.system(id).is_some() {
            return Err(Error::DuplicateIdentifier { id: id.to_string() });
        }
        let label = label.into();
        validate_label(&label)?;
        validate_width(options.label_width)?;
        let spec_name = match options.spec_name {
            SpecName::Id => Some(id.to_string()),
            SpecName::Named(name) => {
                validate_spec_name(&name)?;
                Some(name)
            }
            SpecName::Suppressed => None,
        };
        if let Some(name) = spec_name.as_deref() {
            if let Some(owner) = self
                .systems
                .iter()
                .find(|system| system.spec_name.as_deref() == Some(name))
            {
                return Err(Error::invalid_argument(format!(
                    "spec name `{name}` is already used by system `{}`",
                    owner.id
                )));
            }
        }
        self.systems.push(System {
            id: id.to_string(),
            kind,
            label,
            stack: options.stack,
            faded: options.faded,
            label_width: options.label_width,
            spec_name,
        });
        Ok(self)
    }

    pub fn add_input(&mut self, system: &str, label: impl Into<Label>) -> Result<&mut Self> {
        self.add_input_with(system, label, InputOptions::default())
    }

    /// Registers the input of `system`, replacing any earlier one.
    pub fn add_input_with(
        &mut self,
        system: &str,
        label: impl Into<Label>,
        options: InputOptions,
    ) -> Result<&mut Self> {
        let label = label.into();
        validate_label(&label)?;
        validate_width(options.label_width)?;
        self.inputs.insert(
            system.to_string(),
            Input {
                node_id: input_node_id(system),
                label,
                label_width: options.label_width,
                style: options.style,
                stack: options.stack,
            },
        );
        Ok(self)
    }

    pub fn add_output(
        &mut self,
        system: &str,
        label: impl Into<Label>,
        side: Side,
    ) -> Result<&mut Self> {
        self.add_output_with(
            system,
            label,
            OutputOptions {
                side,
                ..OutputOptions::default()
            },
        )
    }

    /// Registers the output of `system` on `options.side`, replacing any
    /// earlier output on that side.
    pub fn add_output_with(
        &mut self,
        system: &str,
        label: impl Into<Label>,
        options: OutputOptions,
    ) -> Result<&mut Self> {
        let label = label.into();
        validate_label(&label)?;
        validate_width(options.label_width)?;
        let output = Output {
            node_id: output_node_id(system, options.side),
            label,
            label_width: options.label_width,
            style: options.style,
            stack: options.stack,
            side: options.side,
        };
        let outputs = match options.side {
            Side::Left => &mut self.left_outputs,
            Side::Right => &mut self.right_outputs,
        };
        outputs.insert(system.to_string(), output);
        Ok(self)
    }

    pub fn connect(
        &mut self,
        src: &str,
        target: &str,
        label: impl Into<Label>,
    ) -> Result<&mut Self> {
        self.connect_with(src, target, label, ConnectOptions::default())
    }

    /// Adds a data connection from `src` to `target`.
    ///
    /// Connecting the same pair twice keeps both records; the later one wins
    /// the shared grid cell.
    pub fn connect_with(
        &mut self,
        src: &str,
        target: &str,
        label: impl Into<Label>,
        options: ConnectOptions,
    ) -> Result<&mut Self> {
        if src == target {
            return Err(Error::SelfConnection { id: src.to_string() });
        }
        let label = label.into();
        validate_label(&label)?;
        validate_width(options.label_width)?;
        self.connections.push(Connection {
            src: src.to_string(),
            target: target.to_string(),
            label,
            label_width: options.label_width,
            style: options.style,
            stack: options.stack,
            faded: options.faded,
        });
        Ok(self)
    }

    pub fn add_process<I, S>(&mut self, nodes: I, arrow: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.processes.push(Process {
            nodes: nodes.into_iter().map(Into::into).collect(),
            arrow,
        });
        self
    }

    pub fn compile(&self) -> Result<CompiledDiagram> {
        compile_diagram(self)
    }

    pub fn system(&self, id: &str) -> Option<&System> {
        self.systems.iter().find(|system| system.id == id)
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn inputs(&self) -> &IndexMap<String, Input> {
        &self.inputs
    }

    pub fn left_outputs(&self) -> &IndexMap<String, Output> {
        &self.left_outputs
    }

    pub fn right_outputs(&self) -> &IndexMap<String, Output> {
        &self.right_outputs
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Left outputs followed by right outputs, each keyed by system id.
    pub fn outputs(&self) -> impl Iterator<Item = (&String, &Output)> {
        self.left_outputs.iter().chain(self.right_outputs.iter())
    }
}

pub(crate) fn validate_width(width: Option<usize>) -> Result<()> {
    match width {
        Some(0) => Err(Error::invalid_argument(
            "label_width must be a positive integer",
        )),
        _ => Ok(()),
    }
}

fn validate_node_id(id: &str) -> Result<()> {
    if NODE_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "`{id}` is not a valid node name"
        )))
    }
}

fn validate_spec_name(name: &str) -> Result<()> {
    if NODE_ID_RE.is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "`{name}` is not a valid spec name"
        )))
    }
}

fn validate_label(label: &Label) -> Result<()> {
    for token in label.tokens() {
        if !braces_balanced(token) {
            return Err(Error::invalid_argument(format!(
                "label `{token}` has unbalanced braces"
            )));
        }
    }
    Ok(())
}

/// `\{` and `\}` are literal braces and do not open or close a group.
fn braces_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn rejects_duplicate_systems_without_mutation() {
        let mut diagram = Diagram::new();
        diagram
            .add_system("opt", SystemKind::Optimization, r"\text{Optimizer}")
            .unwrap();
        let err = diagram
            .add_system("opt", SystemKind::Function, "F")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier { ref id } if id == "opt"));
        assert_eq!(diagram.systems().len(), 1);
        assert_eq!(diagram.systems()[0].kind, SystemKind::Optimization);
    }

    #[test]
    fn connect_rejects_self_loops_for_any_options() {
        let mut diagram = Diagram::new();
        diagram.add_system("D1", SystemKind::Function, "D_1").unwrap();
        for stack in [false, true] {
            for faded in [false, true] {
                let options = ConnectOptions {
                    stack,
                    faded,
                    label_width: Some(2),
                    ..ConnectOptions::default()
                };
                let err = diagram.connect_with("D1", "D1", "x", options).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            }
        }
        assert!(diagram.connections().is_empty());
    }

    #[test]
    fn connect_accepts_distinct_endpoints() {
        let ids = ["a", "b", "c"];
        let mut diagram = Diagram::new();
        for src in ids {
            for target in ids {
                if src != target {
                    diagram.connect(src, target, "x").unwrap();
                }
            }
        }
        assert_eq!(diagram.connections().len(), 6);
    }

    #[test]
    fn zero_label_width_is_rejected() {
        let mut diagram = Diagram::new();
        let options = ConnectOptions {
            label_width: Some(0),
            ..ConnectOptions::default()
        };
        let err = diagram.connect_with("a", "b", "x", options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(diagram.connections().is_empty());
    }

    #[test]
    fn side_parsing() {
        assert_eq!("left".parse::<Side>().unwrap(), Side::Left);
        assert_eq!("right".parse::<Side>().unwrap(), Side::Right);
        let err = "top".parse::<Side>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn outputs_are_keyed_per_side() {
        let mut diagram = Diagram::new();
        diagram.add_output("opt", "x^*", Side::Left).unwrap();
        diagram.add_output("opt", "z^*", Side::Right).unwrap();
        diagram.add_output("opt", "y^*", Side::Left).unwrap();
        assert_eq!(diagram.left_outputs().len(), 1);
        assert_eq!(diagram.left_outputs()["opt"].label, Label::from("y^*"));
        assert_eq!(diagram.left_outputs()["opt"].node_id, "left_output_opt");
        assert_eq!(diagram.right_outputs()["opt"].node_id, "right_output_opt");
    }

    #[test]
    fn input_replacement_keeps_position() {
        let mut diagram = Diagram::new();
        diagram.add_input("D1", "P_1").unwrap();
        diagram.add_input("D2", "P_2").unwrap();
        diagram.add_input("D1", "P_3").unwrap();
        let keys: Vec<_> = diagram.inputs().keys().map(String::as_str).collect();
        assert_eq!(keys, ["D1", "D2"]);
        assert_eq!(diagram.inputs()["D1"].label, Label::from("P_3"));
        assert_eq!(diagram.inputs()["D1"].style, DataStyle::DataIo);
    }

    #[test]
    fn spec_name_defaults_to_id() {
        let mut diagram = Diagram::new();
        diagram.add_system("F", SystemKind::Function, "F").unwrap();
        let named = SystemOptions {
            spec_name: SpecName::Named("G_spec".into()),
            ..SystemOptions::default()
        };
        diagram
            .add_system_with("G", SystemKind::Function, "G", named)
            .unwrap();
        let hidden = SystemOptions {
            spec_name: SpecName::Suppressed,
            ..SystemOptions::default()
        };
        diagram
            .add_system_with("H", SystemKind::Function, "H", hidden)
            .unwrap();
        let names: Vec<_> = diagram
            .systems()
            .iter()
            .map(|s| s.spec_name.as_deref())
            .collect();
        assert_eq!(names, [Some("F"), Some("G_spec"), None]);
    }

    #[test]
    fn spec_names_are_unique() {
        let mut diagram = Diagram::new();
        diagram.add_system("F", SystemKind::Function, "F").unwrap();
        let clash = SystemOptions {
            spec_name: SpecName::Named("F".into()),
            ..SystemOptions::default()
        };
        let err = diagram
            .add_system_with("G", SystemKind::Function, "G", clash)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("system `F`"));
        assert_eq!(diagram.systems().len(), 1);

        // a default name can clash with an earlier explicit one too
        let named = SystemOptions {
            spec_name: SpecName::Named("H".into()),
            ..SystemOptions::default()
        };
        diagram
            .add_system_with("G", SystemKind::Function, "G", named)
            .unwrap();
        assert!(diagram.add_system("H", SystemKind::Function, "H").is_err());

        // suppressed systems claim no name
        let hidden = SystemOptions {
            spec_name: SpecName::Suppressed,
            ..SystemOptions::default()
        };
        diagram
            .add_system_with("K", SystemKind::Function, "K", hidden.clone())
            .unwrap();
        diagram
            .add_system_with("L", SystemKind::Function, "L", hidden)
            .unwrap();
    }

    #[test]
    fn spec_names_must_be_plain_file_names() {
        for name in ["../x", "a/b", "", "a.json", r"a\b"] {
            let mut diagram = Diagram::new();
            let options = SystemOptions {
                spec_name: SpecName::Named(name.into()),
                ..SystemOptions::default()
            };
            let err = diagram
                .add_system_with("F", SystemKind::Function, "F", options)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{name}");
            assert!(diagram.systems().is_empty());
        }
        assert!(Diagram::new().add_system("a/b", SystemKind::Function, "x").is_err());
    }

    #[test]
    fn node_names_and_labels_are_checked() {
        let mut diagram = Diagram::new();
        assert!(diagram.add_system("a.b", SystemKind::Function, "x").is_err());
        assert!(diagram.add_system("a b", SystemKind::Function, "x").is_err());
        assert!(diagram.add_system("", SystemKind::Function, "x").is_err());
        assert!(diagram.add_system("ok", SystemKind::Function, "{x").is_err());
        assert!(diagram.add_system("ok", SystemKind::Function, r"\{x").is_ok());
        assert!(diagram.connect("ok", "other", ["a", "b}"]).is_err());
    }

    #[test]
    fn style_tokens() {
        assert_eq!(SystemKind::from_token("opt"), Some(SystemKind::Optimization));
        assert_eq!(SystemKind::from_token("solver"), Some(SystemKind::Mda));
        assert_eq!(SystemKind::from_token("IGROUP"), Some(SystemKind::ImplicitGroup));
        assert_eq!(SystemKind::from_token("MDA").map(SystemKind::as_str), Some("MDA"));
        assert_eq!(SystemKind::from_token("cloud"), None);
        assert_eq!("DataIO".parse::<DataStyle>().unwrap(), DataStyle::DataIo);
    }
}
