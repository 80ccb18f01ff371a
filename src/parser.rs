use crate::error::{Error, Result};
use crate::ir::{
    ConnectOptions, DataStyle, Diagram, InputOptions, Label, OutputOptions, Side, SpecName,
    SystemKind, SystemOptions,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DescriptionFile {
    systems: Vec<SystemEntry>,
    connections: Vec<ConnectionEntry>,
    inputs: Vec<InputEntry>,
    outputs: Vec<OutputEntry>,
    processes: Vec<ProcessEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpecNameEntry {
    /// `false` suppresses the record, `true` keeps the default name.
    Enabled(bool),
    Named(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SystemEntry {
    id: String,
    style: String,
    label: Label,
    #[serde(default)]
    stack: bool,
    #[serde(default)]
    faded: bool,
    label_width: Option<usize>,
    spec_name: Option<SpecNameEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConnectionEntry {
    src: String,
    target: String,
    label: Label,
    label_width: Option<usize>,
    style: Option<String>,
    #[serde(default)]
    stack: bool,
    #[serde(default)]
    faded: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct InputEntry {
    system: String,
    label: Label,
    label_width: Option<usize>,
    style: Option<String>,
    #[serde(default)]
    stack: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OutputEntry {
    system: String,
    label: Label,
    label_width: Option<usize>,
    style: Option<String>,
    #[serde(default)]
    stack: bool,
    side: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProcessEntry {
    nodes: Vec<String>,
    #[serde(default = "default_arrow")]
    arrow: bool,
}

fn default_arrow() -> bool {
    true
}

fn data_style(style: Option<&str>, default: DataStyle) -> Result<DataStyle> {
    style.map_or(Ok(default), str::parse)
}

/// Parses a JSON5 diagram description into a [`Diagram`].
///
/// ```text
/// {
///   systems: [
///     { id: "opt", style: "opt", label: "\\text{Optimizer}" },
///     { id: "D1", style: "func", label: "D_1" },
///   ],
///   connections: [{ src: "opt", target: "D1", label: ["x", "z"] }],
///   outputs: [{ system: "D1", label: "y_1^*", side: "left" }],
///   processes: [{ nodes: ["opt", "D1", "opt"] }],
/// }
/// ```
///
/// Entries are registered in file order, so the usual builder errors apply.
pub fn parse_description(input: &str) -> Result<Diagram> {
    let file: DescriptionFile = json5::from_str(input).map_err(|err| Error::Description {
        message: err.to_string(),
    })?;
    let mut diagram = Diagram::new();

    for entry in file.systems {
        let kind: SystemKind = entry.style.parse()?;
        let spec_name = match entry.spec_name {
            None | Some(SpecNameEntry::Enabled(true)) => SpecName::Id,
            Some(SpecNameEntry::Enabled(false)) => SpecName::Suppressed,
            Some(SpecNameEntry::Named(name)) => SpecName::Named(name),
        };
        let options = SystemOptions {
            stack: entry.stack,
            faded: entry.faded,
            label_width: entry.label_width,
            spec_name,
        };
        diagram.add_system_with(&entry.id, kind, entry.label, options)?;
    }

    for entry in file.connections {
        let options = ConnectOptions {
            label_width: entry.label_width,
            style: data_style(entry.style.as_deref(), DataStyle::DataInter)?,
            stack: entry.stack,
            faded: entry.faded,
        };
        diagram.connect_with(&entry.src, &entry.target, entry.label, options)?;
    }

    for entry in file.inputs {
        let options = InputOptions {
            label_width: entry.label_width,
            style: data_style(entry.style.as_deref(), DataStyle::DataIo)?,
            stack: entry.stack,
        };
        diagram.add_input_with(&entry.system, entry.label, options)?;
    }

    for entry in file.outputs {
        let side = match entry.side.as_deref() {
            Some(side) => side.parse::<Side>()?,
            None => Side::Left,
        };
        let options = OutputOptions {
            label_width: entry.label_width,
            style: data_style(entry.style.as_deref(), DataStyle::DataIo)?,
            stack: entry.stack,
            side,
        };
        diagram.add_output_with(&entry.system, entry.label, options)?;
    }

    for entry in file.processes {
        diagram.add_process(entry.nodes, entry.arrow);
    }

    tracing::debug!(
        systems = diagram.systems().len(),
        connections = diagram.connections().len(),
        "parsed diagram description"
    );
    Ok(diagram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_small_description() {
        let input = r#"
        // comments and trailing commas are fine
        {
          systems: [
            { id: "opt", style: "opt", label: "\\text{Optimizer}" },
            { id: "D1", style: "Function", label: ["D_1", "\\text{Disc}"], stack: true },
            { id: "G", style: "func", label: "G", specName: "G_spec" },
            { id: "H", style: "ifunc", label: "H", specName: false },
          ],
          connections: [
            { src: "opt", target: "D1", label: ["x", "z", "y_2"], labelWidth: 2 },
            { src: "D1", target: "opt", label: "f", style: "DataIO", faded: true },
          ],
          inputs: [{ system: "opt", label: "x_0" }],
          outputs: [
            { system: "opt", label: "x^*", side: "right" },
            { system: "D1", label: "y^*" },
          ],
          processes: [
            { nodes: ["opt", "D1", "opt"] },
            { nodes: ["output_opt", "opt"], arrow: false },
          ],
        }
        "#;
        let diagram = parse_description(input).unwrap();
        assert_eq!(diagram.systems().len(), 4);
        assert!(diagram.systems()[1].stack);
        assert_eq!(diagram.systems()[2].spec_name.as_deref(), Some("G_spec"));
        assert_eq!(diagram.systems()[3].spec_name, None);
        assert_eq!(diagram.systems()[3].kind, SystemKind::ImplicitFunction);
        assert_eq!(diagram.connections()[0].label_width, Some(2));
        assert_eq!(diagram.connections()[1].style, DataStyle::DataIo);
        assert_eq!(diagram.inputs()["opt"].style, DataStyle::DataIo);
        assert!(diagram.right_outputs().contains_key("opt"));
        assert!(diagram.left_outputs().contains_key("D1"));
        assert!(!diagram.processes()[1].arrow);
        assert!(diagram.processes()[0].arrow);
        diagram.compile().unwrap();
    }

    #[test]
    fn bad_side_is_invalid_argument() {
        let input = r#"{ systems: [{ id: "a", style: "func", label: "a" }],
                         outputs: [{ system: "a", label: "y", side: "top" }] }"#;
        let err = parse_description(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn non_integer_width_is_rejected() {
        let input = r#"{ connections: [{ src: "a", target: "b", label: "x", labelWidth: "foobar" }] }"#;
        let err = parse_description(input).unwrap_err();
        assert!(matches!(err, Error::Description { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn self_connection_in_file() {
        let input = r#"{ connections: [{ src: "a", target: "a", label: "x" }] }"#;
        let err = parse_description(input).unwrap_err();
        assert!(matches!(err, Error::SelfConnection { .. }));
    }

    #[test]
    fn unknown_style_and_fields() {
        let input = r#"{ systems: [{ id: "a", style: "cloud", label: "a" }] }"#;
        assert_eq!(parse_description(input).unwrap_err().kind(), ErrorKind::InvalidArgument);
        let input = r#"{ systems: [], edges: [] }"#;
        assert!(matches!(parse_description(input).unwrap_err(), Error::Description { .. }));
    }
}
