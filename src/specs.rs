use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::ir::{Diagram, Label};

/// Every data token flowing into and out of one system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemSpec {
    pub inputs: BTreeSet<String>,
    pub outputs: BTreeSet<String>,
}

fn collect(label: &Label, into: &mut BTreeSet<String>) {
    into.extend(
        label
            .tokens()
            .filter(|token| !token.is_empty())
            .map(str::to_string),
    );
}

fn spec_mut<'a>(
    specs: &'a mut BTreeMap<String, SystemSpec>,
    system: &str,
    context: &str,
) -> Result<&'a mut SystemSpec> {
    specs
        .get_mut(system)
        .ok_or_else(|| Error::unknown_reference(system, context))
}

/// Aggregates spec records keyed by spec name. Systems whose spec name is
/// suppressed are left out.
pub fn build_sys_specs(diagram: &Diagram) -> Result<BTreeMap<String, SystemSpec>> {
    let mut by_system: BTreeMap<String, SystemSpec> = diagram
        .systems()
        .iter()
        .map(|system| (system.id.clone(), SystemSpec::default()))
        .collect();

    for (system, input) in diagram.inputs() {
        collect(&input.label, &mut spec_mut(&mut by_system, system, "input")?.inputs);
    }
    for conn in diagram.connections() {
        let context = format!("connection `{}`", conn.node_id());
        collect(&conn.label, &mut spec_mut(&mut by_system, &conn.target, &context)?.inputs);
        collect(&conn.label, &mut spec_mut(&mut by_system, &conn.src, &context)?.outputs);
    }
    for (system, output) in diagram.outputs() {
        collect(&output.label, &mut spec_mut(&mut by_system, system, "output")?.outputs);
    }

    let mut specs = BTreeMap::new();
    for system in diagram.systems() {
        let Some(name) = &system.spec_name else {
            continue;
        };
        if let Some(spec) = by_system.remove(&system.id) {
            specs.insert(name.clone(), spec);
        }
    }
    Ok(specs)
}

/// Writes one `<spec name>.json` per exported system into `dir`, creating it
/// when missing.
pub fn write_sys_specs(diagram: &Diagram, dir: &Path) -> Result<()> {
    let specs = build_sys_specs(diagram)?;
    fs::create_dir_all(dir)?;
    for (name, spec) in &specs {
        let path = dir.join(format!("{name}.json"));
        let json = serde_json::to_string_pretty(spec)?;
        fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "wrote system spec");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Side, SpecName, SystemKind, SystemOptions};

    fn sample() -> Diagram {
        let mut diagram = Diagram::new();
        diagram.add_system("opt", SystemKind::Optimization, "O").unwrap();
        diagram.add_system("D1", SystemKind::Function, "D_1").unwrap();
        let renamed = SystemOptions {
            spec_name: SpecName::Named("D2_spec".into()),
            ..SystemOptions::default()
        };
        diagram
            .add_system_with("D2", SystemKind::Function, "D_2", renamed)
            .unwrap();
        let hidden = SystemOptions {
            spec_name: SpecName::Suppressed,
            ..SystemOptions::default()
        };
        diagram
            .add_system_with("F", SystemKind::Function, "F", hidden)
            .unwrap();
        diagram.connect("opt", "D1", ["x", "z", ""]).unwrap();
        diagram.connect("opt", "D2", "z").unwrap();
        diagram.connect("D1", "D2", "y_1").unwrap();
        diagram.connect("D2", "opt", "f").unwrap();
        diagram.add_input("D1", "P_1").unwrap();
        diagram.add_output("opt", "x^*", Side::Left).unwrap();
        diagram.add_output("opt", "x^*", Side::Right).unwrap();
        diagram
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn aggregates_inputs_and_outputs() {
        let specs = build_sys_specs(&sample()).unwrap();
        assert_eq!(specs.keys().collect::<Vec<_>>(), ["D1", "D2_spec", "opt"]);

        assert_eq!(specs["opt"].inputs, set(&["f"]));
        assert_eq!(specs["opt"].outputs, set(&["x", "z", "x^*"]));
        assert_eq!(specs["D1"].inputs, set(&["x", "z", "P_1"]));
        assert_eq!(specs["D1"].outputs, set(&["y_1"]));
        assert_eq!(specs["D2_spec"].inputs, set(&["z", "y_1"]));
        assert_eq!(specs["D2_spec"].outputs, set(&["f"]));
    }

    #[test]
    fn export_is_repeatable() {
        let diagram = sample();
        assert_eq!(build_sys_specs(&diagram).unwrap(), build_sys_specs(&diagram).unwrap());
    }

    #[test]
    fn unknown_system_is_reported() {
        let mut diagram = sample();
        diagram.connect("opt", "ghost", "x").unwrap();
        let err = build_sys_specs(&diagram).unwrap_err();
        assert!(matches!(err, Error::UnknownReference { ref id, .. } if id == "ghost"));
    }

    #[test]
    fn every_exported_system_keeps_its_own_record() {
        let mut diagram = Diagram::new();
        diagram.add_system("F", SystemKind::Function, "F").unwrap();
        let clash = SystemOptions {
            spec_name: SpecName::Named("F".into()),
            ..SystemOptions::default()
        };
        assert!(
            diagram
                .add_system_with("G", SystemKind::Function, "G", clash)
                .is_err()
        );
        diagram.add_system("G", SystemKind::Function, "G").unwrap();
        diagram.connect("F", "G", "y").unwrap();

        let specs = build_sys_specs(&diagram).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs["F"].outputs, set(&["y"]));
        assert_eq!(specs["G"].inputs, set(&["y"]));
    }

    #[test]
    fn writes_one_file_per_exported_system() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("specs");
        write_sys_specs(&sample(), &out).unwrap();

        assert!(out.join("opt.json").is_file());
        assert!(out.join("D2_spec.json").is_file());
        assert!(!out.join("F.json").exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("D1.json")).unwrap()).unwrap();
        let inputs: BTreeSet<String> = json["inputs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(inputs, set(&["x", "z", "P_1"]));
    }
}
