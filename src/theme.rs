use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::ir::SystemKind;

/// Colours and line widths of the generated TikZ style sheet. Colours are
/// six-digit HTML hex codes (with or without a leading `#`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub optimization_color: String,
    pub sub_optimization_color: String,
    pub mda_color: String,
    pub doe_color: String,
    pub function_color: String,
    pub implicit_function_color: String,
    pub group_color: String,
    pub implicit_group_color: String,
    pub metamodel_color: String,
    pub data_inter_color: String,
    pub data_io_color: String,
    pub data_line_color: String,
    pub process_line_color: String,
    pub border_color: String,
    pub data_line_width: f32,
    pub process_line_width: f32,
    pub row_sep_mm: f32,
    pub column_sep_mm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::xdsm_default()
    }
}

impl Theme {
    pub fn xdsm_default() -> Self {
        Self {
            optimization_color: "#99CCFF".to_string(),
            sub_optimization_color: "#CCE5FF".to_string(),
            mda_color: "#FFCC99".to_string(),
            doe_color: "#D6EAF8".to_string(),
            function_color: "#99FF99".to_string(),
            implicit_function_color: "#CCFFCC".to_string(),
            group_color: "#FFCCFF".to_string(),
            implicit_group_color: "#FFE5FF".to_string(),
            metamodel_color: "#FFFF99".to_string(),
            data_inter_color: "#E5E5E5".to_string(),
            data_io_color: "#F2F2F2".to_string(),
            data_line_color: "#CCCCCC".to_string(),
            process_line_color: "#000000".to_string(),
            border_color: "#000000".to_string(),
            data_line_width: 5.0,
            process_line_width: 1.0,
            row_sep_mm: 3.0,
            column_sep_mm: 2.0,
        }
    }

    /// Print-friendly palette with no hue, distinguishing node kinds by shade.
    pub fn grayscale() -> Self {
        Self {
            optimization_color: "#BFBFBF".to_string(),
            sub_optimization_color: "#D9D9D9".to_string(),
            mda_color: "#A6A6A6".to_string(),
            doe_color: "#CCCCCC".to_string(),
            function_color: "#E6E6E6".to_string(),
            implicit_function_color: "#F2F2F2".to_string(),
            group_color: "#B3B3B3".to_string(),
            implicit_group_color: "#D0D0D0".to_string(),
            metamodel_color: "#C4C4C4".to_string(),
            data_inter_color: "#FFFFFF".to_string(),
            data_io_color: "#FFFFFF".to_string(),
            data_line_color: "#999999".to_string(),
            ..Self::xdsm_default()
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" | "xdsm" => Some(Self::xdsm_default()),
            "grayscale" | "greyscale" => Some(Self::grayscale()),
            _ => None,
        }
    }

    fn system_color(&self, kind: SystemKind) -> &str {
        match kind {
            SystemKind::Optimization => &self.optimization_color,
            SystemKind::SubOptimization => &self.sub_optimization_color,
            SystemKind::Mda => &self.mda_color,
            SystemKind::Doe => &self.doe_color,
            SystemKind::Function => &self.function_color,
            SystemKind::ImplicitFunction => &self.implicit_function_color,
            SystemKind::Group => &self.group_color,
            SystemKind::ImplicitGroup => &self.implicit_group_color,
            SystemKind::Metamodel => &self.metamodel_color,
        }
    }

    /// The `diagram_styles` file `\input` by every generated picture: colour
    /// definitions, pgf layers and one TikZ style per node/edge style name
    /// the compiler emits.
    pub fn styles_tikz(&self) -> String {
        let mut out = String::from("% XDSM diagram styles\n\n");

        for kind in SystemKind::ALL {
            define_color(&mut out, &color_name(kind.as_str()), self.system_color(kind));
        }
        define_color(&mut out, "datainter", &self.data_inter_color);
        define_color(&mut out, "dataio", &self.data_io_color);
        define_color(&mut out, "dataline", &self.data_line_color);
        define_color(&mut out, "processline", &self.process_line_color);
        define_color(&mut out, "xdsmborder", &self.border_color);

        out.push_str(
            "\n\\pgfdeclarelayer{data}\n\\pgfdeclarelayer{process}\n\\pgfsetlayers{data,process,main}\n\n",
        );

        out.push_str("\\tikzset{\n");
        let _ = writeln!(
            out,
            "  MatrixSetup/.style={{row sep={}mm, column sep={}mm}},",
            self.row_sep_mm, self.column_sep_mm
        );
        out.push_str(
            "  DiagonalNode/.style={draw=xdsmborder, thick, minimum height=1cm, minimum width=2cm, inner sep=2mm, align=center},\n",
        );
        for kind in SystemKind::ALL {
            let _ = writeln!(
                out,
                "  {}/.style={{DiagonalNode, {}, fill={}}},",
                kind.as_str(),
                system_shape(kind),
                color_name(kind.as_str())
            );
        }
        out.push_str(
            "  DataInter/.style={draw=xdsmborder, thin, fill=datainter, trapezium, trapezium left angle=70, trapezium right angle=-70, align=center},\n",
        );
        out.push_str(
            "  DataIO/.style={draw=xdsmborder, thin, fill=dataio, trapezium, trapezium left angle=70, trapezium right angle=-70, align=center},\n",
        );
        out.push_str("  stack/.style={double copy shadow={shadow xshift=-0.5mm, shadow yshift=-0.5mm}},\n");
        out.push_str("  faded/.style={draw opacity=0.3, fill opacity=0.3, text opacity=0.3},\n");
        let _ = writeln!(
            out,
            "  DataLine/.style={{color=dataline, line width={}pt, line join=round}},",
            self.data_line_width
        );
        let _ = writeln!(
            out,
            "  ProcessHV/.style={{-, color=processline, line width={}pt, to path={{-| (\\tikztotarget)}}}},",
            self.process_line_width
        );
        let _ = writeln!(
            out,
            "  ProcessHVA/.style={{->, color=processline, line width={}pt, to path={{-| (\\tikztotarget)}}}},",
            self.process_line_width
        );
        let _ = writeln!(
            out,
            "  ProcessTip/.style={{-, color=processline, line width={}pt, shorten >=0.5mm}},",
            self.process_line_width
        );
        let _ = writeln!(
            out,
            "  ProcessTipA/.style={{->, color=processline, line width={}pt, shorten >=0.5mm}},",
            self.process_line_width
        );
        out.push_str("}\n");
        out
    }
}

fn system_shape(kind: SystemKind) -> &'static str {
    match kind {
        SystemKind::Optimization | SystemKind::SubOptimization | SystemKind::Doe => {
            "rounded corners=3mm"
        }
        SystemKind::Mda => "chamfered rectangle, chamfered rectangle xsep=2mm",
        SystemKind::Function | SystemKind::Group | SystemKind::Metamodel => "rectangle",
        SystemKind::ImplicitFunction | SystemKind::ImplicitGroup => {
            "rectangle, rounded corners=1mm"
        }
    }
}

fn color_name(style: &str) -> String {
    format!("{}color", style.to_ascii_lowercase())
}

fn define_color(out: &mut String, name: &str, hex: &str) {
    let hex = hex.trim().trim_start_matches('#').to_ascii_uppercase();
    let _ = writeln!(out, "\\definecolor{{{name}}}{{HTML}}{{{hex}}}");
}
