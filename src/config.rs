use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the picture and the standalone document are composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Load `sfmath` so math labels use a sans-serif font.
    pub use_sfmath: bool,
    /// Extra LaTeX packages loaded after the optional ones.
    pub extra_packages: Vec<String>,
    /// Existing style sheet to `\input` instead of the generated one.
    pub styles_path: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            use_sfmath: true,
            extra_packages: Vec::new(),
            styles_path: None,
        }
    }
}

impl RenderConfig {
    pub fn optional_packages(&self) -> Vec<String> {
        let mut packages = Vec::new();
        if self.use_sfmath {
            packages.push("sfmath".to_string());
        }
        packages.extend(self.extra_packages.iter().cloned());
        packages
    }
}

/// Options for the LaTeX build step of the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub build: bool,
    pub cleanup: bool,
    pub quiet: bool,
    pub latex_command: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build: true,
            cleanup: true,
            quiet: false,
            latex_command: "pdflatex".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub render: RenderConfig,
    pub build: BuildConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    optimization_color: Option<String>,
    sub_optimization_color: Option<String>,
    mda_color: Option<String>,
    doe_color: Option<String>,
    function_color: Option<String>,
    implicit_function_color: Option<String>,
    group_color: Option<String>,
    implicit_group_color: Option<String>,
    metamodel_color: Option<String>,
    data_inter_color: Option<String>,
    data_io_color: Option<String>,
    data_line_color: Option<String>,
    process_line_color: Option<String>,
    border_color: Option<String>,
    data_line_width: Option<f32>,
    process_line_width: Option<f32>,
    row_sep_mm: Option<f32>,
    column_sep_mm: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    use_sfmath: Option<bool>,
    extra_packages: Option<Vec<String>>,
    styles_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BuildConfigFile {
    build: Option<bool>,
    cleanup: Option<bool>,
    quiet: Option<bool>,
    latex_command: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    render: Option<RenderConfigFile>,
    build: Option<BuildConfigFile>,
}

/// Loads a camelCase JSON config file on top of the defaults. Only the keys
/// present in the file override anything.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let parsed: ConfigFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    apply_config_file(&mut config, parsed)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) -> anyhow::Result<()> {
    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme `{theme_name}`"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        let colors = [
            (vars.optimization_color, &mut theme.optimization_color),
            (vars.sub_optimization_color, &mut theme.sub_optimization_color),
            (vars.mda_color, &mut theme.mda_color),
            (vars.doe_color, &mut theme.doe_color),
            (vars.function_color, &mut theme.function_color),
            (vars.implicit_function_color, &mut theme.implicit_function_color),
            (vars.group_color, &mut theme.group_color),
            (vars.implicit_group_color, &mut theme.implicit_group_color),
            (vars.metamodel_color, &mut theme.metamodel_color),
            (vars.data_inter_color, &mut theme.data_inter_color),
            (vars.data_io_color, &mut theme.data_io_color),
            (vars.data_line_color, &mut theme.data_line_color),
            (vars.process_line_color, &mut theme.process_line_color),
            (vars.border_color, &mut theme.border_color),
        ];
        for (value, slot) in colors {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(v) = vars.data_line_width {
            theme.data_line_width = v;
        }
        if let Some(v) = vars.process_line_width {
            theme.process_line_width = v;
        }
        if let Some(v) = vars.row_sep_mm {
            theme.row_sep_mm = v;
        }
        if let Some(v) = vars.column_sep_mm {
            theme.column_sep_mm = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.use_sfmath {
            config.render.use_sfmath = v;
        }
        if let Some(v) = render.extra_packages {
            config.render.extra_packages = v;
        }
        if let Some(v) = render.styles_path {
            config.render.styles_path = Some(v);
        }
    }

    if let Some(build) = parsed.build {
        if let Some(v) = build.build {
            config.build.build = v;
        }
        if let Some(v) = build.cleanup {
            config.build.cleanup = v;
        }
        if let Some(v) = build.quiet {
            config.build.quiet = v;
        }
        if let Some(v) = build.latex_command {
            config.build.latex_command = v;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.render.optional_packages(), ["sfmath"]);
        assert_eq!(config.build.latex_command, "pdflatex");
    }

    #[test]
    fn file_overrides_only_present_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xdsm.json");
        std::fs::write(
            &path,
            r##"{
                "theme": "grayscale",
                "themeVariables": { "mdaColor": "#123456", "dataLineWidth": 3 },
                "render": { "useSfmath": false, "extraPackages": ["bm"] },
                "build": { "quiet": true }
            }"##,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.theme.mda_color, "#123456");
        assert_eq!(config.theme.optimization_color, Theme::grayscale().optimization_color);
        assert_eq!(config.theme.data_line_width, 3.0);
        assert_eq!(config.render.optional_packages(), ["bm"]);
        assert!(config.build.quiet);
        assert!(config.build.build);
        assert!(config.build.cleanup);
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let parsed: ConfigFile = serde_json::from_str(r#"{"theme": "neon"}"#).unwrap();
        let mut config = Config::default();
        assert!(apply_config_file(&mut config, parsed).is_err());
    }
}
