use crate::config::{BuildConfig, Config, RenderConfig};
use crate::error::{Error, Result, ToolStatus};
use crate::ir::Diagram;
use crate::layout::CompiledDiagram;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name of the generated style sheet written next to the diagram.
pub const STYLES_FILE_NAME: &str = "diagram_styles.tikz";

const TIKZ_LIBRARIES: &str = "arrows,chains,positioning,scopes,shapes.geometric,shapes.misc,shadows";
const BASE_PACKAGES: [&str; 5] = ["geometry", "amsfonts", "amsmath", "amssymb", "tikz"];
const AUX_EXTENSIONS: [&str; 4] = ["aux", "fdb_latexmk", "fls", "log"];

/// Builds the `tikzpicture` environment around the compiled fragments.
///
/// The output can be `\input` from any document that loads the packages and
/// TikZ libraries listed in its leading comment block.
pub fn render_tikzpicture(compiled: &CompiledDiagram, styles_path: &str, config: &RenderConfig) -> String {
    let packages = config.optional_packages();
    let mut out = String::new();

    out.push_str("\n%%% Preamble Requirements %%%\n");
    for package in BASE_PACKAGES {
        out.push_str(&format!("% \\usepackage{{{package}}}\n"));
    }
    if !packages.is_empty() {
        out.push_str("\n% Optional packages such as sfmath set through the diagram config\n");
        out.push_str(&format!("% \\usepackage{{{}}}\n", packages.join(",")));
    }
    out.push_str(&format!("\n% \\usetikzlibrary{{{TIKZ_LIBRARIES}}}\n"));
    out.push_str("\n%%% End Preamble Requirements %%%\n\n");

    out.push_str(&format!("\\input{{\"{}\"}}\n", tex_path(styles_path)));
    out.push_str("\\begin{tikzpicture}\n\n");
    out.push_str("\\matrix[MatrixSetup]{\n");
    out.push_str(&compiled.nodes);
    out.push_str("};\n\n");
    out.push_str("% XDSM process chains\n");
    out.push_str(&compiled.process);
    out.push_str("\n\n\\begin{pgfonlayer}{data}\n\\path\n");
    out.push_str(&compiled.edges);
    out.push_str("\n\\end{pgfonlayer}\n\n\\end{tikzpicture}\n");
    out
}

/// Standalone `article` that `\input`s the picture file and crops the page
/// tightly around it.
pub fn render_tex_document(tikz_file_name: &str, config: &RenderConfig) -> String {
    let packages = config.optional_packages();
    let mut out = String::new();

    out.push_str(&format!(
        "\n% XDSM diagram created with xdsm-tikz {}.\n",
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str("\\documentclass{article}\n");
    for package in BASE_PACKAGES {
        out.push_str(&format!("\\usepackage{{{package}}}\n"));
    }
    if !packages.is_empty() {
        out.push_str("\n% Optional packages such as sfmath set through the diagram config\n");
        out.push_str(&format!("\\usepackage{{{}}}\n", packages.join(",")));
    }
    out.push_str(&format!("\n\\usetikzlibrary{{{TIKZ_LIBRARIES}}}\n\n"));
    out.push_str("% Crop the page to the diagram\n");
    out.push_str("\\usepackage[active,tightpage]{preview}\n");
    out.push_str("\\PreviewEnvironment{tikzpicture}\n");
    out.push_str("\\setlength{\\PreviewBorder}{5pt}\n\n");
    out.push_str("\\begin{document}\n\n");
    out.push_str(&format!("\\input{{\"{}\"}}\n\n", tex_path(tikz_file_name)));
    out.push_str("\\end{document}\n");
    out
}

/// LaTeX wants forward slashes even on Windows.
fn tex_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Paths produced by [`write_diagram`].
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub tikz: PathBuf,
    pub tex: PathBuf,
    pub styles: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
}

/// Compiles `diagram` and writes `<name>.tikz` and `<name>.tex` into `outdir`,
/// plus the generated style sheet unless the config names one. With
/// `config.build.build` set, runs LaTeX once in `outdir`.
///
/// Nothing is written when compilation fails.
pub fn write_diagram(diagram: &Diagram, name: &str, outdir: &Path, config: &Config) -> Result<WrittenFiles> {
    let compiled = diagram.compile()?;
    fs::create_dir_all(outdir)?;

    let (styles_ref, styles) = match &config.render.styles_path {
        Some(path) => (path.clone(), None),
        None => {
            let path = outdir.join(STYLES_FILE_NAME);
            fs::write(&path, config.theme.styles_tikz())?;
            (STYLES_FILE_NAME.to_string(), Some(path))
        }
    };

    let tikz_name = format!("{name}.tikz");
    let tikz = outdir.join(&tikz_name);
    fs::write(&tikz, render_tikzpicture(&compiled, &styles_ref, &config.render))?;

    let tex = outdir.join(format!("{name}.tex"));
    fs::write(&tex, render_tex_document(&tikz_name, &config.render))?;
    tracing::info!(tikz = %tikz.display(), tex = %tex.display(), "wrote xdsm diagram");

    let pdf = if config.build.build {
        build_pdf(name, outdir, &config.build)?;
        Some(outdir.join(format!("{name}.pdf")))
    } else {
        None
    };

    Ok(WrittenFiles {
        tikz,
        tex,
        styles,
        pdf,
    })
}

/// Runs the configured LaTeX command on `<outdir>/<name>.tex`.
///
/// A command that cannot start or exits unsuccessfully is reported as
/// [`Error::ExternalTool`]; it is not retried.
pub fn build_pdf(name: &str, outdir: &Path, config: &BuildConfig) -> Result<()> {
    let interaction = if config.quiet {
        "-interaction=batchmode"
    } else {
        "-interaction=nonstopmode"
    };
    let tex_file = format!("{name}.tex");
    let mut command = Command::new(&config.latex_command);
    command
        .current_dir(outdir)
        .arg("-halt-on-error")
        .arg(interaction)
        .arg(&tex_file);
    let rendered = format!(
        "{} -halt-on-error {interaction} {tex_file}",
        config.latex_command
    );
    tracing::info!(command = %rendered, dir = %outdir.display(), "building pdf");

    let result = if config.quiet {
        command.output().map(|output| output.status)
    } else {
        command.status()
    };
    let status = result.map_err(|err| Error::ExternalTool {
        command: rendered.clone(),
        status: ToolStatus::Spawn(err),
    })?;
    if !status.success() {
        return Err(Error::ExternalTool {
            command: rendered,
            status: ToolStatus::Exit(status),
        });
    }

    if config.cleanup {
        for ext in AUX_EXTENSIONS {
            let path = outdir.join(format!("{name}.{ext}"));
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
    }
    Ok(())
}
