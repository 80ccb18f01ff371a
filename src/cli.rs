use crate::config::load_config;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_description;
use crate::render::{STYLES_FILE_NAME, render_tikzpicture, write_diagram};
use crate::specs::write_sys_specs;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "xdsm", version, about = "Compile XDSM diagram descriptions to TikZ/LaTeX")]
pub struct Args {
    /// Diagram description (.json5 / .json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Base name of the generated files. Defaults to the input file stem.
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Directory receiving the generated files
    #[arg(long = "outdir", default_value = ".")]
    pub outdir: PathBuf,

    /// Config JSON file (theme, render and build options)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write the .tex/.tikz files without running LaTeX
    #[arg(long = "no-build")]
    pub no_build: bool,

    /// Keep LaTeX auxiliary files
    #[arg(long = "no-cleanup")]
    pub no_cleanup: bool,

    /// Run LaTeX in batch mode and hide its output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Print the tikzpicture to stdout instead of writing files
    #[arg(long = "stdout")]
    pub stdout: bool,

    /// Also export per-system specs as JSON into this directory
    #[arg(long = "specs")]
    pub specs: Option<PathBuf>,

    /// Dump the placed grid cells as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if args.no_build {
        config.build.build = false;
    }
    if args.no_cleanup {
        config.build.cleanup = false;
    }
    if args.quiet {
        config.build.quiet = true;
    }

    let input = read_input(args.input.as_deref())?;
    let diagram = parse_description(&input)?;
    let compiled = diagram.compile()?;

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &compiled.grid, &diagram)
            .with_context(|| format!("writing layout dump {}", path.display()))?;
    }
    if let Some(dir) = args.specs.as_deref() {
        write_sys_specs(&diagram, dir)?;
    }

    if args.stdout {
        let styles = config
            .render
            .styles_path
            .clone()
            .unwrap_or_else(|| STYLES_FILE_NAME.to_string());
        print!("{}", render_tikzpicture(&compiled, &styles, &config.render));
        return Ok(());
    }

    let name = output_name(args.output.as_deref(), args.input.as_deref())?;
    let written = write_diagram(&diagram, &name, &args.outdir, &config)?;
    if let Some(pdf) = written.pdf {
        tracing::info!(pdf = %pdf.display(), "built pdf");
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn output_name(output: Option<&str>, input: Option<&Path>) -> Result<String> {
    if let Some(name) = output {
        return Ok(name.to_string());
    }
    input
        .filter(|path| *path != Path::new("-"))
        .and_then(|path| path.file_stem())
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Output name required when reading from stdin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_falls_back_to_input_stem() {
        assert_eq!(output_name(Some("mdf"), None).unwrap(), "mdf");
        assert_eq!(
            output_name(None, Some(Path::new("cases/kitchen_sink.json5"))).unwrap(),
            "kitchen_sink"
        );
        assert!(output_name(None, Some(Path::new("-"))).is_err());
        assert!(output_name(None, None).is_err());
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "xdsm", "-i", "mdf.json5", "--outdir", "out", "--no-build", "-vv", "--specs", "specs",
        ])
        .unwrap();
        assert_eq!(args.input.as_deref(), Some(Path::new("mdf.json5")));
        assert_eq!(args.outdir, PathBuf::from("out"));
        assert!(args.no_build);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.specs.as_deref(), Some(Path::new("specs")));
    }
}
