//! Compile XDSM (eXtended Design Structure Matrix) diagrams to TikZ.
//!
//! Build a [`Diagram`] from systems, connections, inputs, outputs and process
//! chains, then [`Diagram::compile`] it into the grid, edge and process
//! fragments, or hand it to [`render::write_diagram`] for `.tikz`/`.tex`
//! files and an optional PDF build.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod specs;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use error::{Error, ErrorKind, Result};
pub use ir::{
    ConnectOptions, DataStyle, Diagram, InputOptions, Label, OutputOptions, Side, SpecName,
    SystemKind, SystemOptions,
};
pub use layout::{CompiledDiagram, GridLayout, NodeKind, compile_diagram, compute_grid};
pub use parser::parse_description;
pub use render::{render_tex_document, render_tikzpicture, write_diagram};
pub use specs::{SystemSpec, build_sys_specs, write_sys_specs};
pub use theme::Theme;
