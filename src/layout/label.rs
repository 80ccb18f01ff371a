use crate::error::Result;
use crate::ir::{Label, validate_width};

/// Renders a label as inline math.
///
/// Text labels become a single `$...$` expression. Fragment labels are stacked
/// one per line in a centred array, or, with `width`, grouped `width` at a time
/// and joined with `", "` before stacking.
pub fn format_label(label: &Label, width: Option<usize>) -> Result<String> {
    validate_width(width)?;
    let lines = match label {
        Label::Text(text) => return Ok(format!("${text}$")),
        Label::Lines(fragments) => match width {
            None => fragments.clone(),
            Some(width) => chunk_fragments(fragments, width),
        },
    };
    Ok(format!(
        r"$\begin{{array}}{{c}}{}\end{{array}}$",
        lines.join(r" \\ ")
    ))
}

fn chunk_fragments(fragments: &[String], width: usize) -> Vec<String> {
    fragments.chunks(width).map(|chunk| chunk.join(", ")).collect()
}
