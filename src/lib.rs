mod docx;
mod error;
#[cfg(feature = "llm")]
pub mod llm;
pub mod markdown;
pub mod model;
pub mod pptx;

pub use error::Error;
pub use model::{ContentBlock, Outline, PresentationData, SlideData};

use std::path::Path;
use std::time::Instant;

/// Parse a Word document into its structured outline.
pub fn extract_outline(input: &Path) -> Result<Outline, Error> {
    docx::parse(input)
}

/// Parse an in-memory Word document into its structured outline.
pub fn extract_outline_bytes(input: &[u8]) -> Result<Outline, Error> {
    docx::parse_bytes(input)
}

/// Full deterministic pipeline: Word document → outline → Markdown →
/// `PresentationData` → templated deck at `output`.
pub fn convert_docx_to_deck(input: &Path, template: &Path, output: &Path) -> Result<(), Error> {
    let t0 = Instant::now();

    let outline = docx::parse(input)?;
    let t_parse = t0.elapsed();

    let md = markdown::to_markdown(&outline);
    let data = markdown::MarkdownParser::new().parse_str(&md);
    let t_plan = t0.elapsed();

    pptx::Generator::new(template, output)?.generate(&data)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, plan={:.1}ms, generate={:.1}ms, total={:.1}ms",
        t_parse.as_secs_f64() * 1000.0,
        (t_plan - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_plan).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
    );

    Ok(())
}

/// Generate a deck from already-authored slide Markdown.
pub fn generate_deck(input_md: &Path, template: &Path, output: &Path) -> Result<(), Error> {
    let t0 = Instant::now();

    let data = markdown::MarkdownParser::new().parse_file(input_md)?;
    let t_parse = t0.elapsed();

    pptx::Generator::new(template, output)?.generate(&data)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, generate={:.1}ms, total={:.1}ms",
        t_parse.as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
    );

    Ok(())
}
