use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use slidesmith::markdown::{self, MarkdownParser};
use slidesmith::pptx::{Generator, template::create_demo_template};
use slidesmith::{Error, Outline};

#[derive(Parser)]
#[command(
    name = "slidesmith",
    version,
    about = "Turn Word reports into templated PowerPoint decks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: Word document to finished deck
    Convert {
        /// Input Word document (.docx)
        input: PathBuf,
        /// Deck template; the starter template is created here when missing
        #[arg(short, long, env = "SLIDESMITH_TEMPLATE", default_value = "template.pptx")]
        template: PathBuf,
        /// Output deck path (defaults to the input with a .pptx extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Restructure the content with the configured language model
        #[arg(long)]
        llm: bool,
    },
    /// Extract the document outline as JSON
    Extract {
        input: PathBuf,
        /// Output JSON path (defaults to the input with a .json extension)
        #[arg(short, long)]
        json: Option<PathBuf>,
    },
    /// Produce slide Markdown from a Word document or outline JSON
    Markdown {
        input: PathBuf,
        /// Output Markdown path (defaults to the input with a .md extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Restructure the content with the configured language model
        #[arg(long)]
        llm: bool,
    },
    /// Generate a deck from slide Markdown
    Generate {
        input: PathBuf,
        #[arg(short, long, env = "SLIDESMITH_TEMPLATE", default_value = "template.pptx")]
        template: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the built-in 4-slide starter template
    Template { output: PathBuf },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run(Cli::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Convert {
            input,
            template,
            output,
            llm,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("pptx"));
            ensure_template(&template)?;
            let outline = slidesmith::extract_outline(&input)?;
            let md = markdown_for(&outline, llm);
            let data = MarkdownParser::new().parse_str(&md);
            Generator::new(&template, &output)?.generate(&data)?;
            Ok(())
        }
        Command::Extract { input, json } => {
            let json = json.unwrap_or_else(|| input.with_extension("json"));
            slidesmith::extract_outline(&input)?.save_json(&json)?;
            Ok(())
        }
        Command::Markdown { input, output, llm } => {
            let output = output.unwrap_or_else(|| input.with_extension("md"));
            let outline = load_outline(&input)?;
            let md = markdown_for(&outline, llm);
            std::fs::write(&output, md)?;
            log::info!("Markdown written to {}", output.display());
            Ok(())
        }
        Command::Generate {
            input,
            template,
            output,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("pptx"));
            ensure_template(&template)?;
            slidesmith::generate_deck(&input, &template, &output)
        }
        Command::Template { output } => create_demo_template(&output),
    }
}

fn ensure_template(template: &Path) -> Result<(), Error> {
    if !template.exists() {
        log::info!(
            "Template {} not found, generating the starter template",
            template.display()
        );
        create_demo_template(template)?;
    }
    Ok(())
}

/// A .json input is read back as a saved outline; anything else is
/// parsed as a Word document.
fn load_outline(input: &Path) -> Result<Outline, Error> {
    if input.extension().is_some_and(|ext| ext == "json") {
        let content = std::fs::read_to_string(input)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        slidesmith::extract_outline(input)
    }
}

#[cfg(feature = "llm")]
fn markdown_for(outline: &Outline, llm: bool) -> String {
    if llm {
        match slidesmith::llm::LlmClient::from_env()
            .and_then(|client| client.restructure_outline(outline))
        {
            Ok(md) => return md,
            Err(e) => log::warn!("LLM restructuring unavailable ({e}), using direct conversion"),
        }
    }
    markdown::to_markdown(outline)
}

#[cfg(not(feature = "llm"))]
fn markdown_for(outline: &Outline, llm: bool) -> String {
    if llm {
        log::warn!("Built without the llm feature, using direct conversion");
    }
    markdown::to_markdown(outline)
}
