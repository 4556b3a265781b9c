//! Weft CLI
//!
//! Headless driver for the CSS parser and the layout engine.

mod report;
mod tree;

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use weft_css::Stylesheet;
use weft_layout::{DisplayList, Document, EngineConfig, Rect};

use report::TeeSink;
use tree::TreeDescription;

/// Weft: CSS cascade and float-aware box layout from the command line
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # List the rules of a stylesheet
    weft parse site.css

    # Dump them as JSON
    weft parse site.css --json

    # Lay out a box tree 640px wide
    weft layout --tree page.json --css site.css --width 640

    # Show every diagnostic as it is reported
    RUST_LOG=weft=debug weft layout --tree page.json
"#)]
struct Cli {
    /// Engine configuration (JSON); missing fields take their defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a stylesheet and print its rules
    Parse {
        /// Stylesheet to parse
        #[arg(value_name = "FILE")]
        css: PathBuf,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Build a document from a box tree description, lay it out and paint it
    Layout {
        /// Box tree description (JSON)
        #[arg(long, value_name = "FILE")]
        tree: PathBuf,

        /// Stylesheet merged before the tree is built
        #[arg(long, value_name = "FILE")]
        css: Option<PathBuf>,

        /// Viewport width
        #[arg(long, default_value = "800")]
        width: f32,

        /// Viewport height
        #[arg(long, default_value = "600")]
        height: f32,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let sink = Rc::new(TeeSink::new());

    match cli.command {
        Command::Parse { css, json } => {
            let text = read(&css)?;
            let stylesheet = Stylesheet::parse_with(&text, &config.parser_limits, &*sink);
            if json {
                println!("{}", serde_json::to_string_pretty(&report::stylesheet_json(&stylesheet))?);
            } else {
                report::print_stylesheet(&stylesheet);
            }
        }
        Command::Layout {
            tree,
            css,
            width,
            height,
            json,
        } => {
            let description = TreeDescription::from_json(&read(&tree)?)?;
            let mut document = Document::with_sink(config, Box::new(Rc::clone(&sink)));
            if let Some(path) = css {
                document.merge_stylesheet(&read(&path)?);
            }
            let root = description.build(&mut document)?;
            let outcome = document.layout(width, height)?;
            log::debug!(target: "weft::cli", "laid out {root:?}: {outcome:?}");

            let mut list = DisplayList::new();
            document.render(Rect::new(0.0, 0.0, width, height), false, false, &mut list)?;
            if json {
                let value = report::layout_json(&document, &outcome, &list);
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                report::print_layout(&document, &outcome, &list);
            }
        }
    }

    report::print_diagnostics(&sink.collected.diagnostics());
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    serde_json::from_str(&read(path)?).with_context(|| format!("parsing config {}", path.display()))
}
