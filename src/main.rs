//! rampart: architecture conformance and workflow engine
//!
//! Checks a component's implementation against its architecture blueprint,
//! synthesizes diagrams and capability specs, and suggests next steps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rampart::app::{self, App};
use rampart::config::ImageFormat;

#[derive(Debug, Parser)]
#[command(name = "rampart", version, about = "Architecture conformance and workflow engine")]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate an implementation against its blueprint
    Check {
        /// Component id or path to a blueprint `.json`
        target: String,

        /// Implementation root to scan instead of the component's engine
        #[arg(long)]
        engine_root: Option<PathBuf>,

        /// Report blueprint entries without code as warnings
        #[arg(long)]
        permit_unimplemented: bool,
    },

    /// Write the architecture diagrams document
    Diagram {
        target: String,

        /// Output Markdown file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum)]
        format: Option<ImageFormat>,

        /// Also render each diagram with the configured renderer
        #[arg(long)]
        render: bool,
    },

    /// Scaffold one spec document per capability
    Spec {
        target: String,

        /// Output directory for the spec files
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing specs
        #[arg(long)]
        force: bool,
    },

    /// Suggest the next workflow steps
    Next {
        /// Only consider this component
        #[arg(long)]
        component: Option<String>,

        /// Maximum number of suggestions
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Initialize logging with RUST_LOG environment variable support
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
    let app = App::new(cwd);

    match cli.command {
        Command::Check {
            target,
            engine_root,
            permit_unimplemented,
        } => {
            let outcome = app.check(&target, engine_root, permit_unimplemented)?;
            emit(cli.json, &outcome, app::format_check)?;
            let component_id = outcome.component_id;
            outcome
                .report
                .into_result()
                .with_context(|| format!("Conformance check of {component_id} failed"))?;
        }
        Command::Diagram {
            target,
            output,
            format,
            render,
        } => {
            let outcome = app.diagram(&target, output, format, render)?;
            emit(cli.json, &outcome, app::format_diagram)?;
        }
        Command::Spec {
            target,
            output,
            force,
        } => {
            let outcome = app.spec(&target, output, force)?;
            emit(cli.json, &outcome, app::format_spec)?;
        }
        Command::Next { component, limit } => {
            let outcome = app
                .next(component, limit)
                .await
                .context("Run from inside a project with an architecture/system.json catalog")?;
            emit(cli.json, &outcome, app::format_suggestions)?;
        }
    }

    Ok(())
}
