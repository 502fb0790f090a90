//! Ignition CLI - reactive notebook scheduler.

mod check;
mod colors;
mod graph;
mod notebook_file;
mod run;
mod runner;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ignition")]
#[command(about = "Reactive notebook scheduler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which cells can run and why the others cannot
    Check {
        /// Path to the notebook (.json file)
        notebook: String,
    },

    /// Run a notebook until every cell is up to date
    Run {
        /// Path to the notebook (.json file)
        notebook: String,

        /// Give up after this many ticks
        #[arg(long)]
        max_ticks: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the dependency graph as JSON
    Graph {
        /// Path to the notebook (.json file)
        notebook: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Check { notebook } => check::execute(&notebook)?,

        Commands::Run {
            notebook,
            max_ticks,
            json,
        } => run::execute(&notebook, max_ticks, json).await?,

        Commands::Graph { notebook } => graph::execute(&notebook)?,
    }

    Ok(())
}

/// Print the header for a command.
fn print_header(action: &str, notebook_path: &str) {
    println!(
        "\n{}Ignition{} - {} {}{}{}",
        colors::BOLD,
        colors::RESET,
        action,
        colors::CYAN,
        notebook_file::notebook_name(notebook_path),
        colors::RESET
    );
    println!("{}", "─".repeat(50));
}
