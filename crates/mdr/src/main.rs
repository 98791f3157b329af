//! mdr CLI - Mermaid diagram renderer for Markdown.
//!
//! Provides commands for:
//! - `render`: Render Mermaid blocks to images and rewrite documents
//! - `profile list|show|save|delete`: Manage saved render settings

mod commands;
mod error;
mod interrupt;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ProfileCommand, RenderArgs};
use output::Output;

/// mdr - render Mermaid diagrams in Markdown files.
#[derive(Parser)]
#[command(name = "mdr", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render diagrams and update Markdown files.
    Render(RenderArgs),
    /// Manage saved profiles.
    Profile(ProfileCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Profile(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
