// ABOUTME: Command line entry point for rendering and checking documents
// ABOUTME: Sets up logging and configuration, then dispatches to a subcommand

use std::panic;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use parallax::{ParallaxConfig, commands};
use parallax_logging::{LoggingConfig, error, info, init_logging};

#[derive(Debug, Parser)]
#[command(name = "parallax", version, about = "Live preview for markdown documents with embedded components")]
struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the rendered preview as HTML
    Render { file: PathBuf },
    /// Print the source line to preview offset table
    Anchors { file: PathBuf },
    /// Report compile and render errors
    Check { file: PathBuf },
}

fn setup_logging(config: &LoggingConfig, verbosity: u8) -> Result<()> {
    init_logging(config.clone(), verbosity)
        .context("Failed to initialize parallax logging")?;
    info!("Parallax logging system initialized");
    Ok(())
}

fn install_panic_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
        let payload = info.payload();
        let panic_message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        error!(
            panic_message = %panic_message,
            location = ?location,
            thread = ?std::thread::current().name(),
            "Application panic occurred"
        );
        default_hook(info);
    }));
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ParallaxConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    setup_logging(&config.logging, cli.verbose)?;
    install_panic_handler();
    let config = config.sanitized();
    info!(config_path = ?cli.config, "Configuration loaded");

    match cli.command {
        Command::Render { file } => {
            let raw = read_document(&file)?;
            let output = commands::render(&raw, &config).await?;
            println!("{}", output.html);
        }
        Command::Anchors { file } => {
            let raw = read_document(&file)?;
            let table = commands::anchors(&raw, &config).await?;
            print!("{}", commands::format_anchors(&table));
        }
        Command::Check { file } => {
            let raw = read_document(&file)?;
            let report = commands::check(&raw, &config);
            if !report.is_ok() {
                for line in report.diagnostics() {
                    eprintln!("{}: {line}", file.display());
                }
                return Ok(ExitCode::FAILURE);
            }
            info!(file = %file.display(), "Document is valid");
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    run(cli).await
}
