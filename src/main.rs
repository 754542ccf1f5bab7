/// OSDK wizard: interactive Operator SDK project builder
///
/// Main entry point. Serves the wizard's JSON API by default, and can also run a
/// one-shot generation or a validation pass over a saved project document.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osdk_wizard::{
    config::Config,
    document::mirror,
    server::{init_tracing, start_server},
    submit::{Generator, NoDialog, PromptDialog, SaveDialog, SaveTo, SubmitError},
    validate::{FieldPath, ValidationReport},
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "osdk-wizard")]
#[command(about = "Operator SDK project wizard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the wizard API (default)
    Serve {
        /// API port
        #[arg(long)]
        port: Option<u16>,

        /// Generation service base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Where archives are written
        #[arg(long)]
        download_dir: Option<String>,
    },

    /// Submit a project document and save the generated archive
    Generate {
        /// Project document (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Save the archive here (file or directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ask for the save location on the terminal
        #[arg(long, conflicts_with = "output")]
        prompt: bool,

        /// Generation service base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Fallback directory when no save location is chosen
        #[arg(long)]
        download_dir: Option<String>,
    },

    /// Check a project document and print every field error
    Validate {
        /// Project document (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Application entry point
///
/// The server provides:
/// - Session and editor API at /api/session, /api/crds/*
/// - Generation at /api/generate
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        api_url: None,
        download_dir: None,
    }) {
        Commands::Serve {
            port,
            api_url,
            download_dir,
        } => {
            let config = Config::default().with_overrides(api_url, download_dir, port);
            start_server(config).await
        }
        Commands::Generate {
            input,
            output,
            prompt,
            api_url,
            download_dir,
        } => {
            let config = Config::default().with_overrides(api_url, download_dir, None);
            let dialog: Box<dyn SaveDialog> = match output {
                Some(path) => Box::new(SaveTo(path)),
                None if prompt => Box::new(PromptDialog),
                None => Box::new(NoDialog),
            };
            generate(&config, &input, dialog.as_ref()).await
        }
        Commands::Validate { input } => validate(&input),
    }
}

async fn generate(config: &Config, input: &Path, dialog: &dyn SaveDialog) -> Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let generator = Generator::from_config(config);
    let mut progress = generator.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let stage = *progress.borrow_and_update();
            tracing::debug!("⏳ {:?}", stage);
        }
    });

    let result = generator.generate(&text, dialog).await;
    drop(generator);
    let _ = watcher.await;

    match result {
        Ok(archive) => {
            println!("{}", archive.path.display());
            Ok(())
        }
        Err(SubmitError::Cancelled) => {
            tracing::warn!("Download cancelled by user");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn validate(input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let project = mirror::parse(&text).with_context(|| format!("{} is not a project document", input.display()))?;

    let mut failures = 0;
    for (path, error) in ValidationReport::for_project(&project, None).entries() {
        println!("{}: {}", path, error.message);
        failures += 1;
    }
    for index in 0..project.crds.len() {
        let report = ValidationReport::for_project(&project, Some(index));
        for (path, error) in report.entries() {
            if matches!(path, FieldPath::Domain | FieldPath::Repo | FieldPath::ProjectName) {
                continue;
            }
            println!("crds.{}.{}: {}", index, path, error.message);
            failures += 1;
        }
    }

    if failures > 0 {
        println!("{} error(s)", failures);
        std::process::exit(1);
    }
    println!("ok");
    Ok(())
}
