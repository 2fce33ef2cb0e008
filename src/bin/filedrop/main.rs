//! Command-line client for a filedrop server.
//!
//! Usage:
//!   filedrop [--config FILE] [--base-url URL] ls
//!   filedrop put <FILE>...
//!   filedrop get <NAME> [-o PATH]
//!   filedrop rm <NAME> [--yes]

mod bars;
mod cli;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;

use bars::UploadBars;
use clap::Parser;
use cli::{Cli, Commands};
use filedrop::{Config, Controller, Result, UploadFile};
use terminal::TerminalNotifier;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{EnvFilter, fmt};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "filedrop=debug"
    } else {
        "filedrop=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).await?,
        None => Config::load_default().await?,
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(permissions) = &cli.permissions {
        config.set_permissions(permissions);
    }
    if let Some(proxy) = &cli.proxy {
        config.proxy = Some(proxy.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.root_cause());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).await?;
    let assume_yes = matches!(cli.command, Commands::Rm { yes: true, .. });
    let notifier = TerminalNotifier::new(config.notice_timeout, assume_yes);
    let store = config.store()?;
    let controller = Controller::new(Arc::new(store), Arc::new(notifier));

    let result = match cli.command {
        Commands::Ls => list(&controller).await,
        Commands::Put { files } => put(&controller, files).await,
        Commands::Get { name, output } => get(&controller, &name, output).await,
        Commands::Rm { name, .. } => {
            if !controller.delete(&name).await? {
                eprintln!("Not deleted");
            }
            Ok(())
        }
    };
    controller.shutdown().await;
    result
}

async fn list(controller: &Controller) -> Result<()> {
    controller.refresh().await?;
    let files = controller.files().await?;
    if files.is_empty() {
        eprintln!("No files");
    }
    for file in files {
        println!("{}\t{}", file.name, file.url);
    }
    Ok(())
}

async fn put(controller: &Controller, paths: Vec<std::path::PathBuf>) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(UploadFile::from_path(&path).await?);
    }

    let bars = UploadBars::spawn(controller.uploads().clone());
    let result = controller.upload(files).await;
    bars.stop();

    let report = result?;
    for entry in report.uploaded {
        println!("{}", entry.url);
    }
    Ok(())
}

async fn get(
    controller: &Controller,
    name: &str,
    output: Option<std::path::PathBuf>,
) -> Result<()> {
    let content = controller.download(name).await?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, &content).await?;
            eprintln!("Saved {} ({} bytes) to {}", name, content.len(), path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&content).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
