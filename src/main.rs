use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::info;

use deckhand::config::{DeckConfig, EnvStore};
use deckhand::stack::status::ComposeStatusProvider;
use deckhand::stack::ComposeController;
use deckhand::tui::runner::{run_tui, Collaborators};

#[derive(Parser)]
#[command(name = "deckhand", about = "Terminal control plane for docker-compose stacks.")]
struct Cli {
    /// Compose file (overrides .deckhand.yaml)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Environment file edited by the wizard (overrides .deckhand.yaml)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Project directory (defaults to current)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Status poll interval in seconds (overrides .deckhand.yaml)
    #[arg(long)]
    poll_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deckhand=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dir = cli.dir.unwrap_or_else(|| PathBuf::from("."));

    let mut cfg = DeckConfig::load(&dir);
    if let Some(file) = cli.file {
        cfg.compose_file = file;
    }
    if let Some(env_file) = cli.env_file {
        cfg.env_file = env_file;
    }
    if let Some(poll_secs) = cli.poll_secs {
        cfg.poll_secs = poll_secs;
    }

    // Paths are resolved relative to the project directory.
    let compose_file = dir.join(&cfg.compose_file);
    let env_file = dir.join(&cfg.env_file);

    info!(
        "deckhand starting: compose={} env={}",
        compose_file.display(),
        env_file.display()
    );

    let deps = Collaborators {
        controller: Arc::new(ComposeController::new(
            compose_file.clone(),
            Some(dir.clone()),
        )),
        provider: Arc::new(ComposeStatusProvider::new(compose_file, Some(dir))),
        store: Arc::new(Mutex::new(EnvStore::new(env_file.clone()))),
        env_file,
    };

    run_tui(deps, cfg.poll_secs).await
}
