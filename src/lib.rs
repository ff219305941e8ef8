pub mod content;
pub mod error;
pub mod messages;
pub mod page;
pub mod popup;
pub mod reconciler;
pub mod runtime;
pub mod settings;
pub mod similarity;
pub mod timer;
pub mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

pub use content::{ContentScript, ContentScriptOptions};
pub use error::ExtensionError;
pub use messages::{Message, Response};
pub use page::{MemoryPage, Page, StatusBadge};
pub use popup::{Popup, SettingsForm};
pub use reconciler::{reconcile, OperatingState, PassContext, PassOutcome, PassReport};
pub use runtime::ExtensionRuntime;
pub use settings::{Configuration, SettingsStore, StorageChange};
pub use timer::{TimerController, TimerMode, TimerState};

/// Run one reconciliation pass over a saved page snapshot.
#[derive(Parser, Debug)]
#[command(name = "ytfocus")]
#[command(about = "Dry-run the focus filter against a page snapshot")]
#[command(version)]
struct Cli {
    /// Page snapshot (JSON)
    #[arg(short, long)]
    page: PathBuf,

    /// Settings file; defaults apply when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Allow-list term, replaces the stored list (repeatable)
    #[arg(short, long = "allow")]
    allow: Vec<String>,

    /// Similarity threshold override
    #[arg(short, long)]
    threshold: Option<f64>,
}

pub fn run() -> Result<()> {
    utils::logging::init();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(dry_run(cli))
}

async fn dry_run(cli: Cli) -> Result<()> {
    let store = match &cli.settings {
        Some(path) => SettingsStore::new(path.clone())?,
        None => SettingsStore::in_memory(),
    };
    // Overrides apply to this pass only and are never written back.
    let mut config = store.get().await;
    if !cli.allow.is_empty() {
        config.allow_list_terms = cli.allow;
    }
    if let Some(threshold) = cli.threshold {
        config.similarity_threshold = threshold;
    }

    let mut page = MemoryPage::load(&cli.page)?;
    log::info!("Reconciling {} against {:?}", cli.page.display(), config.allow_list_terms);

    page.install_status_badge();
    let report = reconcile(&mut page, &PassContext::from_config(&config));
    let json = serde_json::to_string_pretty(&report)?;
    println!("{json}");
    Ok(())
}
