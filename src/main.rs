use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use page_bridge::FakePage;
use value_store::{JsonFileBackend, MemoryBackend, ValueStore};
use versekeeper_cli::{AutosaveRuntime, KeeperConfig};

#[derive(Parser)]
#[command(name = "versekeeper", version, about = "Per-workspace autosave for the song-creation form")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scripted session against the in-memory page and print the
    /// resulting store contents.
    Demo {
        /// Workspace id the scripted navigation switches to.
        #[arg(long, default_value = "demo")]
        wid: String,
        /// Persist to the JSON store on disk instead of memory.
        #[arg(long)]
        persist: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = KeeperConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Demo { wid, persist } => demo(config, &wid, persist).await,
    }
}

async fn demo(config: KeeperConfig, wid: &str, persist: bool) -> Result<()> {
    // Tighten the timings so the scripted session finishes quickly.
    let config = KeeperConfig {
        debounce_ms: 50,
        title_debounce_ms: 50,
        coalesce_ms: 50,
        url_poll_ms: 100,
        sticky_interval_ms: 20,
        ..config
    };

    let page = Arc::new(FakePage::new("https://suno.com/create"));
    let root = page.add_block(None);
    let lyrics = page.add_textarea(Some(root), Some("Write some lyrics..."), None);
    let style = page.add_textarea(Some(root), None, Some(1000));
    let title = page.add_input(Some(root), Some("Song Title (Optional)"));
    let desc_row = page.add_block(Some(root));
    page.add_text(Some(desc_row), "Song Description");
    page.add_textarea(Some(desc_row), None, None);

    let memory = Arc::new(MemoryBackend::new());
    let store = if persist {
        let path = config.store_path();
        info!(path = %path.display(), "using JSON store");
        ValueStore::new(Arc::new(JsonFileBackend::open(&path).await?))
    } else {
        ValueStore::new(memory.clone())
    };

    let runtime = AutosaveRuntime::new(page.clone(), store, &config);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(runtime.run(cancel.clone()));

    // Startup rescan inserts the lyrics default.
    sleep(Duration::from_millis(400)).await;
    info!(lyrics = ?page.value_of(lyrics), "after startup");

    page.user_type(style, "dream pop, airy vocals");
    page.user_type(title, "Night Drive");
    sleep(Duration::from_millis(300)).await;

    info!(wid, "switching workspace");
    page.navigate(format!("https://suno.com/create?wid={wid}"));
    sleep(Duration::from_millis(400)).await;

    page.user_type(lyrics, "city lights roll by");
    sleep(Duration::from_millis(300)).await;

    page.begin_unload();
    sleep(Duration::from_millis(100)).await;

    cancel.cancel();
    let _ = task.await;

    if !persist {
        let mut entries: Vec<_> = memory.snapshot().into_iter().collect();
        entries.sort();
        for (key, value) in entries {
            info!(%key, %value, "stored");
        }
    }
    Ok(())
}
