//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::AppConfig;
use crate::engine::{ChannelNotifier, LoadOutcome, PaginationEngine, ViewEvent};
use crate::error::{Error, Result};
use crate::model::{PictureSize, UserRecord};
use crate::store::build_store;
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Browse { pages } => self.browse(*pages).await,
            Commands::Refresh => self.refresh().await,
            Commands::Cached => self.cached().await,
            Commands::Show { index } => self.show(*index).await,
            Commands::Stats => self.stats().await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<AppConfig> {
        match &self.cli.config {
            Some(path) => AppConfig::from_file(path),
            None => Ok(AppConfig::default()),
        }
    }

    /// Bootstrap from the cache and page until `pages` pages are loaded
    async fn browse(&self, pages: usize) -> Result<()> {
        let mut session = Session::open(&self.load_config()?)?;

        let outcome = session.engine.load_cached().await;
        session.settle(outcome)?;

        let target = pages.saturating_mul(session.engine.page_size());
        while session.engine.len() < target {
            let outcome = session.engine.load_more().await;
            if session.settle(outcome)?.received() == 0 {
                debug!("Source exhausted at {} users", session.engine.len());
                break;
            }
        }

        self.print_users(&session.engine.records());
        Ok(())
    }

    /// Reset the session and show the new first page
    async fn refresh(&self) -> Result<()> {
        let config = self.load_config()?;
        let mut session = Session::open(&config)?;

        session.engine.refresh(config.engine.refresh_delay()).await;
        session.drain();
        session.wait_for_data().await?;

        self.print_users(&session.engine.records());
        Ok(())
    }

    /// Show the cache without touching the network
    async fn cached(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;
        let store = build_store(&config.store)?;
        let records = store.read_all().await?;
        debug!("Read {} users from {} store", records.len(), store.name());
        self.print_users(&records);
        Ok(())
    }

    /// Show the user at `index`, paging forward until it is loaded
    async fn show(&self, index: usize) -> Result<()> {
        let mut session = Session::open(&self.load_config()?)?;

        let outcome = session.engine.load_cached().await;
        session.settle(outcome)?;
        while session.engine.len() <= index {
            let outcome = session.engine.load_more().await;
            if session.settle(outcome)?.received() == 0 {
                break;
            }
        }

        let record = session.engine.record(index).ok_or_else(|| {
            Error::Other(format!(
                "No user at index {index}, only {} available",
                session.engine.len()
            ))
        })?;

        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(&record).unwrap_or_default());
            }
            OutputFormat::Pretty => print!("{}", render_detail(index, &record)),
        }
        Ok(())
    }

    /// Load the first page and print paging diagnostics
    async fn stats(&self) -> Result<()> {
        let mut session = Session::open(&self.load_config()?)?;

        let outcome = session.engine.load_initial().await;
        session.settle(outcome)?;

        let engine = &session.engine;
        let stats = engine.stats();
        match self.cli.format {
            OutputFormat::Json => {
                let value = json!({
                    "seed": engine.seed(),
                    "page_size": engine.page_size(),
                    "records": engine.len(),
                    "next_page": engine.next_page(),
                    "current_max_users": engine.current_max_users(),
                    "distinct_named_people": engine.number_of_distinct_named_people(),
                    "pages_fetched": stats.pages_fetched,
                    "errors": stats.errors,
                });
                println!("{value}");
            }
            OutputFormat::Pretty => {
                println!("Seed:                  {}", engine.seed());
                println!("Page size:             {}", engine.page_size());
                println!("Records:               {}", engine.len());
                println!("Next page:             {}", engine.next_page());
                println!("Current max users:     {}", engine.current_max_users());
                println!(
                    "Distinct named people: {}",
                    engine.number_of_distinct_named_people()
                );
                println!("Pages fetched:         {}", stats.pages_fetched);
            }
        }
        Ok(())
    }

    fn print_users(&self, records: &[UserRecord]) {
        match self.cli.format {
            OutputFormat::Json => {
                for record in records {
                    println!("{}", serde_json::to_string(record).unwrap_or_default());
                }
            }
            OutputFormat::Pretty => print!("{}", render_table(records)),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Engine plus the receiving end of its notifications
struct Session {
    engine: PaginationEngine,
    events: UnboundedReceiver<ViewEvent>,
    _notifier: Arc<ChannelNotifier>,
}

impl Session {
    fn open(config: &AppConfig) -> Result<Self> {
        let engine = PaginationEngine::from_config(config)?;
        let (notifier, events) = ChannelNotifier::new();
        engine.inject(&notifier);
        Ok(Self {
            engine,
            events,
            _notifier: notifier,
        })
    }

    /// Handle queued events: complete data tokens, print non-fatal errors
    fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ViewEvent::DataAvailable(ready) => ready.done(),
                ViewEvent::Error(message) => eprintln!("Warning: {message}"),
                ViewEvent::RefreshStarting | ViewEvent::PagingEnded => {}
            }
        }
    }

    /// Turn a failed load into an error; anything else passes through
    fn settle(&mut self, outcome: LoadOutcome) -> Result<LoadOutcome> {
        if let LoadOutcome::Failed { message } = outcome {
            // the matching error event would repeat `message`
            while self.events.try_recv().is_ok() {}
            return Err(Error::Other(message));
        }
        self.drain();
        Ok(outcome)
    }

    /// Wait for the reload scheduled by a refresh
    async fn wait_for_data(&mut self) -> Result<()> {
        while let Some(event) = self.events.recv().await {
            match event {
                ViewEvent::DataAvailable(ready) => {
                    ready.done();
                    return Ok(());
                }
                ViewEvent::Error(message) => return Err(Error::Other(message)),
                ViewEvent::RefreshStarting | ViewEvent::PagingEnded => {}
            }
        }
        Err(Error::Other("Notification channel closed".to_string()))
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render_table(records: &[UserRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:<28} {:<8} EMAIL", "#", "NAME", "GENDER");
    for (index, record) in records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<28} {:<8} {}",
            index,
            record.full_name(),
            record.gender.to_string(),
            record.email
        );
    }
    let _ = writeln!(out, "{} user(s)", records.len());
    out
}

fn render_detail(index: usize, record: &UserRecord) -> String {
    let indent = |text: String| {
        text.lines()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut out = String::new();
    let _ = writeln!(out, "#{index} {} {}", record.name.title, record.full_name());
    let _ = writeln!(out, "Gender: {}", record.gender);
    let _ = writeln!(out, "Contact:\n{}", indent(record.accessibilities()));
    let _ = writeln!(out, "Location:\n{}", indent(record.expanded_location()));
    let _ = writeln!(out, "Picture: {}", record.picture(PictureSize::Large));
    out
}
