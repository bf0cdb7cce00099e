//! `spinlog play`: load a game, spin, save the ledger.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::adapters::{
    BrowserOptions, CsvLedgerStore, HttpPageFetcher, MockSlotMachine, StaticPageFetcher,
    WebDriverClient,
};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Catalog, Config, GameTarget, Provider};
use crate::domain::ports::{Automation, PageFetcher};
use crate::services::statistics::LedgerStats;
use crate::services::{stop_channel, SessionSettings, SlotSession, SpinSummary};

/// Frame served to dry runs of games that embed one.
const DEMO_FRAME: &str = "/demo/frame.html";

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Game name (falls back to `game` from the configuration)
    pub game: Option<String>,

    /// Game provider: igt or aristocrat
    #[arg(short, long)]
    pub provider: Option<Provider>,

    /// Number of rounds to play (plays until interrupted when omitted)
    #[arg(short = 'n', long)]
    pub spins: Option<u64>,

    /// Run the browser with a visible window
    #[arg(long)]
    pub show_browser: bool,

    /// Keep game audio on
    #[arg(long)]
    pub sound: bool,

    /// Stop instead of reloading when the balance runs out
    #[arg(long)]
    pub no_restore: bool,

    /// Replay free rounds inside one recorded round
    #[arg(long, value_name = "BOOL")]
    pub free_rounds: Option<bool>,

    /// CSV file the ledger is written to
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Drive a built-in simulated machine instead of a browser
    #[arg(long)]
    pub dry_run: bool,
}

impl PlayArgs {
    /// Fold command-line overrides into `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(game) = &self.game {
            config.game = Some(game.clone());
        }
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if self.show_browser {
            config.headless = false;
        }
        if self.sound {
            config.sound = true;
        }
        if self.no_restore {
            config.restore_balance = false;
        }
        if self.free_rounds.is_some() {
            config.free_rounds = self.free_rounds;
        }
        if let Some(path) = &self.output {
            config.output.path = path.display().to_string();
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlayOutput {
    pub session: String,
    pub game: String,
    pub provider: Provider,
    pub rounds: u64,
    pub cancelled: bool,
    pub balance: Option<Decimal>,
    pub rtp: Option<f64>,
    pub ledger: String,
}

impl CommandOutput for PlayOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Played {} round(s) of {} ({}){}",
            self.rounds,
            self.game,
            self.provider,
            if self.cancelled { ", stopped early" } else { "" }
        )];
        if let Some(balance) = self.balance {
            lines.push(format!("  Balance: {balance}"));
        }
        if let Some(rtp) = self.rtp {
            lines.push(format!("  RTP:     {:.2}%", rtp * 100.0));
        }
        lines.push(format!("  Ledger:  {}", self.ledger));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: PlayArgs, mut config: Config, json_mode: bool) -> Result<()> {
    args.apply(&mut config);

    let game = config
        .game
        .clone()
        .context("no game given; pass one or set `game` in the configuration")?;
    let catalog = Catalog::new(config.catalog.aristocrat.clone());
    let target = catalog.resolve(&game, config.provider)?;

    let (driver, fetcher) = if args.dry_run {
        dry_run_backends(&target)
    } else {
        browser_backends(&config).await?
    };
    let store = Arc::new(CsvLedgerStore::new(&config.output.path, config.output.header));

    let (stop, signal) = stop_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current poll");
            stop.stop();
        }
    });

    let mut session = SlotSession::builder(target.clone(), driver, store)
        .settings(SessionSettings::from_config(&config))
        .fetcher(fetcher)
        .stop_signal(signal)
        .build()?;
    info!(session = %session.id(), game = %target.name, "session created");

    // fatal errors come back after the session has already closed and saved
    let summary = match session.load().await {
        Ok(()) => session.spin(args.spins).await?,
        Err(err) if err.is_cancellation() => SpinSummary {
            completed: 0,
            cancelled: true,
        },
        Err(err) => return Err(err).context(format!("could not play {game}")),
    };

    save_and_close(&mut session).await?;

    let stats = LedgerStats::from_records(session.records());
    let result = PlayOutput {
        session: session.id().to_string(),
        game: target.name,
        provider: target.provider,
        rounds: summary.completed,
        cancelled: summary.cancelled,
        balance: session.ledger().last().map(|record| record.balance),
        rtp: stats.rtp,
        ledger: config.output.path.clone(),
    };
    output(&result, json_mode);
    Ok(())
}

/// Flush the ledger and release the browser. A failed write is reported
/// only after the browser has been released.
async fn save_and_close(session: &mut SlotSession) -> Result<()> {
    let saved = session.save();
    if let Err(err) = &saved {
        error!(error = %err, "ledger flush failed, closing browser anyway");
    }
    session.close().await?;
    saved.context("failed to write the ledger")
}

async fn browser_backends(config: &Config) -> Result<(Arc<dyn Automation>, Arc<dyn PageFetcher>)> {
    let options = BrowserOptions::from_config(&config.webdriver, config.headless);
    let client = WebDriverClient::connect(&config.webdriver.url, &options)
        .await
        .with_context(|| format!("cannot reach WebDriver at {}", config.webdriver.url))?;
    let fetcher = HttpPageFetcher::new(config.timeouts.load())?;
    Ok((Arc::new(client), Arc::new(fetcher)))
}

fn dry_run_backends(target: &GameTarget) -> (Arc<dyn Automation>, Arc<dyn PageFetcher>) {
    let fetcher = StaticPageFetcher::new().with_page(
        target.address.clone(),
        format!(r#"<html><body><iframe src="{DEMO_FRAME}"></iframe></body></html>"#),
    );
    (
        Arc::new(MockSlotMachine::demo(target.provider)),
        Arc::new(fetcher),
    )
}
