//! # Railnav CLI
//!
//! Command-line interface for the railnav library.
//! Builds a transit network diagram, syncs it with the path-finding backend
//! and animates a route over it.

use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use railnav::{
    AnimationConfig, AnimatorState, BackendClient, BackendConfig, LayoutConfig, Session, Submission,
    SyncOutcome, DEFAULT_ENDPOINT,
};
use tokio_util::sync::CancellationToken;

mod cli;

/// Command-line interface for railnav
#[derive(Parser, Debug)]
#[command(name = "railnav")]
#[command(about = "Multimodal transit network diagrams with backend route search")]
#[command(long_about = "Builds a metro/bus/rail network diagram and syncs it with the path-finding backend:
  railnav network.txt                          # Build, sync, print layout and isolated zones
  railnav network.txt --route '1-[metro]->2'   # Also highlight a route hop by hop
  railnav network.txt --start 1 --target 4     # Ask the backend for a route and highlight it
  railnav - --offline                          # Read stdin, skip the backend

Network format:
  n m / 3 sensitivities / 3x3 transfer matrix / n station transfers /
  m edges of `u v mode base_time load` (mode: 0 metro, 1 bus, 2 rail)")]
#[command(version = env!("RAILNAV_VERSION"))]
struct Cli {
    /// Network description file, or "-" for stdin
    input: String,

    /// Route to highlight, e.g. "1-[metro]->2 2-[bus]->3"
    #[arg(long)]
    route: Option<String>,

    /// Start station of a route search
    #[arg(long)]
    start: Option<u32>,

    /// Target station of a route search
    #[arg(long)]
    target: Option<u32>,

    /// Route-weight coefficient sent with a route search
    #[arg(long)]
    k: Option<f64>,

    /// Backend endpoint accepting `POST {"input": ...}`
    #[arg(long, env = "RAILNAV_BACKEND", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Give up on the backend after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retry attempts when the backend is unreachable
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Skip the backend entirely
    #[arg(long, conflicts_with_all = ["start", "target"])]
    offline: bool,

    /// Print the backend input instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Print the session as JSON
    #[arg(long)]
    json: bool,

    /// Milliseconds between highlighted hops
    #[arg(long, default_value_t = 700)]
    interval_ms: u64,

    /// Canvas width
    #[arg(long, default_value_t = 900.0)]
    width: f64,

    /// Canvas height
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            timeout: self.timeout_secs.map(Duration::from_secs),
            max_retries: self.retries,
            ..BackendConfig::with_endpoint(&self.endpoint)
        }
    }

    fn layout_config(&self) -> LayoutConfig {
        LayoutConfig::with_canvas(self.width, self.height)
    }

    fn animation_config(&self) -> AnimationConfig {
        AnimationConfig {
            interval: Duration::from_millis(self.interval_ms),
        }
    }

    fn wants_route_search(&self) -> bool {
        self.start.is_some() || self.target.is_some()
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read network from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read network from {input}"))
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🚇 Railnav v{} starting...", env!("RAILNAV_VERSION"));
    }

    let text = read_input(&cli.input)?;
    let mut session = Session::new(cli.layout_config());
    if let Some(route) = &cli.route {
        session.set_route_input(route.as_str());
    }

    let submission = if cli.wants_route_search() {
        session.find_route(&text, cli.start, cli.target, cli.k)?
    } else {
        Some(session.build(&text)?)
    };

    let Some(submission) = submission else {
        bail!("{}", session.status());
    };

    if cli.dry_run {
        eprintln!("🔍 [DRY RUN] Would send to {}:", cli.endpoint);
        println!("{}", submission.input);
        return Ok(());
    }

    if cli.offline {
        info!("Offline mode, backend sync skipped");
    } else {
        sync_with_backend(&mut session, &cli, &submission).await;
    }

    if !session.route_input().is_empty() && !matches!(session.animator_state(), AnimatorState::Running { .. }) {
        session.start_highlight()?;
    }

    let final_state = animate(&mut session, &cli).await;

    if cli.json {
        println!("{}", cli::report::render_json(&session)?);
    } else {
        print!("{}", cli::render_text(&session));
    }

    if let Some(AnimatorState::Failed(e)) = final_state {
        bail!("{e}");
    }

    Ok(())
}

/// Send the submission and report the outcome on stderr
async fn sync_with_backend(session: &mut Session, cli: &Cli, submission: &Submission) {
    let client = BackendClient::with_config(cli.backend_config());
    let spinner = cli::create_spinner(&format!("🌐 Syncing with {}", cli.endpoint));

    let outcome = session.sync(&client, submission).await;
    spinner.finish_and_clear();

    match outcome {
        SyncOutcome::Synced { route: Some(route), .. } => eprintln!("🧭 Backend route: {route}"),
        SyncOutcome::Synced { route: None, .. } => {}
        SyncOutcome::Failed(e) => eprintln!("⚠️  {e}"),
        SyncOutcome::Stale => {}
    }
}

/// Run the highlight animation if one is pending; Ctrl-C clears it
async fn animate(session: &mut Session, cli: &Cli) -> Option<AnimatorState> {
    let AnimatorState::Running { total, .. } = *session.animator_state() else {
        return None;
    };

    let progress = cli::ProgressManager::new(total as u64, &format!("✨ Highlighting {total} hops"));

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let state = session
        .animate(&cli.animation_config(), &cancel, |event| progress.record(event))
        .await;
    ctrl_c.abort();

    if state == AnimatorState::Idle {
        progress.pb.abandon_with_message("Highlight cleared");
    }
    Some(state)
}
