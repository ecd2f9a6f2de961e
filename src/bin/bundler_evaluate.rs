//! # Bundler Evaluate
//!
//! Runs one bundling request through the full pipeline against the in-process
//! straight-line planner. Reads a JSON `BundlingRequest` on stdin and writes
//! the JSON `BundlingResult` to stdout.
//!
//! ```bash
//! echo '{"sender":"robot-1","start":{"x":0,"y":0},
//!        "candidates":[{"target":{"x":5,"y":0}}],
//!        "max_bundle_size":1,"max_bundles":1}' | bundler-evaluate --pretty
//! ```

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bundler_core::config::ConfigManager;
use bundler_core::logging::init_structured_logging;
use bundler_core::models::{BundlingRequest, BundlingResult};
use bundler_core::oracle::LocalPathPlanner;
use bundler_core::orchestration::{BundlingService, ReplyDestination, ResultConsumer};
use clap::Parser;
use parking_lot::Mutex;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::info;

#[derive(Parser)]
#[command(name = "bundler-evaluate")]
#[command(about = "Compute the best task bundles for one request read from stdin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (default: $BUNDLER_CONFIG or config/bundler.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override how many trailing committed tasks may be reordered
    #[arg(long)]
    permute_last: Option<usize>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

/// Hands the first delivered result to a oneshot channel
struct OneshotReply(Mutex<Option<oneshot::Sender<Arc<BundlingResult>>>>);

#[async_trait]
impl ResultConsumer for OneshotReply {
    async fn deliver(&self, result: Arc<BundlingResult>) -> bundler_core::Result<()> {
        if let Some(sender) = self.0.lock().take() {
            // The receiver only goes away if main already gave up
            let _ = sender.send(result);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_structured_logging();

    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from_file(path)?,
        None => ConfigManager::load()?,
    };
    let mut config = manager.config().clone();
    if let Some(tail) = cli.permute_last {
        config.search.permute_last_committed = tail;
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read request from stdin")?;
    let request: BundlingRequest =
        serde_json::from_str(&input).context("stdin is not a valid bundling request")?;

    let (sender, receiver) = oneshot::channel();
    let reply = ReplyDestination::new(Arc::new(OneshotReply(Mutex::new(Some(sender)))));
    let request = request.with_reply_to(reply);
    info!(request_id = %request.id, sender = %request.sender, "Evaluating request");

    let service = BundlingService::start(&config, Arc::new(LocalPathPlanner::new()))?;
    service.submit(request)?;

    // Generous bound: every ordering may take up to the planner timeout
    let wait = config.planner.path_plan_timeout().saturating_mul(10);
    let outcome = tokio::time::timeout(wait, receiver).await;
    let status = service.status();
    service.shutdown(Duration::from_secs(5)).await?;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(_)) | Err(_) => {
            return Err(anyhow!("no result produced for request (worker status: {status})"))
        }
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&*result)?
    } else {
        serde_json::to_string(&*result)?
    };
    println!("{json}");
    Ok(())
}
