use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::time::{Duration, sleep};

use marshal_core::app::{DispatcherBuilder, WorkerGroup};
use marshal_core::config::MarshalConfig;
use marshal_core::domain::{ActionMessage, Application};
use marshal_core::impls::{InMemoryAppStore, InMemoryQueue, LoggingProvisioner};
use marshal_core::observability::init_logging;
use marshal_core::ports::{MessageQueue, QueueCounts};

/// Run the action worker against a fixture of applications and messages.
#[derive(Debug, Parser)]
#[command(name = "marshal", version, about)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with `apps` and `messages`.
    #[arg(long)]
    fixture: PathBuf,

    /// Overrides `[worker] workers`.
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    apps: Vec<Application>,
    #[serde(default)]
    messages: Vec<ActionMessage>,
}

fn load_fixture(path: &Path) -> Result<Fixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing fixture {}", path.display()))
}

fn drained(counts: &QueueCounts, total: usize) -> bool {
    counts.ready == 0 && counts.leased == 0 && counts.delayed == 0 && counts.acked >= total
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MarshalConfig::load(path)?,
        None => MarshalConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.worker.workers = workers;
    }
    config.validate()?;
    init_logging(config.logging.format);

    let fixture = load_fixture(&args.fixture)?;
    let total = fixture.messages.len();

    let store = Arc::new(InMemoryAppStore::with_apps(fixture.apps));
    let dispatcher = DispatcherBuilder::new(store, Arc::new(LoggingProvisioner))
        .config(config.dispatcher.clone())
        .build()?;

    let queue = InMemoryQueue::new();
    for message in fixture.messages {
        let id = queue.enqueue(message).await?;
        tracing::debug!(message_id = %id, "enqueued");
    }
    tracing::info!(messages = total, "fixture loaded");

    let group = WorkerGroup::spawn(
        config.worker.workers,
        Arc::new(queue.clone()),
        Arc::new(dispatcher),
        config.worker.retry_policy(),
        config.worker.max_visits,
    );

    // queue が空になるか ctrl-c まで待つ
    let wait_drained = async {
        loop {
            match queue.counts().await {
                Ok(counts) if drained(&counts, total) => break,
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "failed to read queue counts"),
            }
            sleep(Duration::from_millis(50)).await;
        }
    };
    tokio::select! {
        _ = wait_drained => tracing::info!("queue drained"),
        res = tokio::signal::ctrl_c() => {
            res.context("waiting for ctrl-c")?;
            tracing::info!("interrupted");
        }
    }

    group.shutdown_and_join().await;

    let counts = queue.counts().await?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_overrides() {
        let args = Args::parse_from(["marshal", "--fixture", "f.json", "--workers", "4"]);
        assert_eq!(args.fixture, PathBuf::from("f.json"));
        assert_eq!(args.workers, Some(4));
        assert!(args.config.is_none());
    }

    #[test]
    fn fixture_parses_apps_and_messages() {
        let fixture: Fixture = serde_json::from_str(
            r#"{
                "apps": [{"name": "nemesis", "status": "started",
                          "units": [{"name": "nemesis/0", "status": "started"}]}],
                "messages": [{"action": "start-app", "args": ["nemesis"]}]
            }"#,
        )
        .unwrap();
        assert_eq!(fixture.apps[0].units.len(), 1);
        assert_eq!(fixture.messages[0].app_name(), Some("nemesis"));
    }

    #[test]
    fn drained_requires_everything_settled() {
        let settled = QueueCounts { acked: 2, ..QueueCounts::default() };
        assert!(drained(&settled, 2));
        let delayed = QueueCounts { delayed: 1, acked: 1, ..QueueCounts::default() };
        assert!(!drained(&delayed, 2));
    }
}
