//! Replay binary: feed a recorded notification log through the indexer
//! and dump the resulting state as JSON.
//!
//! `ORACLE_EVENTS` points at an NDJSON file of `OracleEvent`s in block
//! order; `ORACLE_FIXTURES` (optional) at a JSON `FixtureGateway` serving
//! the external query answers. Missing fixtures simply revert, which the
//! handlers degrade around.

use std::fs;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use oracle_graph::{FixtureGateway, IndexerConfig, OracleEvent, OracleIndexer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_max_level(Level::INFO)
        .init();

    let events_path =
        std::env::var("ORACLE_EVENTS").context("ORACLE_EVENTS must point at an NDJSON event log")?;
    let raw_events = fs::read_to_string(&events_path)
        .with_context(|| format!("reading event log {events_path}"))?;

    let gateway = match std::env::var("ORACLE_FIXTURES") {
        Ok(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading fixtures {path}"))?;
            serde_json::from_str::<FixtureGateway>(&raw)
                .with_context(|| format!("parsing fixtures {path}"))?
        }
        Err(_) => {
            warn!("ORACLE_FIXTURES not set; every external query will revert");
            FixtureGateway::default()
        }
    };

    let (tx, rx) = mpsc::channel(256);
    let indexer = OracleIndexer::new(IndexerConfig::from_env(), gateway);
    let handle = tokio::spawn(indexer.run(rx));

    let mut fed = 0usize;
    for (lineno, line) in raw_events.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: OracleEvent = serde_json::from_str(line)
            .with_context(|| format!("{events_path}:{} is not a valid event", lineno + 1))?;
        tx.send(event).await.context("indexer stopped early")?;
        fed += 1;
    }
    drop(tx);

    let store = handle.await.context("indexer task panicked")?;
    info!("replay complete | events={fed}");

    println!("{}", serde_json::to_string_pretty(&store)?);
    Ok(())
}
