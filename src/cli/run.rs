//! `adscout run`
//!
//! Publishes a start intent, streams every bus event to stdout as JSON and
//! exits once the batch finished. Ctrl-C publishes a stop intent.

use std::time::Duration;

use adscout_core::{kinds, EventJournal, Intent};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::{load_config, App};

const JOURNAL_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(keywords: Vec<String>, country: Option<String>) -> Result<()> {
    let config = load_config()?;
    let App {
        bus,
        store,
        orchestrator,
    } = App::build(&config).await?;

    let journal = EventJournal::new(store.clone()).spawn(&bus, CancellationToken::new());
    let observer = bus.subscribe(config.bus.subscriber_capacity);
    let listener = orchestrator.spawn_listener().await?;

    info!(keywords = keywords.len(), "Submitting run");
    bus.publish(Intent::StartRun { keywords, country });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stop_sent = false;

    loop {
        tokio::select! {
            res = &mut ctrl_c, if !stop_sent => {
                res.context("Failed to listen for Ctrl-C")?;
                warn!("Interrupted, stopping after the current keyword");
                bus.publish(Intent::StopRun);
                stop_sent = true;
            }
            next = observer.recv_timeout(config.orchestrator.poll_timeout()) => {
                let Some(event) = next else { continue };
                println!("{}", serde_json::to_string(&event)?);
                if event.kind() == kinds::JOB_FINISHED {
                    break;
                }
            }
        }
    }

    orchestrator.shutdown(true).await;
    if let Err(e) = listener.await {
        warn!(error = %e, "Intent listener task failed");
    }

    // the journal drains its backlog once the bus is gone
    drop(orchestrator);
    drop(bus);
    match tokio::time::timeout(JOURNAL_FLUSH_TIMEOUT, journal).await {
        Ok(Ok(exit)) => info!(exit = ?exit, "Event journal flushed"),
        Ok(Err(e)) => warn!(error = %e, "Event journal task failed"),
        Err(_) => warn!("Event journal did not flush in time"),
    }

    store.close().await;
    Ok(())
}
