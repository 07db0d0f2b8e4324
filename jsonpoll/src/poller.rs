use crate::config::{Config, ModuleConfig};
use http_json::{CollectorError, Event, Fetcher, JsonCollector};
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};

#[derive(thiserror::Error, Debug)]
pub enum PollerError {
    #[error("invalid module #{index}: {reason}")]
    InvalidModule { index: usize, reason: String },
    #[error("could not write event: {0}")]
    Output(#[from] std::io::Error),
    #[error("{failed} of {total} endpoints failed")]
    CycleFailed { failed: usize, total: usize },
}

/// A collector together with its schedule.
pub struct Scheduled {
    pub collector: JsonCollector,
    pub period: Duration,
}

/// Line written to stdout for every event.
#[derive(Serialize)]
struct OutputLine<'a> {
    endpoint: &'a str,
    event: &'a Event,
}

/// Builds one collector per configured host. All collectors share a single
/// fetcher and therefore a single connection pool.
pub fn build_collectors(config: &Config) -> Result<Vec<Scheduled>, PollerError> {
    let fetcher = Fetcher::new();
    let mut scheduled = Vec::new();

    for (index, module) in config.modules.iter().enumerate() {
        scheduled.extend(build_module(index, module, &fetcher)?);
    }

    Ok(scheduled)
}

fn build_module(
    index: usize,
    module: &ModuleConfig,
    fetcher: &Fetcher,
) -> Result<Vec<Scheduled>, PollerError> {
    let invalid = |reason: String| PollerError::InvalidModule { index, reason };
    let fetch_config = module
        .json
        .clone()
        .validate()
        .map_err(|e| invalid(e.to_string()))?;

    module
        .hosts
        .iter()
        .map(|host| {
            let url = http_json::resolve_endpoint(host, module.path.as_deref())
                .map_err(|e| invalid(e.to_string()))?;
            Ok(Scheduled {
                collector: JsonCollector::with_fetcher(
                    url,
                    fetch_config.clone(),
                    module.timeout(),
                    fetcher.clone(),
                ),
                period: module.period(),
            })
        })
        .collect()
}

/// Polls every collector on its own schedule until `shutdown` resolves.
pub async fn run<F>(scheduled: Vec<Scheduled>, shutdown: F) -> Result<(), PollerError>
where
    F: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::channel::<(String, Event)>(64);
    let mut tasks = JoinSet::new();

    for Scheduled { collector, period } in scheduled {
        let tx = tx.clone();
        tasks.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                // Errors are logged and counted by the collector itself
                if let Ok(event) = collector.fetch().await
                    && tx.send((collector.url().to_string(), event)).await.is_err()
                {
                    return;
                }
            }
        });
    }
    drop(tx);

    tokio::pin!(shutdown);
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
            received = rx.recv() => match received {
                Some((endpoint, event)) => write_event(&mut stdout, &endpoint, &event).await?,
                None => break,
            },
        }
    }

    tasks.abort_all();
    Ok(())
}

/// Runs a single cycle for every collector and writes the events.
pub async fn run_once(scheduled: Vec<Scheduled>) -> Result<(), PollerError> {
    let total = scheduled.len();
    let mut tasks = JoinSet::new();

    for Scheduled { collector, .. } in scheduled {
        tasks.spawn(async move {
            let result = collector.fetch().await;
            (collector.url().to_string(), result)
        });
    }

    let mut results: Vec<(String, Result<Event, CollectorError>)> = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!("Task panicked: {}", e),
        }
    }

    let mut stdout = tokio::io::stdout();
    let mut failed = total - results.len();
    for (endpoint, result) in &results {
        match result {
            Ok(event) => write_event(&mut stdout, endpoint, event).await?,
            Err(_) => failed += 1,
        }
    }

    if failed > 0 {
        return Err(PollerError::CycleFailed { failed, total });
    }
    Ok(())
}

async fn write_event(
    out: &mut (impl AsyncWrite + Unpin),
    endpoint: &str,
    event: &Event,
) -> Result<(), PollerError> {
    let mut line =
        serde_json::to_vec(&OutputLine { endpoint, event }).map_err(std::io::Error::from)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}
