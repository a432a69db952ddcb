//! ==============================================================================
//! store.rs - snapshot store (latest row + insert subscription)
//! ==============================================================================
//!
//! purpose:
//!     the dashboard's only view of the remote `sensor_readings` table.
//!     - fetch_latest: one-shot read of the newest row over the rest api
//!     - subscribe_inserts: live delivery of new rows until cancelled
//!
//! how rows arrive:
//!     ┌──────────────────┐  POST /api/readings  ┌───────────┐
//!     │ database webhook │ ───────────────────> │  publish  │──┐
//!     └──────────────────┘                      └───────────┘  │ broadcast
//!     ┌──────────────────┐  every N seconds     ┌───────────┐  ▼
//!     │ rest api (latest)│ <─────────────────── │ poll tick │─> subscription task
//!     └──────────────────┘                      └───────────┘      │
//!                                                                  ▼
//!                                                       on_insert(reading)
//!
//!     both paths go through one gate: a row is delivered only if it is newer
//!     than the last one delivered. the first poll runs one period after
//!     subscribing and delivers whatever row it finds, even one the initial
//!     fetch already loaded; the dashboard drops rows that are not newer than
//!     the one it shows.
//!
//! relationships:
//!     - used by: main.rs (initial fetch, subscription, webhook publish)
//!     - used by: state.rs (load_initial is generic over SnapshotStore)
//!
//! ==============================================================================

use crate::config::StoreConfig;
use crate::domain::Reading;
use crate::error::DashboardError;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

const FEED_CAPACITY: usize = 16;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ==============================================================================
// store interface
// ==============================================================================

pub trait SnapshotStore {
    /// read the most recent row
    fn fetch_latest(&self) -> impl Future<Output = Result<Reading, DashboardError>> + Send;

    /// deliver each newer row to `on_insert` until the returned handle is
    /// cancelled or dropped. callbacks run one at a time, in arrival order.
    fn subscribe_inserts<F, Fut>(&self, on_insert: F) -> Subscription
    where
        F: Fn(Reading) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static;
}

/// handle to a live insert subscription
///
/// releasing it (cancel or drop) stops the background task, after which the
/// callback is not invoked again.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    fn spawn<T>(task: T) -> Self
    where
        T: Future<Output = ()> + Send + 'static,
    {
        Self { task: Some(tokio::spawn(task)) }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("insert subscription released");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// most-recent-wins filter shared by the push and poll paths
#[derive(Debug, Default)]
struct InsertGate {
    last_seen: Option<DateTime<Utc>>,
}

impl InsertGate {
    fn accept(&mut self, reading: &Reading) -> bool {
        match self.last_seen {
            Some(seen) if reading.created_at <= seen => false,
            _ => {
                self.last_seen = Some(reading.created_at);
                true
            }
        }
    }
}

// ==============================================================================
// supabase rest store
// ==============================================================================

#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    url: String,
    api_key: String,
    table: String,
    poll_interval: Option<Duration>,
    feed: broadcast::Sender<Reading>,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        let (feed, _) = broadcast::channel(FEED_CAPACITY);

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
            poll_interval: match config.poll_interval_seconds {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            feed,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// hand a pushed row to every live subscription.
    /// returns how many subscriptions received it.
    pub fn publish(&self, reading: Reading) -> usize {
        self.feed.send(reading).unwrap_or(0)
    }

    fn latest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }
}

impl SnapshotStore for RestStore {
    async fn fetch_latest(&self) -> Result<Reading, DashboardError> {
        if self.url.is_empty() {
            return Err(DashboardError::Fetch("store url is not configured".to_string()));
        }

        let body = self
            .client
            .get(self.latest_url())
            .query(&[("select", "*"), ("order", "created_at.desc"), ("limit", "1")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_latest(&body, &self.table)
    }

    fn subscribe_inserts<F, Fut>(&self, on_insert: F) -> Subscription
    where
        F: Fn(Reading) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pushed = self.feed.subscribe();
        let store = self.clone();
        let mut ticker = self.poll_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        tracing::info!(
            table = %self.table,
            poll_seconds = self.poll_interval.map(|d| d.as_secs()).unwrap_or(0),
            "insert subscription started"
        );

        Subscription::spawn(async move {
            let mut gate = InsertGate::default();
            loop {
                let delivery = tokio::select! {
                    received = pushed.recv() => match received {
                        Ok(reading) => gate.accept(&reading).then_some(reading),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "insert feed lagged, older rows dropped");
                            None
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = next_tick(&mut ticker) => match store.fetch_latest().await {
                        Ok(reading) => gate.accept(&reading).then_some(reading),
                        Err(e) => {
                            tracing::debug!(error = %e, "poll of latest row failed");
                            None
                        }
                    },
                };

                if let Some(reading) = delivery {
                    on_insert(reading).await;
                }
            }
            tracing::debug!("insert feed closed");
        })
    }
}

/// wait for the next poll, or forever when polling is off
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// postgrest answers `limit=1` with a json array of zero or one rows
pub fn parse_latest(body: &str, table: &str) -> Result<Reading, DashboardError> {
    let rows: Vec<Reading> = serde_json::from_str(body)
        .map_err(|e| DashboardError::Fetch(format!("invalid response body: {}", e)))?;
    rows.into_iter()
        .next()
        .ok_or_else(|| DashboardError::Fetch(format!("no rows in {}", table)))
}

// ==============================================================================
// insert webhook payload
// ==============================================================================

/// body of a database webhook call
///
/// `{"type": "INSERT", "table": "sensor_readings", "schema": "public",
///   "record": {...}, "old_record": null}`
#[derive(Debug, Deserialize)]
pub struct InsertEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub table: String,
    #[serde(default)]
    pub record: Option<Reading>,
}

impl InsertEvent {
    /// the inserted row, if this event is an insert into `table`
    pub fn into_insert(self, table: &str) -> Option<Reading> {
        if self.kind.eq_ignore_ascii_case("INSERT") && self.table == table {
            self.record
        } else {
            None
        }
    }
}
