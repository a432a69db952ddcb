//! ==============================================================================
//! state.rs - dashboard state shared by the subscription and the web server
//! ==============================================================================
//!
//! purpose:
//!     holds the one live reading, the loading flag and the recent
//!     notifications, and pushes every change to the renderer.
//!     notifications are kept as history; only one younger than the toast
//!     ttl is shown as a toast.
//!
//! sharing:
//!     Arc<RwLock<AppState>> like any host state here:
//!     - the insert subscription is the only writer
//!     - http handlers are readers
//!     a new reading replaces the old one in a single write.
//!
//! relationships:
//!     - uses: display.rs (cards), render.rs (Renderer), store.rs (SnapshotStore)
//!     - used by: main.rs (initial load, subscription callback, handlers)
//!
//! ==============================================================================

use crate::config::DashboardConfig;
use crate::display::{to_display_model, to_display_model_with_max, DisplayModel};
use crate::domain::Reading;
use crate::error::DashboardError;
use crate::render::Renderer;
use crate::store::SnapshotStore;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const INSERT_NOTICE: &str = "New sensor readings received!";
pub const FETCH_ERROR_NOTICE: &str = "Error fetching sensor readings";

// a day; longer ttls are clamped
const MAX_TOAST_TTL_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// a transient notification ("toast")
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    /// current reading, `None` until the first one arrives
    pub reading: Option<Reading>,
    /// true until the initial fetch has finished
    pub loading: bool,
    /// newest last
    pub notices: VecDeque<Notice>,
}

impl Default for AppState {
    fn default() -> Self {
        Self { reading: None, loading: true, notices: VecDeque::new() }
    }
}

/// everything the page and /api show
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub loading: bool,
    pub reading: Option<Reading>,
    pub cards: [DisplayModel; 4],
    pub last_updated: Option<DateTime<Utc>>,
    /// newest notice, while it is still within the toast ttl
    pub toast: Option<Notice>,
    pub notifications: Vec<Notice>,
}

#[derive(Clone)]
pub struct Dashboard {
    state: Arc<RwLock<AppState>>,
    renderer: Arc<dyn Renderer>,
    temperature_max: f64,
    capacity: usize,
    toast_ttl: Duration,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            renderer,
            temperature_max: config.chart.temperature_max,
            capacity: config.notifications.capacity.max(1),
            toast_ttl: Duration::seconds(
                config.notifications.ttl_seconds.min(MAX_TOAST_TTL_SECONDS) as i64,
            ),
        }
    }

    /// one-shot initial fetch. a failure becomes an error notice and the
    /// dashboard stays on zero values; it is not retried.
    pub async fn load_initial<S: SnapshotStore>(&self, store: &S) -> Result<(), DashboardError> {
        let result = store.fetch_latest().await;

        let mut state = self.state.write().await;
        state.loading = false;
        let outcome = match result {
            Ok(reading) => {
                tracing::info!(created_at = %reading.created_at, "loaded latest sensor reading");
                replace_if_newer(&mut state, reading);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "initial fetch failed");
                self.push_notice(&mut state, NoticeLevel::Error, FETCH_ERROR_NOTICE);
                Err(e)
            }
        };
        self.render(&state);
        outcome
    }

    /// subscription callback: a newer row replaces the current one.
    /// returns false when the row was not newer and was dropped.
    pub async fn apply_insert(&self, reading: Reading) -> bool {
        let mut state = self.state.write().await;
        let created_at = reading.created_at;
        if !replace_if_newer(&mut state, reading) {
            tracing::debug!(%created_at, "ignoring reading older than the current one");
            return false;
        }
        state.loading = false;
        tracing::info!(%created_at, "new sensor reading received");
        self.push_notice(&mut state, NoticeLevel::Success, INSERT_NOTICE);
        self.render(&state);
        true
    }

    pub async fn view(&self) -> DashboardView {
        self.view_at(Utc::now()).await
    }

    async fn view_at(&self, now: DateTime<Utc>) -> DashboardView {
        let state = self.state.read().await;
        DashboardView {
            loading: state.loading,
            reading: state.reading.clone(),
            cards: self.cards(state.reading.as_ref()),
            last_updated: state.reading.as_ref().map(|r| r.created_at),
            toast: state.notices.back().filter(|n| now - n.at <= self.toast_ttl).cloned(),
            notifications: state.notices.iter().cloned().collect(),
        }
    }

    fn cards(&self, reading: Option<&Reading>) -> [DisplayModel; 4] {
        to_display_model_with_max(reading, self.temperature_max).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to the default temperature maximum");
            to_display_model(reading)
        })
    }

    fn render(&self, state: &AppState) {
        self.renderer.render(&self.cards(state.reading.as_ref()), state.loading);
    }

    fn push_notice(&self, state: &mut AppState, level: NoticeLevel, message: &str) {
        while state.notices.len() >= self.capacity {
            state.notices.pop_front();
        }
        state.notices.push_back(Notice { level, message: message.to_string(), at: Utc::now() });
    }
}

fn replace_if_newer(state: &mut AppState, reading: Reading) -> bool {
    if let Some(current) = &state.reading {
        if reading.created_at <= current.created_at {
            return false;
        }
    }
    state.reading = Some(reading);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::render::render_page;
    use crate::store::Subscription;
    use chrono::TimeZone;
    use std::future::Future;
    use std::sync::Mutex;

    /// records each render call as (gas card value, loading)
    #[derive(Default)]
    struct RecordingRenderer {
        frames: Mutex<Vec<(String, bool)>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&self, cards: &[DisplayModel; 4], loading: bool) {
            self.frames.lock().unwrap().push((cards[3].formatted_value.clone(), loading));
        }
    }

    struct FixedStore(Result<Reading, DashboardError>);

    impl SnapshotStore for FixedStore {
        async fn fetch_latest(&self) -> Result<Reading, DashboardError> {
            self.0.clone()
        }

        fn subscribe_inserts<F, Fut>(&self, _on_insert: F) -> Subscription
        where
            F: Fn(Reading) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = ()> + Send + 'static,
        {
            unimplemented!("not used by these tests")
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn dashboard(capacity: usize) -> (Dashboard, Arc<RecordingRenderer>) {
        let mut config = DashboardConfig::default();
        config.notifications.capacity = capacity;
        let renderer = Arc::new(RecordingRenderer::default());
        (Dashboard::new(&config, renderer.clone()), renderer)
    }

    #[tokio::test]
    async fn starts_loading_with_zero_cards() {
        let (dash, _) = dashboard(5);
        let view = dash.view().await;
        assert!(view.loading);
        assert!(view.reading.is_none());
        assert_eq!(view.cards[3].formatted_value, "0 ppm");
        assert!(view.last_updated.is_none());
    }

    #[tokio::test]
    async fn initial_load_success() {
        let (dash, renderer) = dashboard(5);
        let store = FixedStore(Ok(Reading::new(25.0, 45.0, 55.0, 150.0, at(0))));
        dash.load_initial(&store).await.unwrap();

        let view = dash.view().await;
        assert!(!view.loading);
        assert_eq!(view.cards[3].classification, Some(Classification::Good));
        assert_eq!(view.last_updated, Some(at(0)));
        assert!(view.notifications.is_empty());
        assert_eq!(*renderer.frames.lock().unwrap(), vec![("150 ppm".to_string(), false)]);
    }

    #[tokio::test]
    async fn initial_load_failure_falls_back_to_zero() {
        let (dash, renderer) = dashboard(5);
        let store = FixedStore(Err(DashboardError::Fetch("offline".to_string())));
        assert!(dash.load_initial(&store).await.is_err());

        let view = dash.view().await;
        assert!(!view.loading);
        assert!(view.reading.is_none());
        assert_eq!(view.cards[1].formatted_value, "0%");
        let notice = view.toast.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, FETCH_ERROR_NOTICE);
        assert_eq!(*renderer.frames.lock().unwrap(), vec![("0 ppm".to_string(), false)]);
    }

    #[tokio::test]
    async fn insert_replaces_reading_and_notifies() {
        let (dash, _) = dashboard(5);
        let store = FixedStore(Ok(Reading::new(20.0, 30.0, 40.0, 50.0, at(0))));
        dash.load_initial(&store).await.unwrap();

        assert!(dash.apply_insert(Reading::new(25.0, 45.0, 55.0, 800.0, at(1))).await);
        let view = dash.view().await;
        assert_eq!(view.reading.as_ref().unwrap().sensor4, 800.0);
        assert_eq!(view.cards[3].classification, Some(Classification::Bad));
        assert_eq!(view.toast.unwrap().message, INSERT_NOTICE);
    }

    #[tokio::test]
    async fn older_insert_is_dropped() {
        let (dash, renderer) = dashboard(5);
        assert!(dash.apply_insert(Reading::new(1.0, 1.0, 1.0, 1.0, at(5))).await);
        assert!(!dash.apply_insert(Reading::new(2.0, 2.0, 2.0, 2.0, at(4))).await);

        let view = dash.view().await;
        assert_eq!(view.reading.unwrap().sensor1, 1.0);
        assert_eq!(view.notifications.len(), 1);
        assert_eq!(renderer.frames.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn initial_fetch_does_not_override_newer_push() {
        let (dash, _) = dashboard(5);
        dash.apply_insert(Reading::new(9.0, 0.0, 0.0, 0.0, at(10))).await;
        let store = FixedStore(Ok(Reading::new(1.0, 0.0, 0.0, 0.0, at(0))));
        dash.load_initial(&store).await.unwrap();
        assert_eq!(dash.view().await.reading.unwrap().sensor1, 9.0);
    }

    #[tokio::test]
    async fn toast_expires_after_ttl() {
        let (dash, _) = dashboard(5);
        dash.apply_insert(Reading::new(1.0, 0.0, 0.0, 0.0, at(0))).await;
        let raised = dash.view().await.toast.unwrap().at;

        let fresh = dash.view_at(raised + Duration::seconds(3)).await;
        assert_eq!(fresh.toast.unwrap().message, INSERT_NOTICE);

        let stale = dash.view_at(raised + Duration::seconds(5)).await;
        assert!(stale.toast.is_none());
        assert_eq!(stale.notifications.len(), 1);
        assert!(!render_page(&stale, 5).contains(r#"class="toast"#));
    }

    #[tokio::test]
    async fn repolled_current_row_raises_no_notice() {
        let (dash, renderer) = dashboard(5);
        let row = Reading::new(25.0, 45.0, 55.0, 150.0, at(0));
        dash.load_initial(&FixedStore(Ok(row.clone()))).await.unwrap();

        assert!(!dash.apply_insert(row).await);
        let view = dash.view().await;
        assert!(view.notifications.is_empty());
        assert!(view.toast.is_none());
        assert_eq!(renderer.frames.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notices_are_bounded() {
        let (dash, _) = dashboard(2);
        for i in 0..4 {
            dash.apply_insert(Reading::new(i as f64, 0.0, 0.0, 0.0, at(i))).await;
        }
        assert_eq!(dash.view().await.notifications.len(), 2);
    }
}
