//! Load lifecycle — fetch, project, and swap the displayed state.
//!
//! The widget starts in `Loading`. Each load performs exactly one fetch
//! and one projection and then replaces the whole view state: either
//! `Ready` with a fresh series set or `Failed` with the error. A
//! refresh keeps showing the previous state until it completes. Only
//! one load runs at a time; overlapping requests are turned away.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use burndown_core::{BudgetError, ErrorKind, Projector, SeriesSet};
use burndown_query::QuerySource;

/// What the dashboard currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// No load has completed yet.
    Loading,
    Ready(Arc<SeriesSet>),
    Failed { kind: ErrorKind, message: String },
}

impl ViewState {
    pub fn phase(&self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::Ready(_) => "ready",
            ViewState::Failed { .. } => "failed",
        }
    }
}

impl From<&BudgetError> for ViewState {
    fn from(err: &BudgetError) -> Self {
        ViewState::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of asking the widget to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    Failed(ErrorKind),
    /// Another load was already in flight.
    Busy,
}

/// The view state plus when it was produced.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub view: ViewState,
    /// Unix seconds of the last completed load; 0 if none.
    pub loaded_at: u64,
}

/// Owns the data source and the currently displayed state.
pub struct Widget {
    source: Arc<dyn QuerySource>,
    projector: Projector,
    state: RwLock<Snapshot>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the load ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Widget {
    pub fn new(source: Arc<dyn QuerySource>, projector: Projector) -> Self {
        Self {
            source,
            projector,
            state: RwLock::new(Snapshot {
                view: ViewState::Loading,
                loaded_at: 0,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current state (cloned; series sets are shared).
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one fetch + project cycle and publish the result.
    pub async fn load(&self) -> LoadOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("load already in flight");
            return LoadOutcome::Busy;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let source = self.source.describe();
        debug!(%source, "loading error budget");

        let result = match self.source.fetch().await {
            Ok(data) => self.projector.project(data.error_budget, &data.buckets),
            Err(e) => Err(e),
        };

        let (view, outcome) = match result {
            Ok(set) => {
                info!(
                    %source,
                    buckets = set.historical_len(),
                    error_budget = set.error_budget,
                    average = set.average_errors_per_bucket,
                    "error budget loaded"
                );
                (ViewState::Ready(Arc::new(set)), LoadOutcome::Ready)
            }
            Err(e) => {
                warn!(%source, error = %e, "error budget load failed");
                (ViewState::from(&e), LoadOutcome::Failed(e.kind()))
            }
        };

        let mut state = self.state.write().await;
        *state = Snapshot {
            view,
            loaded_at: epoch_secs(),
        };
        outcome
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
