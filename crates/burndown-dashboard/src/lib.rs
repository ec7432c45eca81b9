//! burndown-dashboard — server-rendered error budget dashboard.
//!
//! Maps a projected `SeriesSet` to chart series, tracks the load
//! lifecycle (`Loading | Ready | Failed`), and serves it as an HTML page
//! with an inline SVG chart plus a JSON feed.
//!
//! # Routes
//!
//! | Method | Route | Handler |
//! |---|---|---|
//! | GET | `/` | Budget page |
//! | GET | `/api/series` | Chart series as JSON |
//! | POST | `/refresh` | Fetch and project again |
//! | GET | `/healthz` | Liveness |

pub mod pages;
pub mod series;
pub mod views;
pub mod widget;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

pub use series::{ChartSeries, chart_series};
pub use widget::{LoadOutcome, ViewState, Widget};

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub widget: Arc<Widget>,
    pub title: String,
}

/// Build the dashboard router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(pages::budget_page))
        .route("/api/series", get(pages::series_json))
        .route("/refresh", post(pages::refresh))
        .route("/healthz", get(pages::healthz))
        .with_state(state)
}
