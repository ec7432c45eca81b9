//! Dashboard handlers.
//!
//! The page handler renders the current view state through an Askama
//! template; the JSON handlers expose the same state to other chart
//! surfaces.

use askama::Template;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use serde::Serialize;

use burndown_core::ErrorKind;

use crate::DashboardState;
use crate::series::{ChartSeries, chart_series};
use crate::views::*;
use crate::widget::{LoadOutcome, ViewState};

fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

// ── Page ────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "budget.html")]
struct BudgetTemplate {
    title: String,
    phase: &'static str,
    loading: bool,
    updated_display: String,
    chart: Option<ChartView>,
    summary: Option<SummaryView>,
    error_title: &'static str,
    error_message: String,
}

/// GET /
pub async fn budget_page(State(state): State<DashboardState>) -> Html<String> {
    let snapshot = state.widget.snapshot().await;

    let mut tmpl = BudgetTemplate {
        title: state.title.clone(),
        phase: snapshot.view.phase(),
        loading: state.widget.is_loading(),
        updated_display: format_timestamp(snapshot.loaded_at),
        chart: None,
        summary: None,
        error_title: "",
        error_message: String::new(),
    };

    match &snapshot.view {
        ViewState::Loading => {}
        ViewState::Ready(set) => {
            tmpl.chart = Some(ChartView::from_set(set));
            tmpl.summary = Some(SummaryView::from_set(set));
        }
        ViewState::Failed { kind, message } => {
            tmpl.error_title = kind.label();
            tmpl.error_message = message.clone();
        }
    }

    render(tmpl)
}

// ── JSON ────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum SeriesResponse<'a> {
    Loading,
    Ready { series: Vec<ChartSeries> },
    Failed { kind: ErrorKind, message: &'a str },
}

fn view_response(view: &ViewState) -> (StatusCode, Json<SeriesResponse<'_>>) {
    match view {
        ViewState::Loading => (StatusCode::ACCEPTED, Json(SeriesResponse::Loading)),
        ViewState::Ready(set) => (
            StatusCode::OK,
            Json(SeriesResponse::Ready {
                series: chart_series(set),
            }),
        ),
        ViewState::Failed { kind, message } => (
            StatusCode::BAD_GATEWAY,
            Json(SeriesResponse::Failed {
                kind: *kind,
                message: message.as_str(),
            }),
        ),
    }
}

/// GET /api/series
pub async fn series_json(State(state): State<DashboardState>) -> impl IntoResponse {
    let snapshot = state.widget.snapshot().await;
    view_response(&snapshot.view).into_response()
}

/// POST /refresh
pub async fn refresh(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.widget.load().await {
        LoadOutcome::Busy => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "state": "busy" })),
        )
            .into_response(),
        LoadOutcome::Ready | LoadOutcome::Failed(_) => {
            let snapshot = state.widget.snapshot().await;
            view_response(&snapshot.view).into_response()
        }
    }
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
