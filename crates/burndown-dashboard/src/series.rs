//! Chart series descriptors handed to the charting surface.

use serde::{Deserialize, Serialize};

use burndown_core::{DataPoint, SeriesKind, SeriesSet};

/// One plotted line with its display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub id: String,
    pub label: String,
    pub color: String,
    pub x_unit: String,
    pub y_unit: String,
    pub points: Vec<DataPoint>,
}

/// Fixed display metadata for a series kind: `(id, label, color)`.
pub fn descriptor(kind: SeriesKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        SeriesKind::Budget => ("series-1", "Error budget", "green"),
        SeriesKind::Errors => ("series-2", "Errors", "#000000"),
        SeriesKind::Remaining => ("series-3", "Error Budget remaining", "#CC00BB"),
        SeriesKind::TrendErrors => ("series-4", "Trend Errors", "darkgrey"),
        SeriesKind::TrendRemaining => ("series-5", "Trend Error Budget", "blue"),
    }
}

/// Whether a series is part of the forecast.
pub fn is_trend(kind: SeriesKind) -> bool {
    matches!(kind, SeriesKind::TrendErrors | SeriesKind::TrendRemaining)
}

/// Map a series set to the five chart series, in display order.
pub fn chart_series(set: &SeriesSet) -> Vec<ChartSeries> {
    SeriesKind::ALL
        .iter()
        .map(|&kind| {
            let (id, label, color) = descriptor(kind);
            ChartSeries {
                id: id.to_string(),
                label: label.to_string(),
                color: color.to_string(),
                x_unit: "timestamp".to_string(),
                y_unit: "count".to_string(),
                points: set.series(kind).to_vec(),
            }
        })
        .collect()
}
