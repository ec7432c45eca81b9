//! View types for dashboard template rendering.
//!
//! These types are purpose-built for Askama templates: the chart is laid
//! out server side into SVG coordinates and every number is pre-formatted,
//! so templates stay simple.

use burndown_core::{SeriesKind, SeriesSet, depletion_time};

use crate::series::{descriptor, is_trend};

pub const CHART_WIDTH: f64 = 960.0;
pub const CHART_HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 40.0;
const TICKS: usize = 5;

// ── Chart ───────────────────────────────────────────────────────

pub struct ChartView {
    pub width: String,
    pub height: String,
    pub plot_left: String,
    pub plot_right: String,
    pub plot_top: String,
    pub plot_bottom: String,
    pub lines: Vec<LineView>,
    pub x_ticks: Vec<TickView>,
    pub y_ticks: Vec<TickView>,
}

pub struct LineView {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    /// SVG `points` attribute: "x,y x,y ...".
    pub points: String,
    pub dashed: bool,
}

pub struct TickView {
    /// Pixel position along the tick's axis.
    pub pos: String,
    pub label: String,
}

/// Data-space bounds of everything plotted.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x_min: i64,
    x_max: i64,
    y_max: f64,
}

impl Bounds {
    fn of(set: &SeriesSet) -> Option<Self> {
        let mut points = SeriesKind::ALL.iter().flat_map(|&k| set.series(k).iter());
        let first = points.next()?;
        let mut b = Bounds {
            x_min: first.x,
            x_max: first.x,
            y_max: first.y,
        };
        for p in points {
            b.x_min = b.x_min.min(p.x);
            b.x_max = b.x_max.max(p.x);
            b.y_max = b.y_max.max(p.y);
        }
        // Keep a flat, all-zero chart from collapsing to a line.
        if b.y_max <= 0.0 {
            b.y_max = 1.0;
        }
        Some(b)
    }

    fn px(&self, x: i64) -> f64 {
        MARGIN_LEFT
            + (x as f64 - self.x_min as f64) / self.x_span() * (CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT)
    }

    /// Width of the x range; computed in f64 so distant timestamps cannot overflow.
    fn x_span(&self) -> f64 {
        (self.x_max as f64 - self.x_min as f64).max(1.0)
    }

    fn py(&self, y: f64) -> f64 {
        let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        CHART_HEIGHT - MARGIN_BOTTOM - y / self.y_max * plot_height
    }
}

impl ChartView {
    pub fn from_set(set: &SeriesSet) -> Self {
        let bounds = Bounds::of(set).unwrap_or(Bounds {
            x_min: 0,
            x_max: 1,
            y_max: 1.0,
        });

        let lines = SeriesKind::ALL
            .iter()
            .map(|&kind| {
                let (id, label, color) = descriptor(kind);
                let points = set
                    .series(kind)
                    .iter()
                    .map(|p| format!("{:.1},{:.1}", bounds.px(p.x), bounds.py(p.y)))
                    .collect::<Vec<_>>()
                    .join(" ");
                LineView {
                    id,
                    label,
                    color,
                    points,
                    dashed: is_trend(kind),
                }
            })
            .collect();

        let x_ticks = (0..TICKS)
            .map(|i| {
                let x = (bounds.x_min as f64 + bounds.x_span() * i as f64 / (TICKS - 1) as f64) as i64;
                TickView {
                    pos: format!("{:.1}", bounds.px(x)),
                    label: format_date_ms(x),
                }
            })
            .collect();

        let y_ticks = (0..TICKS)
            .map(|i| {
                let y = bounds.y_max * i as f64 / (TICKS - 1) as f64;
                TickView {
                    pos: format!("{:.1}", bounds.py(y)),
                    label: format_count(y),
                }
            })
            .collect();

        Self {
            width: format!("{CHART_WIDTH:.0}"),
            height: format!("{CHART_HEIGHT:.0}"),
            plot_left: format!("{MARGIN_LEFT:.0}"),
            plot_right: format!("{:.0}", CHART_WIDTH - MARGIN_RIGHT),
            plot_top: format!("{MARGIN_TOP:.0}"),
            plot_bottom: format!("{:.0}", CHART_HEIGHT - MARGIN_BOTTOM),
            lines,
            x_ticks,
            y_ticks,
        }
    }
}

// ── Summary ─────────────────────────────────────────────────────

pub struct SummaryView {
    pub budget_display: String,
    pub consumed_display: String,
    pub remaining_display: String,
    pub remaining_percent_display: String,
    pub remaining_color: &'static str,
    pub average_display: String,
    pub bucket_count: usize,
    /// Whether the budget runs out within history or forecast.
    pub depleted: bool,
    pub depletion_display: String,
}

impl SummaryView {
    pub fn from_set(set: &SeriesSet) -> Self {
        let consumed = set.errors.last().map(|p| p.y).unwrap_or(0.0);
        let remaining = set.remaining.last().map(|p| p.y).unwrap_or(set.error_budget);

        let remaining_percent = if set.error_budget > 0.0 {
            remaining / set.error_budget * 100.0
        } else {
            0.0
        };
        let remaining_color = if remaining_percent <= 0.0 {
            "text-rose-400"
        } else if remaining_percent < 25.0 {
            "text-amber-400"
        } else {
            "text-emerald-400"
        };

        let depletion = depletion_time(set);

        Self {
            budget_display: format_count(set.error_budget),
            consumed_display: format_count(consumed),
            remaining_display: format_count(remaining),
            remaining_percent_display: format!("{remaining_percent:.1}"),
            remaining_color,
            average_display: format!("{:.2}", set.average_errors_per_bucket),
            bucket_count: set.historical_len(),
            depleted: depletion.is_some(),
            depletion_display: depletion
                .map(format_date_ms)
                .unwrap_or_else(|| "not within forecast".to_string()),
        }
    }
}

// ── Formatting ──────────────────────────────────────────────────

/// Whole counts print without decimals; fractional budgets keep one.
pub fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

pub fn format_date_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn format_timestamp(timestamp_secs: u64) -> String {
    if timestamp_secs == 0 {
        return "never".to_string();
    }
    chrono::DateTime::from_timestamp(timestamp_secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
