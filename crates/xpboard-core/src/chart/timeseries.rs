//! Cumulative XP time-series chart
//!
//! Maps [`ChartPoint`]s into plot-area coordinates (origin top-left of the
//! plot area, y growing downwards) and produces a renderable
//! [`TimeSeriesFrame`] for a given zoom state.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use super::zoom::ZoomState;
use crate::aggregate::ChartPoint;
use crate::config::TimelineConfig;

/// Axis tick at a (possibly zoomed) position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Data point in screen coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub label: String,
    pub increment: u64,
    pub hovered: bool,
}

/// Header numbers shown above the chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Final cumulative value, rounded
    pub total: u64,
    pub count: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesFrame {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    pub plot_width: f64,
    pub plot_height: f64,
    pub points: Vec<ScreenPoint>,
    /// `M x y L x y ...`, empty when there are no points
    pub line_path: String,
    /// Line path closed to the baseline
    pub area_path: String,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    pub zoom: ZoomState,
    pub stats: SeriesStats,
}

/// Chart over a cumulative series
#[derive(Debug, Clone)]
pub struct TimeSeriesChart {
    points: Vec<ChartPoint>,
    config: TimelineConfig,
    max_value: f64,
}

impl TimeSeriesChart {
    /// Points are ordered by timestamp; input order is kept for ties
    pub fn new(mut points: Vec<ChartPoint>, config: &TimelineConfig) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let max_value = points.iter().map(|p| p.value).fold(0.0, f64::max);

        Self {
            points,
            config: config.clone(),
            max_value,
        }
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn min_date(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn max_date(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    fn span_ms(&self) -> i64 {
        match (self.min_date(), self.max_date()) {
            (Some(min), Some(max)) => (max - min).num_milliseconds(),
            _ => 0,
        }
    }

    /// Unzoomed x for a timestamp. A single-instant series sits at the centre.
    pub fn base_x(&self, timestamp: DateTime<Utc>) -> f64 {
        let width = self.config.plot_width();
        let span = self.span_ms();
        let Some(min) = self.min_date() else {
            return width / 2.0;
        };
        if span <= 0 {
            return width / 2.0;
        }
        let offset = (timestamp - min).num_milliseconds() as f64;
        offset / span as f64 * width
    }

    /// Unzoomed y for a value; larger values sit higher
    pub fn base_y(&self, value: f64) -> f64 {
        let height = self.config.plot_height();
        if self.max_value <= 0.0 {
            return height;
        }
        height - (value / self.max_value) * height
    }

    pub fn base_coords(&self, index: usize) -> Option<(f64, f64)> {
        self.points
            .get(index)
            .map(|p| (self.base_x(p.timestamp), self.base_y(p.value)))
    }

    /// True if another point lies within `window` of point `index`
    pub fn is_clustered(&self, index: usize, window: Duration) -> bool {
        let Some(target) = self.points.get(index) else {
            return false;
        };
        self.points
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && (p.timestamp - target.timestamp).abs() <= window)
    }

    /// Y-axis ticks from 0 to the maximum value
    pub fn y_ticks(&self, zoom: &ZoomState) -> Vec<Tick> {
        if self.is_empty() {
            return Vec::new();
        }
        let intervals = self.config.tick_intervals.max(1);
        (0..=intervals)
            .map(|i| {
                let value = self.max_value / intervals as f64 * i as f64;
                Tick {
                    position: zoom.apply_y(self.base_y(value)),
                    label: format!("{}k", value.round() as i64),
                }
            })
            .collect()
    }

    /// X-axis ticks evenly spaced in time; the year is shown only when it
    /// differs from `reference_year`
    pub fn x_ticks(&self, zoom: &ZoomState, reference_year: i32) -> Vec<Tick> {
        let Some(min) = self.min_date() else {
            return Vec::new();
        };
        let intervals = self.config.tick_intervals.max(1);
        let span = self.span_ms();

        (0..=intervals)
            .map(|i| {
                let at = min + Duration::milliseconds(span / intervals as i64 * i as i64);
                let label = if at.year() == reference_year {
                    at.format("%b %-d").to_string()
                } else {
                    at.format("%b %-d, %Y").to_string()
                };
                Tick {
                    position: zoom.apply_x(self.base_x(at)),
                    label,
                }
            })
            .collect()
    }

    /// Points, paths and ticks under `zoom`
    pub fn frame(&self, zoom: &ZoomState, hovered: Option<usize>, reference_year: i32) -> TimeSeriesFrame {
        let points: Vec<ScreenPoint> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (x, y) = zoom.apply(self.base_x(p.timestamp), self.base_y(p.value));
                ScreenPoint {
                    x,
                    y,
                    timestamp: p.timestamp,
                    value: p.value,
                    label: p.label.clone(),
                    increment: p.increment,
                    hovered: hovered == Some(i),
                }
            })
            .collect();

        let line_path = points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {:.2} {:.2}", if i == 0 { 'M' } else { 'L' }, p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");

        let area_path = if line_path.is_empty() {
            String::new()
        } else {
            format!(
                "{} L {:.2} {:.2} L 0 {:.2} Z",
                line_path,
                self.config.plot_width(),
                self.config.plot_height(),
                self.config.plot_height()
            )
        };

        TimeSeriesFrame {
            width: self.config.width,
            height: self.config.height,
            margin_left: self.config.margin_left,
            margin_top: self.config.margin_top,
            plot_width: self.config.plot_width(),
            plot_height: self.config.plot_height(),
            x_ticks: self.x_ticks(zoom, reference_year),
            y_ticks: self.y_ticks(zoom),
            points,
            line_path,
            area_path,
            zoom: *zoom,
            stats: SeriesStats {
                total: self.max_value.round() as u64,
                count: self.points.len(),
                start: self.min_date(),
                end: self.max_date(),
            },
        }
    }
}
