//! Chart engines
//!
//! Both engines are pure: they turn derived data into screen-space geometry
//! (points, ticks, SVG path strings) and never draw anything themselves.

pub mod radar;
pub mod timeseries;
pub mod zoom;

pub use radar::{layout_radar, RadarChart, RadarLayout, RadarPoint, Spoke};
pub use timeseries::{ScreenPoint, SeriesStats, Tick, TimeSeriesChart, TimeSeriesFrame};
pub use zoom::{
    transition, DebounceTimer, TimerCommand, TokioDebounceTimer, ZoomController, ZoomEvent,
    ZoomSettings, ZoomSnapshot, ZoomState,
};

use serde::Serialize;

/// Which chart the dashboard currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// No chart selected; the caller shows the prompt panel
    #[default]
    None,
    Timeline,
    Radar,
}
