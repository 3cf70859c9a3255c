//! Dashboard configuration
//!
//! Loaded from `<config_dir>/xpboard/config.json` by the CLI. Every field has
//! a default, so a partial file only overrides what it names.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default GraphQL endpoint of the query service
pub const DEFAULT_ENDPOINT: &str = "https://zone01.gr/api/graphql-engine/v1/graphql";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Query service endpoint
    pub endpoint: String,

    /// Root path segment shared by every record (`/athens/...`)
    pub root_segment: String,

    /// Division whose direct children are leaf exercises
    pub root_division: String,

    /// Sub-path of the root division that is included regardless of nesting
    pub checkpoint_segment: String,

    /// Raw units per display unit (1000 bytes = 1 kB)
    pub xp_scale: u64,

    /// Number of entries in the recent-activity slice
    pub recent_count: usize,

    pub timeline: TimelineConfig,

    pub radar: RadarConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            root_segment: "athens".to_string(),
            root_division: "div-01".to_string(),
            checkpoint_segment: "checkpoint".to_string(),
            xp_scale: 1000,
            recent_count: 3,
            timeline: TimelineConfig::default(),
            radar: RadarConfig::default(),
        }
    }
}

/// Time-series chart geometry and zoom behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,

    /// Intervals per axis (ticks = intervals + 1)
    pub tick_intervals: usize,

    /// Two points closer than this are considered clustered
    pub cluster_window_hours: i64,

    /// Scale applied while zoomed
    pub zoom_scale: f64,

    /// Delay before a leave returns the chart to idle
    pub exit_delay_ms: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            margin_top: 20.0,
            margin_right: 40.0,
            margin_bottom: 60.0,
            margin_left: 80.0,
            tick_intervals: 5,
            cluster_window_hours: 72,
            zoom_scale: 2.0,
            exit_delay_ms: 500,
        }
    }
}

impl TimelineConfig {
    pub fn plot_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }

    pub fn cluster_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cluster_window_hours)
    }

    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }
}

/// Radar chart geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Width and height of the square canvas
    pub size: f64,

    /// Space between the outer ring and the canvas edge
    pub label_margin: f64,

    /// Distance of labels beyond the outer ring
    pub label_offset: f64,

    /// Maximum number of axes
    pub max_skills: usize,

    /// Grid rings as fractions of the outer radius
    pub rings: Vec<f64>,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            size: 400.0,
            label_margin: 60.0,
            label_offset: 30.0,
            max_skills: 12,
            rings: vec![0.2, 0.4, 0.6, 0.8, 1.0],
        }
    }
}

impl RadarConfig {
    pub fn center(&self) -> f64 {
        self.size / 2.0
    }

    pub fn max_radius(&self) -> f64 {
        self.center() - self.label_margin
    }
}

impl DashboardConfig {
    /// Load from a JSON file. A missing file yields defaults; an unreadable
    /// or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CoreError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            message: source.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the computations meaningless
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(CoreError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if self.xp_scale == 0 {
            return invalid("xp_scale must be greater than zero");
        }
        if self.root_segment.trim_matches('/').is_empty() {
            return invalid("root_segment must not be empty");
        }
        if self.timeline.plot_width() <= 0.0 || self.timeline.plot_height() <= 0.0 {
            return invalid("timeline margins leave no room for the plot area");
        }
        if self.timeline.tick_intervals == 0 {
            return invalid("timeline.tick_intervals must be at least 1");
        }
        if self.radar.max_radius() <= 0.0 {
            return invalid("radar.label_margin leaves no room for the chart");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_chart_geometry() {
        let config = DashboardConfig::default();
        assert_eq!(config.timeline.plot_width(), 680.0);
        assert_eq!(config.timeline.plot_height(), 320.0);
        assert_eq!(config.radar.max_radius(), 140.0);
        assert_eq!(config.timeline.cluster_window(), chrono::Duration::days(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"root_segment": "rouen", "timeline": {{"exit_delay_ms": 250}}}}"#).unwrap();

        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(config.root_segment, "rouen");
        assert_eq!(config.timeline.exit_delay(), Duration::from_millis(250));
        assert_eq!(config.timeline.width, 800.0);
        assert_eq!(config.xp_scale, 1000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = DashboardConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let config = DashboardConfig {
            xp_scale: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig { .. })));
    }
}
