//! Skill radar chart layout

use serde::Serialize;
use std::f64::consts::PI;

use crate::config::RadarConfig;
use crate::skills::Skill;

/// Grid never shrinks below this reference level
const REFERENCE_LEVEL: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPoint {
    pub name: String,
    pub level: i64,
    /// Radians, 0 = right, clockwise in screen space
    pub angle: f64,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
    pub label_x: f64,
    pub label_y: f64,
}

/// Spoke from the centre to the outer ring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spoke {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    pub size: f64,
    pub center: f64,
    pub max_radius: f64,
    pub max_value: f64,
    pub points: Vec<RadarPoint>,
    /// Ring radii, innermost first
    pub rings: Vec<f64>,
    pub spokes: Vec<Spoke>,
    /// Closed polygon through every vertex
    pub polygon_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RadarLayout {
    /// No skill above zero; the caller shows a placeholder
    Empty,
    Chart(RadarChart),
}

impl RadarLayout {
    pub fn is_empty(&self) -> bool {
        matches!(self, RadarLayout::Empty)
    }

    pub fn chart(&self) -> Option<&RadarChart> {
        match self {
            RadarLayout::Chart(chart) => Some(chart),
            RadarLayout::Empty => None,
        }
    }
}

/// Lay out ranked skills (best first). Levels of zero or below are dropped,
/// then at most `max_skills` are kept in the given order.
pub fn layout_radar(ranked: &[Skill], config: &RadarConfig) -> RadarLayout {
    let skills: Vec<&Skill> = ranked
        .iter()
        .filter(|s| s.level > 0)
        .take(config.max_skills)
        .collect();

    if skills.is_empty() {
        return RadarLayout::Empty;
    }

    let center = config.center();
    let max_radius = config.max_radius();
    let max_value = skills
        .iter()
        .map(|s| s.level as f64)
        .fold(REFERENCE_LEVEL, f64::max);
    let step = 2.0 * PI / skills.len() as f64;

    let points: Vec<RadarPoint> = skills
        .iter()
        .enumerate()
        .map(|(i, skill)| {
            let angle = i as f64 * step - PI / 2.0;
            let radius = skill.level as f64 / max_value * max_radius;
            let label_radius = max_radius + config.label_offset;
            RadarPoint {
                name: skill.name.clone(),
                level: skill.level,
                angle,
                radius,
                x: center + angle.cos() * radius,
                y: center + angle.sin() * radius,
                label_x: center + angle.cos() * label_radius,
                label_y: center + angle.sin() * label_radius,
            }
        })
        .collect();

    let spokes = points
        .iter()
        .map(|p| Spoke {
            x1: center,
            y1: center,
            x2: center + p.angle.cos() * max_radius,
            y2: center + p.angle.sin() * max_radius,
        })
        .collect();

    let mut polygon_path = points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {:.2} {:.2}", if i == 0 { 'M' } else { 'L' }, p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");
    polygon_path.push_str(" Z");

    RadarLayout::Chart(RadarChart {
        size: config.size,
        center,
        max_radius,
        max_value,
        rings: config.rings.iter().map(|f| f * max_radius).collect(),
        spokes,
        points,
        polygon_path,
    })
}
