//! Declarative chart configurations
//!
//! The service derives a `ChartConfig` from the full collection and hands
//! it to a `ChartSurface`, which does the actual drawing.

use serde::Serialize;
use std::fmt;

use crate::models::Entity;

const BACKGROUND_COLORS: &[&str] = &[
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40",
];

const HOVER_BACKGROUND_COLORS: &[&str] = &[
    "#FF4069", "#1E90E0", "#FFC130", "#36A8A8", "#8040FF", "#FF8A1A",
];

/// Chart type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// One point per label; a missing metric serializes as `null`
    pub data: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_background_color: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// Chart configuration handed to a rendering surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
}

/// External renderer that draws a chart configuration
pub trait ChartSurface: Send + Sync {
    fn draw(&self, config: ChartConfig);
}

pub fn background_color(index: usize) -> &'static str {
    BACKGROUND_COLORS[index % BACKGROUND_COLORS.len()]
}

pub fn hover_background_color(index: usize) -> &'static str {
    HOVER_BACKGROUND_COLORS[index % HOVER_BACKGROUND_COLORS.len()]
}

/// Project entities into `(label, value)` points and build a chart.
///
/// Entities without identity or without a label are left out. An entity
/// without a metric keeps its label and contributes a gap, not zero.
pub fn build_chart<E: Entity>(kind: ChartKind, entities: &[E]) -> ChartConfig {
    let (labels, data): (Vec<String>, Vec<Option<f64>>) = entities
        .iter()
        .filter(|e| e.id().is_some())
        .filter_map(|e| e.chart_label().map(|label| (label.to_string(), e.chart_value())))
        .unzip();

    let dataset = match kind {
        ChartKind::Bar | ChartKind::Line => Dataset {
            label: Some(E::CHART_DATASET_LABEL.to_string()),
            data,
            background_color: None,
            hover_background_color: None,
        },
        ChartKind::Pie => {
            let count = data.len();
            Dataset {
                label: None,
                data,
                background_color: Some(
                    (0..count).map(|i| background_color(i).to_string()).collect(),
                ),
                hover_background_color: Some(
                    (0..count)
                        .map(|i| hover_background_color(i).to_string())
                        .collect(),
                ),
            }
        }
    };

    ChartConfig {
        kind,
        data: ChartData {
            labels,
            datasets: vec![dataset],
        },
    }
}
