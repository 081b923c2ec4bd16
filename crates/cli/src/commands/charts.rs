//! Terminal rendering of chart configurations

use anyhow::{bail, Result};
use bookshop_lib::{ChartConfig, ChartKind, ChartSurface, Entity, SyncService};
use clap::ValueEnum;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::output::{print_error, print_json, OutputFormat};

const BAR_WIDTH: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartArg {
    /// Bar chart of the collection's metric
    Bar,
    /// Line chart of the collection's metric
    Line,
    /// Pie chart of the collection's metric
    Pie,
}

/// Chart surface writing to stdout
pub struct TerminalSurface {
    format: OutputFormat,
    drawn: AtomicBool,
}

impl TerminalSurface {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            drawn: AtomicBool::new(false),
        }
    }

    pub fn was_drawn(&self) -> bool {
        self.drawn.load(Ordering::SeqCst)
    }
}

impl ChartSurface for TerminalSurface {
    fn draw(&self, config: ChartConfig) {
        self.drawn.store(true, Ordering::SeqCst);
        match self.format {
            OutputFormat::Json => {
                if let Err(e) = print_json(&config) {
                    print_error(&format!("Failed to render chart: {}", e));
                }
            }
            OutputFormat::Table => println!("{}", render(&config)),
        }
    }
}

/// Render a chart configuration as text
pub fn render(config: &ChartConfig) -> String {
    let Some(dataset) = config.data.datasets.first() else {
        return "(no data)".to_string();
    };
    if config.data.labels.is_empty() {
        return "(no data)".to_string();
    }

    let width = config
        .data
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let points = config.data.labels.iter().zip(dataset.data.iter());
    let mut lines = Vec::new();

    match config.kind {
        ChartKind::Bar | ChartKind::Line => {
            if let Some(label) = &dataset.label {
                lines.push(format!("{} ({})", label, config.kind));
            }
            let max = dataset.data.iter().flatten().copied().fold(0.0_f64, f64::max);
            for (label, value) in points {
                let Some(value) = value else {
                    lines.push(format!("{:<width$} │ -", label, width = width));
                    continue;
                };
                let length = if max > 0.0 {
                    (value / max * BAR_WIDTH).round() as usize
                } else {
                    0
                };
                let mark = match config.kind {
                    ChartKind::Line => format!("{}●", " ".repeat(length.saturating_sub(1))),
                    _ => "█".repeat(length),
                };
                lines.push(format!("{:<width$} │ {} {}", label, mark, value, width = width));
            }
        }
        ChartKind::Pie => {
            let total: f64 = dataset.data.iter().flatten().sum();
            let colors = dataset.background_color.as_deref().unwrap_or(&[]);
            for (index, (label, value)) in points.enumerate() {
                let color = colors.get(index).map(String::as_str).unwrap_or("-");
                let share = match value {
                    Some(value) if total > 0.0 => format!("{:>5.1}%", value / total * 100.0),
                    Some(_) => format!("{:>5.1}%", 0.0),
                    None => format!("{:>6}", "-"),
                };
                lines.push(format!("{:<width$} │ {} {}", label, share, color, width = width));
            }
        }
    }

    lines.join("\n")
}

/// Load the collection's chart and draw it on the terminal
pub async fn draw<E: Entity>(service: &SyncService<E>, kind: ChartArg, format: OutputFormat) -> Result<()> {
    let surface = TerminalSurface::new(format);
    match kind {
        ChartArg::Bar => service.create_bar_chart(&surface).await,
        ChartArg::Line => service.create_linear_chart(&surface).await,
        ChartArg::Pie => service.create_pie_chart(&surface).await,
    }

    if !surface.was_drawn() {
        bail!("Chart data for {} unavailable", E::COLLECTION);
    }
    Ok(())
}
