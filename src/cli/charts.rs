//! Text renderings of chart specs for the terminal.

use super::ui;
use crate::core::charts::{CandlestickChart, CorrelationHeatmap, LineChart, VolumeHistogram};
use comfy_table::{Cell, Color};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Candles listed under the candlestick summary.
pub const RECENT_CANDLES: usize = 10;

/// Compresses `values` into at most `width` block characters, averaging
/// consecutive values that share a column.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let columns = width.min(values.len());
    let buckets: Vec<f64> = (0..columns)
        .map(|c| {
            let start = c * values.len() / columns;
            let end = ((c + 1) * values.len() / columns).max(start + 1);
            let slice = &values[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect();

    let min = buckets.iter().copied().fold(f64::INFINITY, f64::min);
    let max = buckets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    buckets
        .iter()
        .map(|v| {
            let level = if span > 0.0 {
                (((v - min) / span) * (SPARK_LEVELS.len() - 1) as f64).round() as usize
            } else {
                SPARK_LEVELS.len() / 2
            };
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

pub fn render_line_chart(chart: &LineChart, width: usize) -> String {
    let closes: Vec<f64> = chart.points.iter().map(|p| p.close).collect();
    let mut out = format!("{}\n\n", ui::style_text(&chart.title, ui::StyleType::Subtitle));

    let (Some(first), Some(last)) = (chart.points.first(), chart.points.last()) else {
        out.push_str(&ui::style_text("No points", ui::StyleType::Subtle));
        return out;
    };
    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    out.push_str(&sparkline(&closes, width.saturating_sub(2)));
    out.push('\n');
    out.push_str(&ui::style_text(
        &format!(
            "{} → {}  ({} points, low {min:.2}, high {max:.2})",
            first.date,
            last.date,
            chart.points.len()
        ),
        ui::StyleType::Subtle,
    ));
    out
}

pub fn render_candlesticks(chart: &CandlestickChart) -> String {
    let up = chart.candles.iter().filter(|c| c.is_bullish()).count();
    let down = chart.candles.len() - up;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Open"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Close"),
        ui::header_cell(""),
    ]);
    for candle in chart.candles.iter().rev().take(RECENT_CANDLES) {
        let direction = if candle.is_bullish() {
            Cell::new("▲").fg(Color::Green)
        } else {
            Cell::new("▼").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(candle.date.to_string()),
            ui::number_cell(format!("{:.2}", candle.open)),
            ui::number_cell(format!("{:.2}", candle.high)),
            ui::number_cell(format!("{:.2}", candle.low)),
            ui::number_cell(format!("{:.2}", candle.close)),
            direction,
        ]);
    }

    format!(
        "{}\n{}\n\n{table}",
        ui::style_text(&chart.title, ui::StyleType::Subtitle),
        ui::style_text(
            &format!("{} candles: {up} up, {down} down", chart.candles.len()),
            ui::StyleType::Subtle
        ),
    )
}

pub fn render_histogram(histogram: &VolumeHistogram, width: usize) -> String {
    let max_count = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0);
    let bar_width = width.saturating_sub(40).max(10);

    let mut out = format!(
        "{}\n\n",
        ui::style_text(&histogram.title, ui::StyleType::Subtitle)
    );
    for bin in &histogram.bins {
        let len = if max_count > 0 {
            (bin.count * bar_width).div_ceil(max_count)
        } else {
            0
        };
        out.push_str(&format!(
            "{:>14.0} – {:<14.0} │{} {}\n",
            bin.lower,
            bin.upper,
            "█".repeat(len),
            bin.count
        ));
    }
    out.push_str(&ui::style_text(
        &format!("Volume vs. frequency, {} sessions", histogram.total_count()),
        ui::StyleType::Subtle,
    ));
    out
}

pub fn render_heatmap(heatmap: &CorrelationHeatmap) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("")];
    header.extend(heatmap.columns.iter().map(|c| ui::header_cell(c)));
    table.set_header(header);

    for (name, row) in heatmap.columns.iter().zip(&heatmap.matrix) {
        let mut cells = vec![ui::header_cell(name)];
        cells.extend(row.iter().map(|v| ui::correlation_cell(*v)));
        table.add_row(cells);
    }

    format!(
        "{}\n\n{table}",
        ui::style_text(&heatmap.title, ui::StyleType::Subtitle)
    )
}
