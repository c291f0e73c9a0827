//! Chart specifications built from a price series.
//!
//! Every builder is a pure function of its input. The resulting specs carry
//! the data in typed form for terminal rendering and convert to Plotly
//! figures (`{"data": [...], "layout": {...}}`) for export.

use super::error::{ChartKind, DashboardError, Result};
use super::series::{NumericTable, PriceSeries};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value, json};

/// Number of equal-width bins in the volume histogram.
pub const VOLUME_BINS: usize = 50;

/// A chart that can be exported as a Plotly figure.
pub trait PlotlyFigure {
    /// Stable file name (without extension) for exports.
    fn file_stem(&self) -> &'static str;

    fn title(&self) -> &str;

    fn to_plotly(&self) -> Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices over time, with a range slider for zooming.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub points: Vec<LinePoint>,
    pub range_slider: bool,
}

pub fn line_chart(series: &PriceSeries) -> LineChart {
    LineChart {
        title: "Stock Prices".to_string(),
        points: series
            .bars()
            .iter()
            .map(|b| LinePoint {
                date: b.date,
                close: b.close,
            })
            .collect(),
        range_slider: true,
    }
}

impl PlotlyFigure for LineChart {
    fn file_stem(&self) -> &'static str {
        "line_chart"
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn to_plotly(&self) -> Value {
        let x: Vec<String> = self.points.iter().map(|p| p.date.to_string()).collect();
        let y: Vec<f64> = self.points.iter().map(|p| p.close).collect();
        json!({
            "data": [{
                "type": "scatter",
                "mode": "lines",
                "name": "Close Price",
                "x": x,
                "y": y,
            }],
            "layout": {
                "title": { "text": self.title },
                "xaxis": {
                    "title": { "text": "Date" },
                    "rangeslider": { "visible": self.range_slider },
                },
                "yaxis": { "title": { "text": "Price" } },
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickChart {
    pub title: String,
    pub candles: Vec<Candle>,
}

pub fn candlestick_chart(series: &PriceSeries) -> CandlestickChart {
    CandlestickChart {
        title: "Candlestick Chart".to_string(),
        candles: series
            .bars()
            .iter()
            .map(|b| Candle {
                date: b.date,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
            })
            .collect(),
    }
}

impl PlotlyFigure for CandlestickChart {
    fn file_stem(&self) -> &'static str {
        "candlestick_chart"
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn to_plotly(&self) -> Value {
        let x: Vec<String> = self.candles.iter().map(|c| c.date.to_string()).collect();
        let open: Vec<f64> = self.candles.iter().map(|c| c.open).collect();
        let high: Vec<f64> = self.candles.iter().map(|c| c.high).collect();
        let low: Vec<f64> = self.candles.iter().map(|c| c.low).collect();
        let close: Vec<f64> = self.candles.iter().map(|c| c.close).collect();
        json!({
            "data": [{
                "type": "candlestick",
                "x": x,
                "open": open,
                "high": high,
                "low": low,
                "close": close,
            }],
            "layout": {
                "title": { "text": self.title },
                "xaxis": { "title": { "text": "Date" } },
                "yaxis": { "title": { "text": "Price" } },
            },
        })
    }
}

/// One histogram bin. Bins are half-open `[lower, upper)` except the last,
/// which also holds values equal to its upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeHistogram {
    pub title: String,
    pub bins: Vec<HistogramBin>,
    pub bar_gap: f64,
}

impl VolumeHistogram {
    pub fn total_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

pub fn volume_histogram(series: &PriceSeries) -> Result<VolumeHistogram> {
    let bins = equal_width_bins(&series.volumes(), VOLUME_BINS)
        .ok_or(DashboardError::EmptyChartInput(ChartKind::VolumeHistogram))?;
    Ok(VolumeHistogram {
        title: "Stock Volume Histogram".to_string(),
        bins,
        bar_gap: 0.2,
    })
}

/// Splits the observed range of `values` into `bin_count` equal-width bins.
///
/// A degenerate range (every value equal) is widened to `[v - 0.5, v + 0.5]`.
/// Returns `None` for empty input.
pub fn equal_width_bins(values: &[f64], bin_count: usize) -> Option<Vec<HistogramBin>> {
    if values.is_empty() || bin_count == 0 {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lower, upper) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (upper - lower) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for v in values {
        let index = (((v - lower) / width).floor() as usize).min(bin_count - 1);
        counts[index] += 1;
    }

    Some(
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: lower + width * i as f64,
                upper: if i + 1 == bin_count {
                    upper
                } else {
                    lower + width * (i + 1) as f64
                },
                count,
            })
            .collect(),
    )
}

impl PlotlyFigure for VolumeHistogram {
    fn file_stem(&self) -> &'static str {
        "volume_histogram"
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn to_plotly(&self) -> Value {
        // Pre-binned, so drawn as bars at the bin centers.
        let x: Vec<f64> = self.bins.iter().map(|b| (b.lower + b.upper) / 2.0).collect();
        let y: Vec<usize> = self.bins.iter().map(|b| b.count).collect();
        let width: Vec<f64> = self.bins.iter().map(|b| b.upper - b.lower).collect();
        json!({
            "data": [{
                "type": "bar",
                "name": "Volume",
                "x": x,
                "y": y,
                "width": width,
            }],
            "layout": {
                "title": { "text": self.title },
                "xaxis": { "title": { "text": "Volume" } },
                "yaxis": { "title": { "text": "Frequency" } },
                "bargap": self.bar_gap,
            },
        })
    }
}

/// Pairwise Pearson correlations. `None` marks a pair whose correlation is
/// undefined (fewer than two rows or a constant column).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationHeatmap {
    pub title: String,
    pub columns: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

pub fn correlation_heatmap(table: &NumericTable) -> Result<CorrelationHeatmap> {
    if table.is_empty() {
        return Err(DashboardError::EmptyChartInput(ChartKind::CorrelationHeatmap));
    }

    let columns = table.columns();
    let matrix = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();

    Ok(CorrelationHeatmap {
        title: "Correlation Heatmap".to_string(),
        columns: table.column_names(),
        matrix,
    })
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }

    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        None
    } else {
        Some((cov / denom).clamp(-1.0, 1.0))
    }
}

impl PlotlyFigure for CorrelationHeatmap {
    fn file_stem(&self) -> &'static str {
        "correlation_heatmap"
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn to_plotly(&self) -> Value {
        let text: Vec<Vec<String>> = self
            .matrix
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| c.map_or("NaN".to_string(), |v| format!("{v:.2}")))
                    .collect()
            })
            .collect();
        json!({
            "data": [{
                "type": "heatmap",
                "x": self.columns,
                "y": self.columns,
                "z": self.matrix,
                "text": text,
                "texttemplate": "%{text}",
                "zmin": -1.0,
                "zmax": 1.0,
            }],
            "layout": {
                "title": { "text": self.title },
                "yaxis": { "autorange": "reversed" },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::test_support::synthetic_series;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("correlation should be defined");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_line_chart_matches_series() {
        let series = synthetic_series(400, |i| 50.0 + (i as f64) * 0.25);
        let chart = line_chart(&series);

        assert_eq!(chart.points.len(), 400);
        assert!(chart.range_slider);
        for (point, bar) in chart.points.iter().zip(series.bars()) {
            assert_eq!(point.date, bar.date);
            assert_eq!(point.close, bar.close);
        }
        assert!(chart.points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_line_chart_plotly_layout() {
        let series = synthetic_series(3, |i| 10.0 + i as f64);
        let figure = line_chart(&series).to_plotly();
        assert_eq!(figure["data"][0]["mode"], "lines");
        assert_eq!(figure["data"][0]["x"][0], "2024-01-01");
        assert_eq!(figure["data"][0]["y"][2], 12.0);
        assert_eq!(figure["layout"]["xaxis"]["rangeslider"]["visible"], true);
    }

    #[test]
    fn test_candlestick_chart() {
        let series = synthetic_series(5, |i| 10.0 + i as f64);
        let chart = candlestick_chart(&series);
        assert_eq!(chart.candles.len(), 5);

        let first = chart.candles[0];
        assert_eq!(first.open, 9.5);
        assert_eq!(first.high, 11.0);
        assert_eq!(first.low, 9.0);
        assert_eq!(first.close, 10.0);
        assert!(first.is_bullish());

        let figure = chart.to_plotly();
        assert_eq!(figure["data"][0]["type"], "candlestick");
        assert_eq!(figure["data"][0]["close"][4], 14.0);
    }

    #[test]
    fn test_histogram_counts_sum_to_input_len() {
        let volumes: Vec<f64> = (0..100).map(|i| i as f64 * 1000.0 / 99.0).collect();
        let bins = equal_width_bins(&volumes, VOLUME_BINS).unwrap();

        assert_eq!(bins.len(), 50);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 100);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[49].upper, 1000.0);
        assert!(bins[0].count > 0);
        assert!(bins[49].count > 0);
        assert!((bins[0].upper - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let bins = equal_width_bins(&[7.0, 7.0, 7.0], VOLUME_BINS).unwrap();
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(bins[25].count, 3);
        assert_eq!(bins[0].lower, 6.5);
        assert_eq!(bins[49].upper, 7.5);
    }

    #[test]
    fn test_volume_histogram_empty_input() {
        let result = volume_histogram(&PriceSeries::empty());
        assert!(matches!(
            result,
            Err(DashboardError::EmptyChartInput(ChartKind::VolumeHistogram))
        ));
    }

    #[test]
    fn test_volume_histogram_from_series() {
        let series = synthetic_series(40, |i| 10.0 + i as f64);
        let histogram = volume_histogram(&series).unwrap();
        assert_eq!(histogram.bins.len(), VOLUME_BINS);
        assert_eq!(histogram.total_count(), 40);
        assert_eq!(histogram.to_plotly()["layout"]["bargap"], 0.2);
    }

    #[test]
    fn test_heatmap_empty_input() {
        let result = correlation_heatmap(&PriceSeries::empty().numeric_table());
        assert!(matches!(
            result,
            Err(DashboardError::EmptyChartInput(ChartKind::CorrelationHeatmap))
        ));

        let result = correlation_heatmap(&NumericTable::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_heatmap_perfect_correlation() {
        let table = NumericTable::new(vec![
            ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
            ("b".to_string(), vec![10.0, 20.0, 30.0, 40.0]),
        ])
        .unwrap();
        let heatmap = correlation_heatmap(&table).unwrap();

        assert_eq!(heatmap.columns, vec!["a", "b"]);
        assert_close(heatmap.matrix[0][0], 1.0);
        assert_close(heatmap.matrix[1][1], 1.0);
        assert_close(heatmap.matrix[0][1], 1.0);
        assert_close(heatmap.matrix[1][0], 1.0);
    }

    #[test]
    fn test_heatmap_negative_and_undefined() {
        let table = NumericTable::new(vec![
            ("up".to_string(), vec![1.0, 2.0, 3.0]),
            ("down".to_string(), vec![3.0, 2.0, 1.0]),
            ("flat".to_string(), vec![5.0, 5.0, 5.0]),
        ])
        .unwrap();
        let heatmap = correlation_heatmap(&table).unwrap();

        assert_close(heatmap.matrix[0][1], -1.0);
        assert_eq!(heatmap.matrix[2][2], None);
        assert_eq!(heatmap.matrix[0][2], None);

        let figure = heatmap.to_plotly();
        assert_eq!(figure["data"][0]["text"][2][2], "NaN");
        assert!(figure["data"][0]["z"][0][2].is_null());
    }

    #[test]
    fn test_heatmap_over_price_columns() {
        let series = synthetic_series(50, |i| 100.0 + i as f64);
        let heatmap = correlation_heatmap(&series.numeric_table()).unwrap();
        assert_eq!(heatmap.matrix.len(), 5);
        // Open, High, Low and Close move together in the synthetic series.
        assert_close(heatmap.matrix[0][3], 1.0);
        assert_close(heatmap.matrix[1][2], 1.0);
    }
}
