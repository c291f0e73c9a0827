use super::{charts, export, ui};
use crate::core::dashboard::{Dashboard, DashboardRequest, Panel, build_dashboard};
use crate::core::fundamentals::FundamentalTables;
use crate::core::metrics::SummaryMetrics;
use crate::core::ratios::RatioSet;
use crate::core::series::PriceBar;
use crate::core::{DashboardError, MarketDataProvider};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use std::path::PathBuf;
use tracing::{debug, info};

pub const EMPTY_RESULT_NOTICE: &str = "No data found for the given ticker.";

/// Line items listed per statement in the fundamentals panel.
const FUNDAMENTAL_ITEMS: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Also write every chart as a Plotly figure into this directory.
    pub export_dir: Option<PathBuf>,
    /// Show the latest period of each fundamental statement after the ratios.
    pub show_fundamentals: bool,
}

/// Runs one dashboard request for `ticker` and prints it.
///
/// An unknown ticker prints a notice and still succeeds; every other failure
/// is returned.
pub async fn run(
    provider: &(dyn MarketDataProvider + Send + Sync),
    ticker: &str,
    today: NaiveDate,
    options: &RenderOptions,
) -> Result<()> {
    let request = DashboardRequest::trailing_year(ticker, today);

    let spinner = ui::new_spinner("Fetching data...");
    let result = build_dashboard(provider, &request).await;
    spinner.finish_and_clear();

    let dashboard = match result {
        Ok(dashboard) => dashboard,
        Err(DashboardError::EmptyResult { ticker }) => {
            debug!(%ticker, "Empty result");
            println!("{}", ui::error_notice(EMPTY_RESULT_NOTICE));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", render_dashboard(&dashboard, options.show_fundamentals));

    if let Some(dir) = &options.export_dir {
        let written = export::write_dashboard(&dashboard, dir)?;
        info!(files = written.len(), "Exported charts to {}", dir.display());
        println!(
            "\n{}",
            ui::style_text(
                &format!("Charts exported to {}", dir.display()),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

/// Renders every panel of `dashboard`, in order, as terminal text.
pub fn render_dashboard(dashboard: &Dashboard, show_fundamentals: bool) -> String {
    let width = ui::terminal_width();
    let mut sections = Vec::new();
    for panel in dashboard.panels() {
        sections.push(render_panel(&panel, width));
        if show_fundamentals && matches!(panel, Panel::Ratios(_)) {
            sections.push(render_fundamentals(&dashboard.fundamentals));
        }
    }
    let separator = format!("{}\n\n", ui::separator());
    sections.join(separator.as_str())
}

fn render_panel(panel: &Panel<'_>, width: usize) -> String {
    match panel {
        Panel::Title(ticker) => {
            ui::style_text(&format!("{ticker} Stock Data"), ui::StyleType::Title)
        }
        Panel::Preview(rows) => render_preview(rows),
        Panel::Metrics(metrics) => render_metrics(metrics),
        Panel::Line(chart) => charts::render_line_chart(chart, width),
        Panel::Ratios(ratios) => render_ratios(ratios),
        Panel::Candlestick(chart) => charts::render_candlesticks(chart),
        Panel::VolumeHistogram(histogram) => charts::render_histogram(histogram, width),
        Panel::Heatmap(heatmap) => charts::render_heatmap(heatmap),
    }
}

fn render_preview(rows: &[PriceBar]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Open"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Close"),
        ui::header_cell("Volume"),
    ]);
    for bar in rows {
        table.add_row(vec![
            Cell::new(bar.date.to_string()),
            ui::number_cell(format!("{:.2}", bar.open)),
            ui::number_cell(format!("{:.2}", bar.high)),
            ui::number_cell(format!("{:.2}", bar.low)),
            ui::number_cell(format!("{:.2}", bar.close)),
            ui::number_cell(bar.volume.to_string()),
        ]);
    }
    table.to_string()
}

fn render_metrics(metrics: &SummaryMetrics) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Current Price"),
        ui::number_cell(format!("${:.2}", metrics.latest_close)),
    ]);
    table.add_row(vec![
        Cell::new("52-Week High"),
        ui::number_cell(format!("${:.2}", metrics.period_high)),
    ]);
    table.add_row(vec![
        Cell::new("52-Week Low"),
        ui::number_cell(format!("${:.2}", metrics.period_low)),
    ]);
    table.add_row(vec![
        Cell::new("Average Volume"),
        ui::number_cell(format!("{:.2}", metrics.average_volume)),
    ]);
    table.add_row(vec![
        Cell::new(format!("{}-Day Return", metrics.return_window)),
        ui::change_cell(metrics.period_return),
    ]);

    format!(
        "{}\n\n{table}",
        ui::style_text("Important Metrics", ui::StyleType::Subtitle)
    )
}

fn render_ratios(ratios: &RatioSet) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Ratio"), ui::header_cell("Value")]);
    for (name, value) in ratios.rows() {
        table.add_row(vec![
            Cell::new(name),
            ui::format_optional_cell(value.as_f64(), |v| format!("{v:.2}")),
        ]);
    }
    format!(
        "{}\n\n{table}",
        ui::style_text("Financial Ratios", ui::StyleType::Subtitle)
    )
}

fn render_fundamentals(fundamentals: &FundamentalTables) -> String {
    let mut out = ui::style_text("Fundamentals (latest period)", ui::StyleType::Subtitle);
    for (name, statement) in fundamentals.named() {
        out.push_str("\n\n");
        let Some((period, items)) = statement.latest() else {
            out.push_str(&ui::style_text(
                &format!("{name}: not available"),
                ui::StyleType::Subtle,
            ));
            continue;
        };

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell(&format!("{name} ({period})")),
            ui::header_cell("Value"),
        ]);
        for (item, value) in items.iter().take(FUNDAMENTAL_ITEMS) {
            table.add_row(vec![Cell::new(item), ui::number_cell(format!("{value:.0}"))]);
        }
        out.push_str(&table.to_string());
    }
    out
}
