//! Writes dashboard charts as Plotly figures.

use crate::core::dashboard::Dashboard;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Writes `<chart>.json` for every chart, `fundamentals.json`, and a
/// `dashboard.html` page that draws all charts. Returns the written paths.
pub fn write_dashboard(dashboard: &Dashboard, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut written = Vec::new();
    for chart in dashboard.charts() {
        let path = dir.join(format!("{}.json", chart.file_stem()));
        let body = serde_json::to_string_pretty(&chart.to_plotly())?;
        write_file(&path, &body)?;
        written.push(path);
    }

    let path = dir.join("fundamentals.json");
    write_file(&path, &serde_json::to_string_pretty(&dashboard.fundamentals)?)?;
    written.push(path);

    let path = dir.join("dashboard.html");
    write_file(&path, &render_html(dashboard)?)?;
    written.push(path);

    Ok(written)
}

fn write_file(path: &Path, body: &str) -> Result<()> {
    debug!("Writing {}", path.display());
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

fn render_html(dashboard: &Dashboard) -> Result<String> {
    let mut divs = String::new();
    let mut scripts = String::new();
    for chart in dashboard.charts() {
        let id = chart.file_stem();
        // Keep the figure from closing the <script> element early.
        let figure = serde_json::to_string(&chart.to_plotly())?.replace("</", "<\\/");
        divs.push_str(&format!(
            "<h2>{}</h2>\n<div id=\"{id}\" class=\"chart\"></div>\n",
            html_escape(chart.title())
        ));
        scripts.push_str(&format!(
            "(function () {{ const fig = {figure}; Plotly.newPlot(\"{id}\", fig.data, fig.layout); }})();\n"
        ));
    }

    let m = &dashboard.metrics;
    let ratio_rows: String = dashboard
        .ratios
        .rows()
        .iter()
        .map(|(name, value)| format!("<tr><td>{name}</td><td>{value}</td></tr>"))
        .collect();

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{ticker} Stock Data</title>
<script src="{PLOTLY_CDN}"></script>
<style>body {{ font-family: sans-serif; margin: 2em; }} .chart {{ height: 480px; }} td {{ padding: 0 1em; }}</style>
</head>
<body>
<h1>{ticker} Stock Data</h1>
<h2>Important Metrics</h2>
<table>
<tr><td>Current Price</td><td>${latest:.2}</td></tr>
<tr><td>52-Week High</td><td>${high:.2}</td></tr>
<tr><td>52-Week Low</td><td>${low:.2}</td></tr>
<tr><td>Average Volume</td><td>{volume:.2}</td></tr>
<tr><td>{window}-Day Return</td><td>{ret:.2}</td></tr>
</table>
<h2>Financial Ratios</h2>
<table>
{ratio_rows}
</table>
{divs}<script>
{scripts}</script>
</body>
</html>
"#,
        ticker = html_escape(&dashboard.ticker),
        latest = m.latest_close,
        high = m.period_high,
        low = m.period_low,
        volume = m.average_volume,
        window = m.return_window,
        ret = m.period_return,
    ))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
