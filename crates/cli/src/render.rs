//! Report rendering: text table, CSV, JSON and the standalone HTML file.
//!
//! Everything here consumes the already-computed match results and totals;
//! no matching logic lives in this module.

use std::io::Write;

use anyhow::Result;
use cachefit::{MatchResult, ReportTotals};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Load ratios at or above this are flagged in table and HTML output.
const HIGH_LOAD_PERCENT: f64 = 95.0;

/// Output format for stdout reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted text table (default)
    #[default]
    Table,
    /// CSV rows
    Csv,
    /// JSON document
    Json,
}

/// Run parameters echoed into the HTML report caption.
pub struct ReportParams {
    pub region: String,
    pub max_load_percent: u32,
    pub reserved_memory_percent: u32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "HOST")]
    host: String,
    #[tabled(rename = "USED GiB (LOAD)")]
    used: String,
    #[tabled(rename = "TYPE")]
    used_type: String,
    #[tabled(rename = "$/HR")]
    used_hourly: String,
    #[tabled(rename = "$/MONTH")]
    used_monthly: String,
    #[tabled(rename = "PEAK GiB (LOAD)")]
    peak: String,
    #[tabled(rename = "TYPE")]
    peak_type: String,
    #[tabled(rename = "$/HR")]
    peak_hourly: String,
    #[tabled(rename = "$/MONTH")]
    peak_monthly: String,
}

/// Serializable shape of one result row for the JSON report.
#[derive(Serialize)]
struct JsonRow {
    host: String,
    used_gib: f64,
    used_load_percent: f64,
    used_based_type: String,
    used_based_price_per_hour: f64,
    used_based_price_per_month: f64,
    peak_gib: f64,
    peak_load_percent: f64,
    peak_based_type: String,
    peak_based_price_per_hour: f64,
    peak_based_price_per_month: f64,
}

#[derive(Serialize)]
struct JsonReport {
    rows: Vec<JsonRow>,
    used_based_monthly_total: f64,
    peak_based_monthly_total: f64,
}

impl JsonRow {
    fn from_result(row: &MatchResult) -> Self {
        Self {
            host: row.stats.addr.clone(),
            used_gib: row.stats.used_gib(),
            used_load_percent: row.used_ratio,
            used_based_type: row.used_based.instance_type.clone(),
            used_based_price_per_hour: row.used_based.price_per_hour,
            used_based_price_per_month: row.used_based.price_per_month(),
            peak_gib: row.stats.peak_gib(),
            peak_load_percent: row.peak_ratio,
            peak_based_type: row.peak_based.instance_type.clone(),
            peak_based_price_per_hour: row.peak_based.price_per_hour,
            peak_based_price_per_month: row.peak_based.price_per_month(),
        }
    }
}

/// Print the report to stdout in the requested format.
pub fn print_report(
    results: &[MatchResult],
    totals: ReportTotals,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print_table(results, totals);
            Ok(())
        }
        OutputFormat::Csv => write_csv(std::io::stdout().lock(), results),
        OutputFormat::Json => {
            println!("{}", render_json(results, totals)?);
            Ok(())
        }
    }
}

fn print_table(results: &[MatchResult], totals: ReportTotals) {
    if results.is_empty() {
        println!("{}", "No servers matched".yellow());
        return;
    }
    let rows: Vec<ReportRow> = results
        .iter()
        .map(|row| ReportRow {
            host: row.stats.addr.clone(),
            used: load_cell(row.stats.used_gib(), row.used_ratio),
            used_type: row.used_based.instance_type.clone(),
            used_hourly: format!("{:.3}", row.used_based.price_per_hour),
            used_monthly: format!("{:.3}", row.used_based.price_per_month()),
            peak: load_cell(row.stats.peak_gib(), row.peak_ratio),
            peak_type: row.peak_based.instance_type.clone(),
            peak_hourly: format!("{:.3}", row.peak_based.price_per_hour),
            peak_monthly: format!("{:.3}", row.peak_based.price_per_month()),
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!(
        "Totals: {} used-based, {} peak-based (USD/month)",
        format!("{:.3}", totals.used_based_monthly).bold(),
        format!("{:.3}", totals.peak_based_monthly).bold(),
    );
}

fn load_cell(gib: f64, ratio: f64) -> String {
    let cell = format!("{gib:.1} ({ratio:.1}%)");
    if ratio >= HIGH_LOAD_PERCENT {
        cell.red().to_string()
    } else {
        cell
    }
}

/// Write the report rows as CSV.
pub fn write_csv<W: Write>(writer: W, results: &[MatchResult]) -> Result<()> {
    let mut wr = csv::Writer::from_writer(writer);
    wr.write_record([
        "host",
        "used memory (gib)",
        "used load (percent)",
        "instance type (used-based)",
        "instance memory (used-based)",
        "usd/hour (used-based)",
        "usd/month (used-based)",
        "peak memory (gib)",
        "peak load (percent)",
        "instance type (peak-based)",
        "instance memory (peak-based)",
        "usd/hour (peak-based)",
        "usd/month (peak-based)",
    ])?;
    for row in results {
        wr.write_record([
            row.stats.addr.clone(),
            format!("{:.2}", row.stats.used_gib()),
            format!("{:.1}", row.used_ratio),
            row.used_based.instance_type.clone(),
            format!("{:.2}", row.used_based.capacity_gib()),
            format!("{:.3}", row.used_based.price_per_hour),
            format!("{:.3}", row.used_based.price_per_month()),
            format!("{:.2}", row.stats.peak_gib()),
            format!("{:.1}", row.peak_ratio),
            row.peak_based.instance_type.clone(),
            format!("{:.2}", row.peak_based.capacity_gib()),
            format!("{:.3}", row.peak_based.price_per_hour),
            format!("{:.3}", row.peak_based.price_per_month()),
        ])?;
    }
    wr.flush()?;
    Ok(())
}

/// Render the report as a pretty-printed JSON document.
pub fn render_json(results: &[MatchResult], totals: ReportTotals) -> Result<String> {
    let report = JsonReport {
        rows: results.iter().map(JsonRow::from_result).collect(),
        used_based_monthly_total: totals.used_based_monthly,
        peak_based_monthly_total: totals.peak_based_monthly,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Render a standalone HTML report page.
pub fn render_html(
    results: &[MatchResult],
    totals: ReportTotals,
    params: &ReportParams,
) -> String {
    let mut body = String::new();
    for row in results {
        let used_class = ratio_class(row.used_ratio);
        let peak_class = ratio_class(row.peak_ratio);
        body.push_str(&format!(
            "<tr>\
             <td>{host}</td>\
             <td class=\"right\">{used:.1}</td>\
             <td class=\"right\">{peak:.1}</td>\
             <td>{ut}</td><td class=\"right{used_class}\">{ur:.1}</td>\
             <td class=\"right\">{uh:.3}</td><td class=\"right\">{um:.3}</td>\
             <td>{pt}</td><td class=\"right{peak_class}\">{pr:.1}</td>\
             <td class=\"right\">{ph:.3}</td><td class=\"right\">{pm:.3}</td>\
             </tr>\n",
            host = escape_html(&row.stats.addr),
            used = row.stats.used_gib(),
            peak = row.stats.peak_gib(),
            ut = escape_html(&row.used_based.instance_type),
            ur = row.used_ratio,
            uh = row.used_based.price_per_hour,
            um = row.used_based.price_per_month(),
            pt = escape_html(&row.peak_based.instance_type),
            pr = row.peak_ratio,
            ph = row.peak_based.price_per_hour,
            pm = row.peak_based.price_per_month(),
        ));
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Cache instance sizing report</title>
<style>
 body {{font-family: sans-serif;}}
 table {{border-collapse: collapse;}}
 td, th {{border: 1px solid #ccc; padding: 0.3em 0.6em;}}
 th {{background-color: #eee;}}
 .right {{text-align: right;}}
 .warn {{color: darkred;}}
 tfoot td {{font-weight: bold;}}
</style>
</head>
<body>
<table>
<caption>Estimate on cache instances required to cover the measured servers,<br>
memory readings from {time} UTC, {max_load}% max memory load target,<br>
reserved-memory-percent={reserved}, on-demand prices for {region}</caption>
<thead>
<tr>
 <th rowspan="2">Server</th><th rowspan="2">Used, GiB</th><th rowspan="2">Peak, GiB</th>
 <th colspan="4">Based on used memory</th>
 <th colspan="4">Based on peak memory</th>
</tr>
<tr>
 <th>Node type</th><th>Load, %</th><th>USD/hour</th><th>USD/month</th>
 <th>Node type</th><th>Load, %</th><th>USD/hour</th><th>USD/month</th>
</tr>
</thead>
<tbody>
{body}</tbody>
<tfoot>
<tr>
 <th scope="row" colspan="3">Totals, USD/month</th>
 <td colspan="4" class="right">{used_total:.3} (used-based)</td>
 <td colspan="4" class="right">{peak_total:.3} (peak-based)</td>
</tr>
</tfoot>
</table>
</body>
</html>
"#,
        time = params.generated_at.format("%Y-%m-%d %H:%M"),
        max_load = params.max_load_percent,
        reserved = params.reserved_memory_percent,
        region = escape_html(&params.region),
        body = body,
        used_total = totals.used_based_monthly,
        peak_total = totals.peak_based_monthly,
    )
}

fn ratio_class(ratio: f64) -> &'static str {
    if ratio >= HIGH_LOAD_PERCENT {
        " warn"
    } else {
        ""
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Print a warning message to stderr.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachefit::{Offering, ServerStats};

    fn result(addr: &str) -> MatchResult {
        let gib = 1024 * 1024 * 1024;
        let small = Offering {
            instance_type: "cache.x.small".to_string(),
            capacity_bytes: 2 * gib,
            price_per_hour: 0.05,
        };
        let large = Offering {
            instance_type: "cache.x.large".to_string(),
            capacity_bytes: 4 * gib,
            price_per_hour: 0.20,
        };
        MatchResult {
            stats: ServerStats {
                addr: addr.to_string(),
                used_bytes: gib,
                peak_bytes: 3 * gib,
            },
            used_ratio: 50.0,
            peak_ratio: 75.0,
            used_based: small,
            peak_based: large,
        }
    }

    #[test]
    fn test_csv_rows() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[result("cache-1:6379")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("host,used memory (gib)"));
        let row = lines.next().unwrap();
        assert_eq!(
            row,
            "cache-1:6379,1.00,50.0,cache.x.small,2.00,0.050,37.200,3.00,75.0,cache.x.large,4.00,0.200,148.800"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_json_report_shape() {
        let results = [result("cache-1:6379")];
        let totals = ReportTotals::from_results(&results);
        let text = render_json(&results, totals).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["rows"][0]["host"], "cache-1:6379");
        assert_eq!(value["rows"][0]["used_based_type"], "cache.x.small");
        assert!((value["used_based_monthly_total"].as_f64().unwrap() - 37.2).abs() < 1e-9);
        assert!((value["peak_based_monthly_total"].as_f64().unwrap() - 148.8).abs() < 1e-9);
    }

    #[test]
    fn test_html_report_contains_rows_and_totals() {
        let results = [result("cache-1:6379")];
        let totals = ReportTotals::from_results(&results);
        let params = ReportParams {
            region: "us-east-1".to_string(),
            max_load_percent: 80,
            reserved_memory_percent: 25,
            generated_at: Utc::now(),
        };
        let html = render_html(&results, totals, &params);
        assert!(html.contains("cache-1:6379"));
        assert!(html.contains("cache.x.small"));
        assert!(html.contains("37.200 (used-based)"));
        assert!(html.contains("reserved-memory-percent=25"));
    }

    #[test]
    fn test_html_escapes_host_names() {
        let mut row = result("cache-1:6379");
        row.stats.addr = "<script>:1".to_string();
        let totals = ReportTotals::from_results(std::slice::from_ref(&row));
        let params = ReportParams {
            region: "us-east-1".to_string(),
            max_load_percent: 80,
            reserved_memory_percent: 25,
            generated_at: Utc::now(),
        };
        let html = render_html(&[row], totals, &params);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
