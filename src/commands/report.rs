use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;

use hubstats::analytics::{top_categories, Dashboard};
use hubstats::config::Config;
use hubstats::engine::{BindReport, Session};
use hubstats::models::CategoryCount;
use hubstats::utils::{bar, format_thousands, percentage, truncate_text};

use super::OutputFormat;

const BAR_WIDTH: usize = 40;
const LABEL_WIDTH: usize = 24;

#[derive(Serialize)]
struct ReportOutput<'a> {
    rows: &'a BindReport,
    #[serde(flatten)]
    dashboard: &'a Dashboard,
}

pub async fn report(config: Config, format: OutputFormat, top: usize) -> Result<()> {
    let session = Session::open(&config)
        .await
        .context("Failed to open analytics session")?;

    let dashboard = Dashboard::compute(session.shared_engine())
        .await
        .context("Failed to compute dashboard")?;

    match format {
        OutputFormat::Json => {
            let output = ReportOutput {
                rows: session.report(),
                dashboard: &dashboard,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print!("{}", render_text(session.report(), &dashboard, top)),
    }

    session.close();
    Ok(())
}

fn render_text(rows: &BindReport, dashboard: &Dashboard, top: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Hub Snapshot Report");
    let _ = writeln!(out, "===================");
    let _ = writeln!(
        out,
        "  Models: {} | Datasets: {} | Spaces: {}",
        format_thousands(rows.models as u64),
        format_thousands(rows.datasets as u64),
        format_thousands(rows.spaces as u64)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Monthly Creations");
    let _ = writeln!(out, "-----------------");
    if dashboard.trends.is_empty() {
        let _ = writeln!(out, "  (no entities)");
    }
    let peak = dashboard.trends.iter().map(|m| m.total()).max().unwrap_or(0);
    for month in &dashboard.trends {
        let _ = writeln!(
            out,
            "  {}  models {:>7}  datasets {:>7}  spaces {:>7}  {}",
            month.month,
            format_thousands(month.model_count),
            format_thousands(month.dataset_count),
            format_thousands(month.space_count),
            bar(month.total(), peak, BAR_WIDTH)
        );
    }

    render_distribution(&mut out, "Model Licenses", &dashboard.model_licenses, top);
    render_distribution(&mut out, "Dataset Licenses", &dashboard.dataset_licenses, top);
    render_distribution(&mut out, "Space SDKs", &dashboard.space_sdks, top);

    out
}

fn render_distribution(out: &mut String, title: &str, counts: &[CategoryCount], top: usize) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.len()));

    if counts.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }

    let total: u64 = counts.iter().map(|c| c.count).sum();
    for category in top_categories(counts, top) {
        let _ = writeln!(
            out,
            "  {:<width$} {:>9} {:>6.1}%",
            truncate_text(&category.label, LABEL_WIDTH),
            format_thousands(category.count),
            percentage(category.count, total),
            width = LABEL_WIDTH
        );
    }
}
