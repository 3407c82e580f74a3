use anyhow::{Context, Result};
use std::fmt::Write as _;

use hubstats::analytics::{growth_series_now, BaseIdentifier};
use hubstats::config::Config;
use hubstats::engine::Session;
use hubstats::models::GrowthSeries;
use hubstats::utils::{bar, format_thousands};

use super::OutputFormat;

const BAR_WIDTH: usize = 40;

pub async fn growth(config: Config, base: String, format: OutputFormat) -> Result<()> {
    // Reject bad identifiers before touching any source
    let base = BaseIdentifier::parse(&base)?;

    let session = Session::open(&config)
        .await
        .context("Failed to open analytics session")?;

    let engine = session.shared_engine();
    let query_base = base.clone();
    let series = tokio::task::spawn_blocking(move || growth_series_now(engine.as_ref(), &query_base))
        .await
        .context("Growth task panicked")?
        .with_context(|| format!("Failed to compute growth for {base}"))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
        OutputFormat::Text => print!("{}", render_text(&series)),
    }

    session.close();
    Ok(())
}

fn render_text(series: &GrowthSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Models derived from {}", series.base);
    let _ = writeln!(out, "{}", "=".repeat(20 + series.base.len()));

    if series.is_empty() {
        let _ = writeln!(out, "  No models reference this base.");
        return out;
    }

    let total = series.total();
    for point in &series.points {
        let _ = writeln!(
            out,
            "  {}  {:>9}  {}",
            point.month,
            format_thousands(point.cumulative_count),
            bar(point.cumulative_count, total, BAR_WIDTH)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  Total: {}", format_thousands(total));
    out
}
