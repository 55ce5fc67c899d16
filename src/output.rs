use crate::error::Result;
use crate::reports::ReportBundle;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "wrote CSV table");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

/// Render the first `max_rows` rows as a markdown table.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    println!("{}\n", render_table(rows, max_rows));
}

fn emit_csv<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: &[T],
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    let path = dir.join(name);
    write_csv(&path, rows)?;
    written.push(path);
    Ok(())
}

/// Write every table of a bundle into `dir`, one CSV per table plus
/// `summary.json`. Returns the written paths in a stable order.
pub fn write_bundle(dir: &Path, bundle: &ReportBundle) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for p in &bundle.by_period {
        let metric = bundle.metric.field().header().to_ascii_lowercase();
        let name = format!("top_{}_{}.csv", p.period, metric);
        emit_csv(dir, &name, &p.top_by_metric, &mut written)?;
        let name = format!("top_{}_verified.csv", p.period);
        emit_csv(dir, &name, &p.verified, &mut written)?;
        let name = format!("top_{}_ncns.csv", p.period);
        emit_csv(dir, &name, &p.ncns, &mut written)?;
    }
    for (field, rows) in &bundle.viewed_values {
        let name = format!("viewed_{}_counts.csv", field.header().to_ascii_lowercase());
        emit_csv(dir, &name, rows, &mut written)?;
    }
    emit_csv(dir, "monthly_trend.csv", &bundle.monthly_trend, &mut written)?;
    emit_csv(dir, "ncns_trend.csv", &bundle.ncns_trend, &mut written)?;
    emit_csv(dir, "verified_split.csv", &bundle.verified_split, &mut written)?;
    emit_csv(dir, "ncns_split.csv", &bundle.ncns_split, &mut written)?;
    emit_csv(
        dir,
        "viewed_pay_histogram.csv",
        &bundle.viewed_pay_histogram,
        &mut written,
    )?;
    emit_csv(
        dir,
        "viewed_charge_histogram.csv",
        &bundle.viewed_charge_histogram,
        &mut written,
    )?;
    emit_csv(dir, "pay_rate_by_slot.csv", &bundle.pay_rate_by_slot, &mut written)?;

    let summary = dir.join("summary.json");
    write_json(&summary, &bundle.summary)?;
    written.push(summary);

    Ok(written)
}
