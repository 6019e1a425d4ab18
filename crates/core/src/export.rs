use crate::record::RenameResult;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const CSV_HEADER: [&str; 2] = ["Original Name", "New Name"];

pub fn default_export_file_name(date: NaiveDate) -> String {
    format!("rename_preview_{}.csv", date.format("%Y-%m-%d"))
}

/// Writes one `old,new` row per result under a header row. Fields with commas
/// or quotes are quoted.
pub fn export_csv<W: Write>(results: &[RenameResult], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)
        .context("failed to write CSV header")?;
    for result in results {
        wtr.write_record([result.old.as_str(), result.new.as_str()])
            .with_context(|| format!("failed to write CSV row for {}", result.old))?;
    }
    wtr.flush().context("failed to flush CSV output")?;
    Ok(())
}

pub fn export_csv_file(results: &[RenameResult], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create export file: {}", path.display()))?;
    export_csv(results, file)
}

pub fn export_json<W: Write>(results: &[RenameResult], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, results).context("failed to serialize rename results")?;
    Ok(())
}
