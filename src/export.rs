use crate::models::NewsRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 6] = ["id", "title_english", "title_arabic", "category", "date", "image"];

/// Writes records as CSV, one row per record. Descriptions are left out.
pub fn export_csv<W: Write>(records: &[NewsRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for record in records {
        let date = record
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        csv.write_record([
            record.id.to_string().as_str(),
            record.title_english.as_str(),
            record.title_arabic.as_str(),
            record.category.label(),
            date.as_str(),
            record.image.as_deref().unwrap_or(""),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn export_to_path(records: &[NewsRecord], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    export_csv(records, file)
        .with_context(|| format!("Failed to write export file: {}", path.display()))
}
