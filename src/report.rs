use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};
use crate::models::ClassificationResult;

/// Fixed CSV header, written even when there are no rows
pub const CSV_HEADER: [&str; 3] = ["Image Name", "Image Location", "Status"];

/// Write `{output_folder}/{csv_file_name}.csv`, replacing any existing file.
///
/// Fields are quoted only when they contain a delimiter, quote or newline.
pub fn export_csv(
    results: &[ClassificationResult],
    output_folder: &Path,
    csv_file_name: &str,
) -> Result<PathBuf> {
    let csv_path = output_folder.join(format!("{}.csv", csv_file_name));
    let write_err = |e: csv::Error| ScanError::output_write(&csv_path, e.into());

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(&csv_path)
        .map_err(write_err)?;

    writer.write_record(CSV_HEADER).map_err(write_err)?;
    for row in results {
        writer.serialize(row).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| ScanError::output_write(&csv_path, e))?;

    if let Ok(meta) = std::fs::metadata(&csv_path) {
        log::debug!(
            "Wrote {} rows to {} ({:.2} KB)",
            results.len(),
            csv_path.display(),
            meta.len() as f64 / 1024.0
        );
    }

    Ok(csv_path)
}
