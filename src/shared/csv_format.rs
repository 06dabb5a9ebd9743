//! CSV rendering used by the exports and the import sample file.
//!
//! Every field goes through the same quoting rule: a field containing a
//! comma, a double quote, CR or LF is wrapped in double quotes and embedded
//! quotes are doubled (RFC 4180). Records are separated by `\n`.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::core::error::{AppError, Result};

/// Render a header row followed by data rows into a CSV document
pub fn render_csv<I, R, S>(headers: &[&str], rows: I) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(headers).map_err(csv_error)?;
    for row in rows {
        writer.write_record(row).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV output is not valid UTF-8: {}", e)))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Internal(format!("Failed to write CSV: {}", e))
}
