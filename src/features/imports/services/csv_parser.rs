use csv::{ByteRecord, ReaderBuilder};

use crate::core::error::{AppError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A CSV document split into its header row and data rows.
///
/// Every row has at most one cell per header; cells past the last header are
/// dropped and missing trailing cells read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedCsv {
    /// Cell `index` of data row `row`
    pub fn cell(&self, row: usize, index: usize) -> Option<&str> {
        self.rows.get(row)?.get(index).map(String::as_str)
    }
}

/// Parse raw upload bytes. Invalid UTF-8 is replaced rather than rejected and
/// a leading byte-order mark is ignored.
pub fn parse_csv(bytes: &[u8]) -> Result<ParsedCsv> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(parse_error)?
        .iter()
        .map(lossy)
        .collect();

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record).map_err(parse_error)? {
        rows.push(record.iter().take(headers.len()).map(lossy).collect());
    }

    Ok(ParsedCsv { headers, rows })
}

fn lossy(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

fn parse_error(e: csv::Error) -> AppError {
    AppError::BadRequest(format!("CSV parsing failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_quoted_fields() {
        let parsed =
            parse_csv(b"Name,Email,Phone,Company\n\"Doe, John\",\"john@example.com\",555,Acme\n")
                .unwrap();

        assert_eq!(parsed.headers, vec!["Name", "Email", "Phone", "Company"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.cell(0, 0), Some("Doe, John"));
        assert_eq!(parsed.cell(0, 3), Some("Acme"));
    }

    #[test]
    fn test_ragged_rows_are_aligned_to_headers() {
        let parsed = parse_csv(b"Name,Email\nJohn\nJane,jane@example.com,extra\n").unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.cell(0, 1), None);
        assert_eq!(parsed.rows[1], vec!["Jane", "jane@example.com"]);
    }

    #[test]
    fn test_bom_and_crlf_are_tolerated() {
        let parsed = parse_csv(b"\xEF\xBB\xBFName,Email\r\nJohn,john@example.com\r\n").unwrap();

        assert_eq!(parsed.headers[0], "Name");
        assert_eq!(parsed.cell(0, 1), Some("john@example.com"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let parsed = parse_csv(b"Name\nJos\xE9\n").unwrap();
        assert_eq!(parsed.cell(0, 0), Some("Jos\u{FFFD}"));
    }

    #[test]
    fn test_header_only_and_empty_input_have_no_rows() {
        assert!(parse_csv(b"Name,Email\n").unwrap().rows.is_empty());
        assert_eq!(parse_csv(b"").unwrap(), ParsedCsv::default());
    }
}
