use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::customers::dtos::CustomerResponseDto;
use crate::features::notes::dtos::NoteResponseDto;
use crate::features::tickets::dtos::TicketResponseDto;
use crate::features::users::dtos::UserExportDto;
use crate::shared::types::DateRange;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Query parameters accepted by the export endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// `csv` or `json`
    pub format: Option<ExportFormat>,
    /// Append notes to each exported record
    pub include_notes: Option<bool>,
    /// Lower creation bound (RFC 3339); ignored unless `end_date` is also set
    pub start_date: Option<DateTime<Utc>>,
    /// Upper creation bound (RFC 3339); ignored unless `start_date` is also set
    pub end_date: Option<DateTime<Utc>>,
}

impl ExportQuery {
    pub fn into_options(self, default_format: ExportFormat) -> ExportOptions {
        ExportOptions {
            format: self.format.unwrap_or(default_format),
            include_notes: self.include_notes.unwrap_or(false),
            range: DateRange::from_bounds(self.start_date, self.end_date),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub include_notes: bool,
    pub range: Option<DateRange>,
}

/// Customer record in a JSON export
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerExportDto {
    #[serde(flatten)]
    pub customer: CustomerResponseDto,
    pub ticket_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<Vec<NoteResponseDto>>,
}

/// Ticket record in a JSON export
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketExportDto {
    #[serde(flatten)]
    pub ticket: TicketResponseDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<NoteResponseDto>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExportedDataDto {
    pub customers: Vec<CustomerExportDto>,
    pub tickets: Vec<TicketExportDto>,
    pub users: Vec<UserExportDto>,
}

/// Body of the full JSON export
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FullExportDto {
    pub export_date: DateTime<Utc>,
    pub data: ExportedDataDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExportStatsDto {
    pub total_customers: i64,
    pub total_tickets: i64,
    pub total_users: i64,
    /// Rough size of a full export, e.g. `1.5 KB`
    pub estimated_export_size: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_and_half_open_range() {
        let query = ExportQuery {
            start_date: Some(Utc::now()),
            ..Default::default()
        };

        let options = query.into_options(ExportFormat::Csv);

        assert_eq!(options.format, ExportFormat::Csv);
        assert!(!options.include_notes);
        assert!(options.range.is_none());
    }

    #[test]
    fn test_format_parses_lowercase() {
        let format: ExportFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, ExportFormat::Json);
        assert_eq!(format.content_type(), "application/json");
    }
}
