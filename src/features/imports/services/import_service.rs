use std::sync::Arc;

use serde_json::json;

use super::csv_parser::parse_csv;
use super::field_mapping::auto_map_fields;
use super::row_validation::validate_rows;
use crate::core::error::Result;
use crate::features::activities::models::{ActivityType, Actor};
use crate::features::activities::services::ActivityLogger;
use crate::features::customers::CustomerService;
use crate::features::imports::dtos::{ImportResultDto, ImportedCustomerDto};
use crate::shared::csv_format::render_csv;

/// Number of import errors copied into the audit entry
const LOGGED_ERROR_LIMIT: usize = 5;

const SAMPLE_HEADERS: [&str; 4] = ["Name", "Email", "Phone", "Company"];

const SAMPLE_ROWS: [[&str; 4]; 3] = [
    ["John Doe", "john.doe@example.com", "+1-555-0123", "Acme Corp"],
    ["Jane Smith", "jane.smith@example.com", "+1-555-0124", "Tech Solutions"],
    ["Bob Johnson", "bob.johnson@example.com", "+1-555-0125", "Global Industries"],
];

/// Bulk customer import from CSV uploads
pub struct ImportService {
    customers: Arc<CustomerService>,
    activity: ActivityLogger,
}

impl ImportService {
    pub fn new(customers: Arc<CustomerService>, activity: ActivityLogger) -> Self {
        Self {
            customers,
            activity,
        }
    }

    /// Parse, map, validate and create customers row by row. Bad rows and
    /// failed creations are reported in the result and never abort the batch.
    pub async fn import_customers(&self, bytes: &[u8], actor: &Actor) -> ImportResultDto {
        let result = self.run_import(bytes).await;

        tracing::info!(
            "CSV import finished: imported={}, failed={}",
            result.imported,
            result.failed
        );

        let logged_errors: Vec<&String> = result.errors.iter().take(LOGGED_ERROR_LIMIT).collect();
        self.activity.record(
            actor
                .activity(
                    ActivityType::ImportCustomers,
                    format!(
                        "Imported {} customers, {} failed",
                        result.imported, result.failed
                    ),
                )
                .with_metadata(json!({
                    "imported": result.imported,
                    "failed": result.failed,
                    "errors": logged_errors,
                })),
        );

        result
    }

    async fn run_import(&self, bytes: &[u8]) -> ImportResultDto {
        let parsed = match parse_csv(bytes) {
            Ok(parsed) => parsed,
            Err(e) => return ImportResultDto::failure(e.user_message()),
        };

        if parsed.rows.is_empty() {
            return ImportResultDto::failure("CSV file is empty");
        }

        let mapping = auto_map_fields(&parsed.headers);
        tracing::debug!("CSV field mapping: {:?}", mapping);

        let validation = validate_rows(&parsed, &mapping);

        let mut errors = validation.errors;
        let mut failed = validation.invalid;
        let mut customers = Vec::new();

        for row in validation.valid {
            let name = row.name.clone();
            match self.customers.insert(row).await {
                Ok(customer) => customers.push(ImportedCustomerDto::from(customer)),
                Err(e) => {
                    failed += 1;
                    errors.push(format!(
                        "Failed to import customer \"{}\": {}",
                        name,
                        e.user_message()
                    ));
                }
            }
        }

        ImportResultDto {
            success: !customers.is_empty(),
            imported: customers.len(),
            failed,
            errors,
            customers,
        }
    }

    /// Example file with the recognised headers
    pub fn sample_csv(&self) -> Result<String> {
        render_csv(&SAMPLE_HEADERS, SAMPLE_ROWS)
    }
}
