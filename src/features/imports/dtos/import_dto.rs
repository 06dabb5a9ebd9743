use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::customers::models::Customer;

/// Multipart form for CSV uploads (OpenAPI documentation only)
///
/// The handler reads the body with axum's Multipart extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ImportUploadDto {
    /// CSV file with a header row
    #[schema(format = Binary, content_media_type = "text/csv")]
    pub file: String,
}

/// A customer created by an import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportedCustomerDto {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
}

impl From<Customer> for ImportedCustomerDto {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            company: c.company,
        }
    }
}

/// Outcome of a CSV import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportResultDto {
    /// True when at least one customer was created
    pub success: bool,
    pub imported: usize,
    /// Rows rejected by validation plus rows whose creation failed
    pub failed: usize,
    pub errors: Vec<String>,
    pub customers: Vec<ImportedCustomerDto>,
}

impl ImportResultDto {
    /// A result for a file that could not be imported at all
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            imported: 0,
            failed: 0,
            errors: vec![error.into()],
            customers: Vec::new(),
        }
    }
}
