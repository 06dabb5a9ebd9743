use super::csv_parser::ParsedCsv;
use super::field_mapping::FieldMapping;
use crate::features::customers::models::NewCustomer;
use crate::shared::validation::{is_valid_email, non_blank};

/// Outcome of validating every data row
#[derive(Debug, Clone, Default)]
pub struct RowValidation {
    /// Rows without errors, in file order
    pub valid: Vec<NewCustomer>,
    /// Number of rows with at least one error
    pub invalid: usize,
    /// One message per problem, prefixed with the 1-based row number
    pub errors: Vec<String>,
}

/// Validate each row independently against the field mapping
pub fn validate_rows(parsed: &ParsedCsv, mapping: &FieldMapping) -> RowValidation {
    let mut result = RowValidation::default();

    for row in 0..parsed.rows.len() {
        let number = row + 1;
        let value = |index: Option<usize>| index.and_then(|i| non_blank(parsed.cell(row, i)));
        let mut row_errors = Vec::new();

        let name = match mapping.name {
            None => {
                row_errors.push(format!("Row {}: Name field not found", number));
                None
            }
            Some(index) => {
                let name = value(Some(index));
                if name.is_none() {
                    row_errors.push(format!("Row {}: Name is required", number));
                }
                name
            }
        };

        let email = value(mapping.email);
        if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            row_errors.push(format!("Row {}: Invalid email format", number));
        }

        match name {
            Some(name) if row_errors.is_empty() => result.valid.push(NewCustomer {
                name,
                email,
                phone: value(mapping.phone),
                company: value(mapping.company),
                notes: None,
            }),
            _ => {
                result.invalid += 1;
                result.errors.extend(row_errors);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::imports::services::{auto_map_fields, parse_csv};

    fn validate(csv: &str) -> RowValidation {
        let parsed = parse_csv(csv.as_bytes()).unwrap();
        let mapping = auto_map_fields(&parsed.headers);
        validate_rows(&parsed, &mapping)
    }

    #[test]
    fn test_invalid_email_rejects_row() {
        let result = validate("Name,Email,Phone,Company\n\"John Doe\",\"bad-email\",\"555\",\"Acme\"\n");

        assert!(result.valid.is_empty());
        assert_eq!(result.invalid, 1);
        assert_eq!(result.errors, vec!["Row 1: Invalid email format"]);
    }

    #[test]
    fn test_valid_row_is_trimmed_and_copied() {
        let result = validate("Name,Email,Phone,Company\n  John Doe , john@example.com ,555, \n");

        assert_eq!(result.invalid, 0);
        let customer = &result.valid[0];
        assert_eq!(customer.name, "John Doe");
        assert_eq!(customer.email.as_deref(), Some("john@example.com"));
        assert_eq!(customer.phone.as_deref(), Some("555"));
        assert_eq!(customer.company, None);
    }

    #[test]
    fn test_missing_name_column_fails_every_row() {
        let result = validate("Email,Company\na@example.com,Acme\nb@example.com,Beta\n");

        assert!(result.valid.is_empty());
        assert_eq!(result.invalid, 2);
        assert_eq!(
            result.errors,
            vec!["Row 1: Name field not found", "Row 2: Name field not found"]
        );
    }

    #[test]
    fn test_row_with_two_problems_counts_once() {
        let result = validate("Name,Email\n,bad\nJane,\n");

        assert_eq!(result.invalid, 1);
        assert_eq!(
            result.errors,
            vec!["Row 1: Name is required", "Row 1: Invalid email format"]
        );
        assert_eq!(result.valid.len(), 1);
        assert_eq!(result.valid[0].email, None);
    }
}
