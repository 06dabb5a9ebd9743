use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose email check shared by the customer API and the CSV importer:
    /// something@something.something with no whitespace and a single '@' per side
    /// - Valid: "john@example.com", "a.b+c@mail.co.uk"
    /// - Invalid: "bad-email", "john@example", "john doe@example.com", "@example.com"
    pub static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Trim a value and drop it when nothing is left
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
