pub mod constants;
pub mod csv_format;
pub mod format;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
pub mod validation;
