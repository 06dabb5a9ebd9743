/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default number of results for customer quick search
pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

/// Default number of entries for the recent activity feed
pub const DEFAULT_RECENT_ACTIVITY_LIMIT: i64 = 20;

/// Customers created within this many days count as "recently added"
pub const RECENT_CUSTOMER_DAYS: i64 = 30;

/// Maximum accepted size of an uploaded CSV file
pub const MAX_IMPORT_FILE_SIZE: usize = 10 * 1024 * 1024;
