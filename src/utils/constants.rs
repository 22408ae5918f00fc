// src/utils/constants.rs

/// Number of upsert statements executed per transaction.
pub const BATCH_DB_OPS_SIZE: usize = 500;

/// Attempts made against the sheet source before a sync run gives up.
pub const SHEET_FETCH_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between sheet fetch attempts.
pub const SHEET_FETCH_BACKOFF_MS: u64 = 500;

/// Year whose figures are summed by the enrichment read path when no range is given.
pub const DEFAULT_ENRICHMENT_YEAR: i32 = 2024;

/// Default year window for the series graph.
pub const DEFAULT_SERIES_START_YEAR: i32 = 2020;
pub const DEFAULT_SERIES_END_YEAR: i32 = 2024;

/// Bounds accepted for client `startYear` / `endYear`.
pub const MIN_REQUEST_YEAR: i32 = 1900;
pub const MAX_REQUEST_YEAR: i32 = 2100;

/// Sentinel system name that switches the series graph into aggregate mode.
pub const TOTAL_SENTINEL: &str = "total";

/// Geography bucket for series rows without a geographic reach.
pub const UNKNOWN_GEOGRAPHY: &str = "UNKNOWN";

/// Minimum length of a name search term.
pub const MIN_SEARCH_TERM_LEN: usize = 2;

/// Shortest canonical name allowed to win through substring containment.
/// Shorter strings ("fr", "ips") are contained in too many unrelated names.
pub const MIN_CONTAINMENT_LEN: usize = 4;
