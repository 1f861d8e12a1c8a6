/// Surrogate primary keys and per-user sequence numbers are PostgreSQL BIGINT.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
