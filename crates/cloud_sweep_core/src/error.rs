use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    /// A page of a remote inventory could not be fetched. Pages are 1-based.
    #[error("failed to fetch inventory page {page}: {message}")]
    PageFetch { page: usize, message: String },
    #[error("continuation token '{token}' repeated after page {page}")]
    PaginationLoop { page: usize, token: String },
    #[error("retention_days must be a positive whole number of days, got {0}")]
    InvalidRetention(i64),
}
