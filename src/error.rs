use thiserror::Error;

/// Error taxonomy for the attendance core. Store-level faults are wrapped in
/// `Store` before they reach the presentation layer; the "already recorded
/// today" case is not an error (see `database::queries::RecordOutcome`).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("operation requires admin access")]
    Unauthorized,

    #[error("account not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_keeps_detail() {
        let err = Error::Validation("month out of range: 13".to_string());
        assert!(err.to_string().contains("month out of range: 13"));
    }

    #[test]
    fn store_errors_convert() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Store(_)));
    }
}
