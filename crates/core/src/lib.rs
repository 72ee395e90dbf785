//! Shared primitives for all Rust crates in quotagate.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across quotagate crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller could not be authenticated (bad or missing signature).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller exhausted its usage quota.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A required piece of server configuration is absent.
    #[error("server configuration error: {0}")]
    Configuration(String),

    /// An external store could not be reached in time.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable machine-readable code for this error category.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Configuration(_) => "SERVER_CONFIGURATION",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn rate_limited_error_has_stable_code() {
        let error = AppError::RateLimited("daily limit reached".to_owned());
        assert_eq!(error.code(), "RATE_LIMITED");
        assert_eq!(error.to_string(), "rate limited: daily limit reached");
    }

    #[test]
    fn configuration_error_code_differs_from_internal() {
        assert_eq!(
            AppError::Configuration("secret".to_owned()).code(),
            "SERVER_CONFIGURATION"
        );
        assert_eq!(AppError::Internal("boom".to_owned()).code(), "INTERNAL");
    }
}
