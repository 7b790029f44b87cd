//! Convenience result type alias for Y News.

use crate::error::AppError;

/// A specialized `Result` type for Y News operations.
pub type AppResult<T> = Result<T, AppError>;
