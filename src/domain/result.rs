//! Result type alias for Iris
//!
//! This module provides a convenient Result type alias that uses IrisError
//! as the error type.

use super::errors::IrisError;

/// Result type alias for Iris operations
///
/// This is a convenience type alias that uses `IrisError` as the error type.
/// Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use iris::domain::result::Result;
/// use iris::domain::errors::IrisError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(IrisError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, IrisError>;
