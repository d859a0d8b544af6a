//! Result type alias for esdump

use super::errors::DumpError;

/// Result type alias for esdump operations
///
/// # Examples
///
/// ```
/// use esdump::domain::result::Result;
/// use esdump::domain::errors::DumpError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DumpError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DumpError>;
