//! Result type alias for the bridge

use super::errors::BridgeError;

/// Result type alias for bridge operations
///
/// # Examples
///
/// ```
/// use redcap_bridge::domain::result::Result;
/// use redcap_bridge::domain::errors::BridgeError;
///
/// fn lookup() -> Result<String> {
///     Ok("greece".to_string())
/// }
///
/// fn failing_lookup() -> Result<()> {
///     Err(BridgeError::Validation("record_id is required".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(BridgeError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
