//! Result type alias for hl7stage

use super::errors::StageError;

/// Result type alias for hl7stage operations
///
/// # Examples
///
/// ```
/// use hl7stage::domain::result::Result;
/// use hl7stage::domain::errors::StageError;
///
/// fn failing_function() -> Result<()> {
///     Err(StageError::Event("no records".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, StageError>;

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
        let result: Result<i32> = Err(StageError::Other("test error".to_string()));
        assert!(result.is_err());
    }
}
