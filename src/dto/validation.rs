//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::services::join_code::{JOIN_CODE_LENGTH, normalize_code};

/// Validates that a join code is [`JOIN_CODE_LENGTH`] ASCII alphanumerics once trimmed.
///
/// Case is ignored; codes are upper-cased before lookup.
///
/// # Examples
///
/// ```ignore
/// validate_join_code("ab12")   // Ok
/// validate_join_code(" AB12 ") // Ok - surrounding whitespace is ignored
/// validate_join_code("AB1")    // Err - too short
/// ```
pub fn validate_join_code(code: &str) -> Result<(), ValidationError> {
    let code = normalize_code(code);
    if code.chars().count() != JOIN_CODE_LENGTH {
        let mut err = ValidationError::new("join_code_length");
        err.message = Some(
            format!(
                "Join code must be exactly {JOIN_CODE_LENGTH} characters (got {})",
                code.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("join_code_format");
        err.message = Some("Join code must contain only letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_join_code_valid() {
        assert!(validate_join_code("AB12").is_ok());
        assert!(validate_join_code("ab12").is_ok());
        assert!(validate_join_code("  zz99\n").is_ok());
    }

    #[test]
    fn test_validate_join_code_invalid_length() {
        assert!(validate_join_code("AB1").is_err());
        assert!(validate_join_code("AB123").is_err());
        assert!(validate_join_code("").is_err());
    }

    #[test]
    fn test_validate_join_code_invalid_format() {
        assert!(validate_join_code("AB-1").is_err());
        assert!(validate_join_code("A B1").is_err());
        assert!(validate_join_code("ÀB12").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Ada").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
