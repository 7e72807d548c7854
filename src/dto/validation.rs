//! Validation helpers for DTOs.

use validator::ValidationError;

/// Number of characters in a pairing code.
pub const PAIRING_CODE_LEN: usize = 6;

/// Normalizes raw operator input into pairing-code form: uppercased, stripped
/// of any character outside `[A-Z0-9]`, truncated to 6 characters.
///
/// # Examples
///
/// ```ignore
/// normalize_pairing_code("abc-123")   // "ABC123"
/// normalize_pairing_code(" ab c1 ")   // "ABC1"
/// normalize_pairing_code("abcd12345") // "ABCD12"
/// ```
pub fn normalize_pairing_code(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| {
            let upper = c.to_ascii_uppercase();
            upper.is_ascii_alphanumeric().then_some(upper)
        })
        .take(PAIRING_CODE_LEN)
        .collect()
}

/// Validates that a pairing code is exactly 6 uppercase alphanumeric characters.
pub fn validate_pairing_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != PAIRING_CODE_LEN {
        let mut err = ValidationError::new("pairing_code_length");
        err.message = Some(
            format!("Pairing code must be exactly {PAIRING_CODE_LEN} characters (got {})", code.len())
                .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        let mut err = ValidationError::new("pairing_code_format");
        err.message =
            Some("Pairing code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uppercases_and_strips() {
        assert_eq!(normalize_pairing_code("abc123"), "ABC123");
        assert_eq!(normalize_pairing_code("ab-c 12!3"), "ABC123");
        assert_eq!(normalize_pairing_code(""), "");
        assert_eq!(normalize_pairing_code("---"), "");
    }

    #[test]
    fn test_normalize_truncates_to_six() {
        assert_eq!(normalize_pairing_code("abcdef123456"), "ABCDEF");
        assert_eq!(normalize_pairing_code("a1b2c3d4"), "A1B2C3");
    }

    #[test]
    fn test_normalize_output_is_always_valid_charset() {
        for raw in ["héllo wörld", "\u{1F600}\u{1F600}abc", "a b c d e f g", "!@#$%^"] {
            let normalized = normalize_pairing_code(raw);
            assert!(normalized.len() <= PAIRING_CODE_LEN);
            assert!(
                normalized
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            );
        }
    }

    #[test]
    fn test_validate_pairing_code_valid() {
        assert!(validate_pairing_code("ABC123").is_ok());
        assert!(validate_pairing_code("ZZZZZZ").is_ok());
        assert!(validate_pairing_code("234567").is_ok());
    }

    #[test]
    fn test_validate_pairing_code_invalid_length() {
        assert!(validate_pairing_code("ABC12").is_err()); // too short
        assert!(validate_pairing_code("ABC1234").is_err()); // too long
        assert!(validate_pairing_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_pairing_code_invalid_format() {
        assert!(validate_pairing_code("abc123").is_err()); // lowercase
        assert!(validate_pairing_code("ABC 12").is_err()); // space
        assert!(validate_pairing_code("ABC-12").is_err()); // punctuation
    }
}
