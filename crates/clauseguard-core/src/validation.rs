//! Input validation.
//!
//! Rejects empty pastes and placeholder text before any analysis runs. The
//! validator returns the trimmed candidate, and that trimmed string is what
//! flows downstream, so evidence offsets index the text callers see.

use thiserror::Error;

/// Minimum number of characters (after trimming) in analyzable text.
pub const MIN_TEXT_LENGTH: usize = 10;

/// Errors from input validation. Always user-correctable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Either 'text' or 'url' must be provided")]
    MissingInput,

    #[error("Text is too short or empty: {actual} characters, at least {min} required")]
    TooShort { min: usize, actual: usize },

    #[error("{} is required", capitalize(.field))]
    Blank { field: &'static str },
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validate a resolved analysis candidate.
///
/// `None` means neither text nor a URL was supplied.
pub fn validate(candidate: Option<&str>) -> Result<String, ValidationError> {
    let candidate = candidate.ok_or(ValidationError::MissingInput)?;
    let trimmed = candidate.trim();
    let actual = trimmed.chars().count();

    if actual < MIN_TEXT_LENGTH {
        tracing::debug!(actual, min = MIN_TEXT_LENGTH, "Rejected short input");
        return Err(ValidationError::TooShort {
            min: MIN_TEXT_LENGTH,
            actual,
        });
    }

    Ok(trimmed.to_string())
}

/// Require a named field to contain something other than whitespace.
pub fn require_non_blank<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input() {
        assert_eq!(validate(None), Err(ValidationError::MissingInput));
    }

    #[test]
    fn test_too_short_after_trim() {
        let result = validate(Some("   short   "));
        assert_eq!(
            result,
            Err(ValidationError::TooShort {
                min: MIN_TEXT_LENGTH,
                actual: 5
            })
        );
    }

    #[test]
    fn test_whitespace_only_is_too_short() {
        assert!(matches!(
            validate(Some(" \n\t ")),
            Err(ValidationError::TooShort { actual: 0, .. })
        ));
    }

    #[test]
    fn test_exact_threshold_passes() {
        assert_eq!(validate(Some("  0123456789 ")).unwrap(), "0123456789");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 9 characters, 18 bytes
        assert!(validate(Some("ééééééééé")).is_err());
    }

    #[test]
    fn test_blank_field_messages() {
        let err = require_non_blank("question", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Question is required");

        let err = require_non_blank("context", "").unwrap_err();
        assert_eq!(err.to_string(), "Context is required");

        assert_eq!(require_non_blank("question", " ok ").unwrap(), " ok ");
    }

    #[test]
    fn test_messages_name_the_constraint() {
        assert!(ValidationError::MissingInput.to_string().contains("'url'"));
        let err = ValidationError::TooShort { min: 10, actual: 3 };
        assert!(err.to_string().contains("at least 10"));
    }
}
