// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Input validation for names and descriptions.

use thiserror::Error;

/// Minimum length of a name field, in characters.
pub const MIN_NAME_LENGTH: usize = 2;
/// Maximum length of a name field, in characters.
pub const MAX_NAME_LENGTH: usize = 100;
/// Minimum length of an activity type description.
pub const MIN_DESCRIPTION_LENGTH: usize = 10;
/// Maximum length of an activity type description.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

const FORBIDDEN_CHARS: [char; 5] = ['<', '>', '"', '\'', '&'];

/// Input validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(String),

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{0} contains invalid characters")]
    InvalidCharacters(String),
}

/// Validates a name field and returns it trimmed.
pub fn validate_name(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(ValidationError::Required(field.to_string()));
    }
    if len < MIN_NAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: MIN_NAME_LENGTH,
        });
    }
    if len > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    if trimmed.contains(&FORBIDDEN_CHARS[..]) {
        return Err(ValidationError::InvalidCharacters(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Validates an activity type description and returns it trimmed.
pub fn validate_description(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(ValidationError::Required("Description".to_string()));
    }
    if len < MIN_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooShort {
            field: "Description".to_string(),
            min: MIN_DESCRIPTION_LENGTH,
        });
    }
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed() {
        assert_eq!(validate_name("First name", "  Jan ").unwrap(), "Jan");
    }

    #[test]
    fn test_empty_name_required() {
        assert_eq!(
            validate_name("First name", "   "),
            Err(ValidationError::Required("First name".into()))
        );
    }

    #[test]
    fn test_single_char_too_short() {
        assert!(matches!(
            validate_name("Last name", "B"),
            Err(ValidationError::TooShort { min: 2, .. })
        ));
    }

    #[test]
    fn test_long_name_rejected() {
        let long = "a".repeat(101);
        assert!(matches!(
            validate_name("Last name", &long),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn test_markup_rejected() {
        assert_eq!(
            validate_name("First name", "<b>Jan"),
            Err(ValidationError::InvalidCharacters("First name".into()))
        );
    }

    #[test]
    fn test_accented_names_count_characters() {
        assert_eq!(validate_name("First name", "Zoë").unwrap(), "Zoë");
    }

    #[test]
    fn test_description_bounds() {
        assert!(validate_description("too short").is_err());
        assert!(validate_description("Weekly walk in the park").is_ok());
    }
}
