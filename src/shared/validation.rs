//! Validation Utilities
//!
//! Custom field rules and conversion of `validator` errors into the
//! 422 field-map error body.

use std::collections::HashMap;

use validator::{ValidationError, ValidationErrors};

use super::error::AppError;

/// Convert validation errors to the 422 AppError carrying one message per
/// offending field.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let fields: HashMap<String, String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.clone())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid", field));
            (field.to_string(), message)
        })
        .collect();

    AppError::UnprocessableEntity(fields)
}

/// Email shape rule: must contain `@` and `.`, and the last `.` must come
/// after the `@`. Length limits are handled by `length` attributes.
pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    let at = email.find('@');
    let last_dot = email.rfind('.');

    match (at, last_dot) {
        (Some(at), Some(dot)) if dot > at => Ok(()),
        _ => {
            let mut err = ValidationError::new("email");
            err.message = Some("invalid email".into());
            Err(err)
        }
    }
}

/// Password composition rule: at least one lowercase letter, one uppercase
/// letter and one digit. Length limits are handled by `length` attributes.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lowercase && has_uppercase && has_digit {
        Ok(())
    } else {
        let mut err = ValidationError::new("password");
        err.message = Some(
            "password should have at least 1 uppercase character, 1 lowercase character and 1 number"
                .into(),
        );
        Err(err)
    }
}
