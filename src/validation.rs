//! Field validators shared by the request payloads.
//!
//! Used through `#[validate(custom(function = "..."))]`; each returns the
//! exact message the client sees for that field.

use chrono::NaiveDate;
use model::entities::{Language, Sex};
use std::borrow::Cow;
use validator::{ValidateEmail, ValidationError};

pub const BLANK: &str = "This field may not be blank.";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const PASSWORD_MIN_LENGTH: usize = 8;
const EMAIL_MAX_LENGTH: usize = 100;

fn failure(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(failure("blank", BLANK));
    }
    Ok(())
}

pub fn language_choice(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    match Language::from_code(value) {
        Some(_) => Ok(()),
        None => Err(failure("invalid_choice", format!("\"{}\" is not a valid choice.", value))),
    }
}

pub fn sex_choice(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    match Sex::from_code(value) {
        Some(_) => Ok(()),
        None => Err(failure("invalid_choice", format!("\"{}\" is not a valid choice.", value))),
    }
}

pub fn iso_date(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    parse_date(value)
        .map(|_| ())
        .ok_or_else(|| failure("invalid_date", "Date has wrong format. Use YYYY-MM-DD."))
}

pub fn email_address(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if value.chars().count() > EMAIL_MAX_LENGTH {
        return Err(failure(
            "max_length",
            format!("Ensure this field has no more than {} characters.", EMAIL_MAX_LENGTH),
        ));
    }
    if !value.validate_email() {
        return Err(failure("invalid_email", "Enter a valid email address."));
    }
    Ok(())
}

pub fn password_strength(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if value.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(failure(
            "min_length",
            format!("Ensure this field has at least {} characters.", PASSWORD_MIN_LENGTH),
        ));
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Lowercases the domain part of an email address; the local part is kept
/// as typed.
pub fn normalize_email(value: &str) -> String {
    let value = value.trim();
    match value.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => value.to_string(),
    }
}
