//! Field-level validation shared by every input form.
//!
//! Forms deserialize leniently (every field optional) and then `clean` into a
//! typed value, collecting one or more messages per field so clients can show
//! them next to the offending input.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const INVALID_CHOICE: &str = "Select a valid choice.";

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// Returns `value` when no errors were collected.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Trims a required text input, recording an error when it is blank or too long.
pub(crate) fn required_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> String {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.add(field, REQUIRED);
    } else {
        check_length(errors, field, trimmed, max_len);
    }
    trimmed.to_string()
}

/// Trims an optional text input; blank becomes the empty string.
pub(crate) fn optional_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> String {
    let trimmed = value.map(str::trim).unwrap_or_default();
    check_length(errors, field, trimmed, max_len);
    trimmed.to_string()
}

fn check_length(errors: &mut FieldErrors, field: &'static str, value: &str, max_len: usize) {
    let length = value.chars().count();
    if length > max_len {
        errors.add(
            field,
            format!("Ensure this value has at most {max_len} characters (it has {length})."),
        );
    }
}

/// Coordinate with at most six decimal places inside `[-limit, limit]`.
pub(crate) fn coordinate(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<Decimal>,
    limit: i64,
) -> Option<Decimal> {
    let value = value?;
    let bound = Decimal::from(limit);
    if value < -bound || value > bound {
        errors.add(
            field,
            format!("Ensure this value is between -{limit} and {limit}."),
        );
        return None;
    }
    if value.normalize().scale() > 6 {
        errors.add(
            field,
            "Ensure that there are no more than 6 decimal places.",
        );
        return None;
    }
    Some(value)
}

/// Money amount with at most two decimal places that is not negative.
///
/// `max_digits` counts both sides of the point, so `6` allows up to `9999.99`.
pub(crate) fn non_negative_amount(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Decimal,
    max_digits: u32,
    message: &str,
) -> Decimal {
    let whole_digits = max_digits.saturating_sub(2);
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, message);
    } else if value.normalize().scale() > 2 {
        errors.add(field, "Ensure that there are no more than 2 decimal places.");
    } else if value.trunc() >= Decimal::from(10_i64.pow(whole_digits)) {
        errors.add(
            field,
            format!("Ensure that there are no more than {max_digits} digits in total."),
        );
    }
    value
}

/// Loose email check: one `@`, non-empty local part, dotted domain, no spaces.
pub(crate) fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
