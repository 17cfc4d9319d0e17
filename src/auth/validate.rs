use chrono::{NaiveDate, NaiveTime};

use crate::errors::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("Email must be a valid address (contain '@' and '.')".to_string());
    }
    None
}

/// Validate a university ID: 1-20 ASCII digits.
pub fn validate_nuid(nuid: &str) -> Option<String> {
    let trimmed = nuid.trim();
    if trimmed.is_empty() {
        return Some("NUID is required".to_string());
    }
    if trimmed.len() > 20 {
        return Some("NUID must be at most 20 digits".to_string());
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some("NUID may only contain digits".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.len() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.len() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
}

/// Parse a string identifier (path segment or query value) into a row id.
///
/// Empty, non-numeric and non-positive values are all `InvalidArgument`.
pub fn parse_id(value: &str, field_name: &str) -> Result<i64, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArgument(format!("{field_name} is required")));
    }
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidArgument(format!(
            "{field_name} must be a positive integer, got '{trimmed}'"
        ))),
    }
}

/// Collapse collected validation messages into a single `InvalidArgument`.
pub fn into_result(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nuid_must_be_digits() {
        assert!(validate_nuid("001234567").is_none());
        assert!(validate_nuid("12a4").is_some());
        assert!(validate_nuid("   ").is_some());
    }

    #[test]
    fn time_accepts_minutes_and_seconds() {
        assert!(parse_time("18:30").is_some());
        assert!(parse_time("18:30:15").is_some());
        assert!(parse_time("6pm").is_none());
    }

    #[test]
    fn date_is_iso_calendar_date() {
        assert!(parse_date("2025-02-28").is_some());
        assert!(parse_date("2025-02-30").is_none());
        assert!(parse_date("02/28/2025").is_none());
    }

    #[test]
    fn parse_id_rejects_blank_and_garbage() {
        assert_eq!(parse_id(" 42 ", "userId").unwrap(), 42);
        assert!(matches!(parse_id("", "userId"), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_id("abc", "userId"), Err(AppError::InvalidArgument(_))));
        assert!(matches!(parse_id("-3", "userId"), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn into_result_joins_messages() {
        let err = into_result(vec!["a".into(), "b".into()]).unwrap_err();
        match err {
            AppError::InvalidArgument(msg) => assert_eq!(msg, "a; b"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
