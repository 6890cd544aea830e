//! Shared request-parsing helpers used by handlers and services

use uuid::Uuid;

use crate::services::error::ServiceError;

/// Parse a required identifier. Missing or blank values and malformed UUIDs
/// are validation failures naming the field.
pub fn parse_id(field: &'static str, raw: Option<&str>) -> Result<Uuid, ServiceError> {
    match optional_id(field, raw)? {
        Some(id) => Ok(id),
        None => Err(ServiceError::invalid_field(field, format!("{} is required", field))),
    }
}

/// Parse an optional identifier. Blank values count as absent.
pub fn optional_id(field: &'static str, raw: Option<&str>) -> Result<Option<Uuid>, ServiceError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };
    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| ServiceError::invalid_field(field, format!("{} is not a valid id: {}", field, raw)))
}

/// Trimmed, non-empty display name
pub fn require_name(field: &'static str, raw: Option<&str>) -> Result<String, ServiceError> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ServiceError::invalid_field(field, format!("{} is required", field))),
    }
}
