//! Small helpers for reading AWS SDK responses and errors.

use aws_sdk_lambda::error::ProvideErrorMetadata;

const MISSING_RESOURCE_CODES: [&str; 5] = [
    "ResourceNotFoundException",
    "NotFoundException",
    "NotFound",
    "NoSuchBucket",
    "NoSuchEntity",
];

/// Reads an SDK string accessor whether the member is modelled as required
/// (`&str`) or optional (`Option<&str>`).
pub fn text<'a>(value: impl Into<Option<&'a str>>) -> Option<&'a str> {
    value.into()
}

/// Reads an SDK boolean accessor; absent values count as `false`.
pub fn flag(value: impl Into<Option<bool>>) -> bool {
    value.into().unwrap_or(false)
}

pub fn error_code(error: &impl ProvideErrorMetadata) -> Option<&str> {
    error.code()
}

pub fn is_missing_resource_code(code: Option<&str>) -> bool {
    code.is_some_and(|code| MISSING_RESOURCE_CODES.contains(&code))
}

pub fn is_missing_resource(error: &impl ProvideErrorMetadata) -> bool {
    is_missing_resource_code(error_code(error))
}

pub fn has_code(error: &impl ProvideErrorMetadata, code: &str) -> bool {
    error_code(error) == Some(code)
}
