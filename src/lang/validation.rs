use super::lexer::{is_identifier_part, is_identifier_start};
use super::parser::ParseError;

use std::collections::HashSet;

/// Whether `name` can appear as a field in a query.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_part),
        _ => false,
    }
}

/// Rejects `field` unless the whitelist is absent or contains it.
/// An empty whitelist rejects every field.
pub fn check_field(field: &str, allowed_fields: Option<&HashSet<String>>) -> Result<(), ParseError> {
    match allowed_fields {
        Some(allowed) if !allowed.contains(field) => Err(ParseError::FieldNotAllowed {
            field: field.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Names of a whitelist that can never match a lexed field.
pub fn unreachable_fields(allowed_fields: &HashSet<String>) -> Vec<&str> {
    let mut names: Vec<&str> = allowed_fields
        .iter()
        .map(String::as_str)
        .filter(|name| !is_identifier(name))
        .collect();

    names.sort_unstable();
    names
}
