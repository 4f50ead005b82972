//! Shared validation predicates for domain types.

/// Validation predicate: reject characters that would break a resource URI.
///
/// Resource identifiers are interpolated into paths such as
/// `instances/{id}`, so path, query and fragment delimiters are reserved.
pub(crate) fn no_uri_delimiters(s: &str) -> bool {
    !s.contains(['/', '?', '#', ' '])
}

/// Validation predicate: status tokens are upper-case words joined by `_`.
pub(crate) fn is_status_token(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
