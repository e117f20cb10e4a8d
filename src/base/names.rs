//! Qualified-name utilities for working with Java-style dotted names.

use std::borrow::Cow;

/// Check if a character may start a Java identifier.
///
/// Uses Unicode Standard Annex #31 rules, plus `_` and `$` which Java allows.
#[inline]
pub fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

/// Check if a character may continue a Java identifier.
#[inline]
pub fn is_identifier_continue(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}

/// Returns true if `s` is a single (undotted) identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_continue),
        _ => false,
    }
}

/// The last segment of a dotted name (`com.acme.Order` -> `Order`).
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Everything before the last segment of a dotted name, if any.
pub fn package_of(qualified: &str) -> Option<&str> {
    qualified.rfind('.').map(|idx| &qualified[..idx])
}

/// Join a prefix and a name with `.`, treating an empty prefix as the default package.
pub fn join_qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Normalize binary nested-type separators (`Outer$Inner`) to source form (`Outer.Inner`).
pub fn normalize_binary_name(name: &str) -> Cow<'_, str> {
    if name.contains('$') {
        Cow::Owned(name.replace('$', "."))
    } else {
        Cow::Borrowed(name)
    }
}
