//! String conversion utilities.

/// Converts an empty or whitespace-only string to `None`.
///
/// Optional text fields submitted by clients treat `""` the same as an
/// absent field.
///
/// # Examples
///
/// ```
/// use adventure_domain::common::none_if_blank;
///
/// assert_eq!(none_if_blank("hello"), Some("hello"));
/// assert_eq!(none_if_blank(""), None);
/// assert_eq!(none_if_blank("   "), None);
/// ```
pub fn none_if_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Owned version of [`none_if_blank`] for optional request fields.
pub fn some_if_not_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_if_blank_with_content() {
        assert_eq!(none_if_blank("a"), Some("a"));
        assert_eq!(none_if_blank(" padded "), Some(" padded "));
    }

    #[test]
    fn test_none_if_blank_empty() {
        assert_eq!(none_if_blank(""), None);
        assert_eq!(none_if_blank("\t\n"), None);
    }

    #[test]
    fn test_some_if_not_blank() {
        assert_eq!(some_if_not_blank(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(some_if_not_blank(Some(String::new())), None);
        assert_eq!(some_if_not_blank(None), None);
    }
}
