use std::borrow::Cow;

use heck::ToSnakeCase;
use regex::Regex;

/// Returns a lowercase representation, reusing the original string if already lowercase.
pub fn lowercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_uppercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_lowercase())
    }
}

/// Returns an uppercase representation, avoiding allocation when unnecessary.
pub fn uppercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_lowercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_uppercase())
    }
}

/// Trims leading/trailing whitespace while borrowing the original.
pub fn trim(input: &str) -> Cow<'_, str> {
    Cow::Borrowed(input.trim())
}

/// Converts identifiers to `snake_case`, so `First Name`, `FirstName` and
/// `first_name` compare equal.
pub fn snake_case(input: &str) -> Cow<'_, str> {
    let converted = input.to_snake_case();
    if converted == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(converted)
    }
}

/// Applies a regex replacement while avoiding allocation when there are no matches.
pub fn regex_replace<'a>(value: &'a str, regex: &Regex, replacement: &str) -> Cow<'a, str> {
    if regex.is_match(value) {
        Cow::Owned(regex.replace_all(value, replacement).into_owned())
    } else {
        Cow::Borrowed(value)
    }
}

/// Common stand-ins for "no value" such as `NA`, `n/a`, `null` or `---`.
pub fn is_placeholder_token(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return false;
    }
    let stripped = lowered.trim_start_matches('#');
    matches!(
        stripped,
        "na" | "n/a" | "n.a." | "null" | "none" | "unknown" | "missing"
    ) || stripped.chars().all(|c| c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_reuses_when_no_change() {
        let original = "already_snake";
        assert!(matches!(snake_case(original), Cow::Borrowed(_)));
        assert_eq!(snake_case("First Name").as_ref(), "first_name");
        assert_eq!(snake_case("FirstName").as_ref(), "first_name");
    }

    #[test]
    fn regex_replace_borrows_when_no_match() {
        let regex = Regex::new("foo").unwrap();
        assert!(matches!(regex_replace("bar", &regex, "baz"), Cow::Borrowed(_)));
        assert_eq!(regex_replace("foofoo", &regex, "x").as_ref(), "xx");
    }

    #[test]
    fn placeholder_tokens_are_recognised() {
        assert!(is_placeholder_token("N/A"));
        assert!(is_placeholder_token("#NA"));
        assert!(is_placeholder_token("---"));
        assert!(!is_placeholder_token(""));
        assert!(!is_placeholder_token("nan"));
    }

    #[test]
    fn case_helpers_borrow_when_unchanged() {
        assert!(matches!(lowercase("abc"), Cow::Borrowed(_)));
        assert_eq!(uppercase("abc").as_ref(), "ABC");
        assert_eq!(trim("  x ").as_ref(), "x");
    }
}
