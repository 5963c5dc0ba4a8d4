use crate::assertions::culture::StringComparison;
use crate::assertions::message::replace_null_chars;
use crate::assertions::{check, AssertResult};
use regex::Regex;

/// Assertions over string contents.
#[derive(Debug)]
pub struct StringAssert;

static STRING_ASSERT: StringAssert = StringAssert;

impl StringAssert {
    pub fn that() -> &'static StringAssert {
        &STRING_ASSERT
    }

    pub fn contains(value: &str, substring: &str) -> AssertResult {
        Self::contains_with_comparison(value, substring, StringComparison::Ordinal)
    }

    pub fn contains_with_comparison(
        value: &str,
        substring: &str,
        comparison: StringComparison,
    ) -> AssertResult {
        check(
            comparison.contains(value, substring),
            "StringAssert.Contains",
            || {
                format!(
                    "String '{}' does not contain string '{}'.",
                    replace_null_chars(value),
                    replace_null_chars(substring)
                )
            },
        )
    }

    pub fn starts_with(value: &str, prefix: &str) -> AssertResult {
        Self::starts_with_comparison(value, prefix, StringComparison::Ordinal)
    }

    pub fn starts_with_comparison(
        value: &str,
        prefix: &str,
        comparison: StringComparison,
    ) -> AssertResult {
        check(
            comparison.starts_with(value, prefix),
            "StringAssert.StartsWith",
            || {
                format!(
                    "String '{}' does not start with string '{}'.",
                    replace_null_chars(value),
                    replace_null_chars(prefix)
                )
            },
        )
    }

    pub fn ends_with(value: &str, suffix: &str) -> AssertResult {
        Self::ends_with_comparison(value, suffix, StringComparison::Ordinal)
    }

    pub fn ends_with_comparison(
        value: &str,
        suffix: &str,
        comparison: StringComparison,
    ) -> AssertResult {
        check(
            comparison.ends_with(value, suffix),
            "StringAssert.EndsWith",
            || {
                format!(
                    "String '{}' does not end with string '{}'.",
                    replace_null_chars(value),
                    replace_null_chars(suffix)
                )
            },
        )
    }

    pub fn matches(value: &str, pattern: &Regex) -> AssertResult {
        check(pattern.is_match(value), "StringAssert.Matches", || {
            format!(
                "String '{}' does not match pattern '{}'.",
                replace_null_chars(value),
                pattern.as_str()
            )
        })
    }

    pub fn does_not_match(value: &str, pattern: &Regex) -> AssertResult {
        check(!pattern.is_match(value), "StringAssert.DoesNotMatch", || {
            format!(
                "String '{}' matches pattern '{}'.",
                replace_null_chars(value),
                pattern.as_str()
            )
        })
    }
}
