use std::cmp::Ordering;

/// A named culture whose case mapping rules drive case-insensitive string
/// comparison. Only the language part of the name affects behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culture {
    name: String,
}

impl Culture {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn invariant() -> Self {
        Self::new("")
    }

    /// Parses a POSIX locale such as `tr_TR.UTF-8` or `en_US@euro`.
    /// `C` and `POSIX` map to the invariant culture.
    pub fn from_posix_locale(locale: &str) -> Self {
        let base = locale
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .trim();
        if base.is_empty() || base == "C" || base == "POSIX" {
            return Self::invariant();
        }
        Self::new(base.replace('_', "-"))
    }

    /// The culture of the current process, read from `LC_ALL` then `LANG`.
    pub fn current() -> Self {
        ["LC_ALL", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.is_empty())
            .map(|value| Self::from_posix_locale(&value))
            .unwrap_or_else(Self::invariant)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_invariant(&self) -> bool {
        self.name.is_empty()
    }

    pub fn language(&self) -> String {
        self.name
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    fn has_turkic_casing(&self) -> bool {
        matches!(self.language().as_str(), "tr" | "az")
    }

    pub fn to_lower(&self, s: &str) -> String {
        if !self.has_turkic_casing() {
            return s.to_lowercase();
        }
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                'I' => out.push('ı'),
                'İ' => out.push('i'),
                other => out.extend(other.to_lowercase()),
            }
        }
        out
    }

    pub fn to_upper(&self, s: &str) -> String {
        if !self.has_turkic_casing() {
            return s.to_uppercase();
        }
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                'i' => out.push('İ'),
                'ı' => out.push('I'),
                other => out.extend(other.to_uppercase()),
            }
        }
        out
    }

    pub fn equals(&self, a: &str, b: &str, ignore_case: bool) -> bool {
        self.compare(a, b, ignore_case) == Ordering::Equal
    }

    /// Orders by the culture's lowercase form first. Case-sensitive
    /// comparison breaks ties with lowercase before uppercase, then by code
    /// point, so only identical strings compare equal.
    pub fn compare(&self, a: &str, b: &str, ignore_case: bool) -> Ordering {
        let folded = self.to_lower(a).cmp(&self.to_lower(b));
        if ignore_case || folded != Ordering::Equal {
            return folded;
        }
        a.chars()
            .zip(b.chars())
            .map(|(x, y)| case_rank(x).cmp(&case_rank(y)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.cmp(b))
    }
}

fn case_rank(c: char) -> u8 {
    if c.is_uppercase() {
        1
    } else {
        0
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

/// How two strings are compared by the string assertions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StringComparison {
    #[default]
    Ordinal,
    OrdinalIgnoreCase,
    Culture(Culture),
    CultureIgnoreCase(Culture),
}

impl StringComparison {
    /// Maps a string into the form in which it is compared.
    pub fn normalize(&self, s: &str) -> String {
        match self {
            StringComparison::Ordinal | StringComparison::Culture(_) => s.to_string(),
            StringComparison::OrdinalIgnoreCase => s.to_uppercase(),
            StringComparison::CultureIgnoreCase(culture) => culture.to_lower(s),
        }
    }

    pub fn contains(&self, value: &str, substring: &str) -> bool {
        self.normalize(value).contains(&self.normalize(substring))
    }

    pub fn starts_with(&self, value: &str, prefix: &str) -> bool {
        self.normalize(value).starts_with(&self.normalize(prefix))
    }

    pub fn ends_with(&self, value: &str, suffix: &str) -> bool {
        self.normalize(value).ends_with(&self.normalize(suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_uses_alphabetic_order() {
        let english = Culture::new("en-US");
        assert_eq!(english.compare("a", "B", false), Ordering::Less);
        assert_eq!(english.compare("B", "a", false), Ordering::Greater);
        assert_eq!(english.compare("a", "A", false), Ordering::Less);
        assert_eq!(english.compare("Apple", "apple", false), Ordering::Greater);
        assert_eq!(english.compare("same", "same", false), Ordering::Equal);
        assert_eq!(english.compare("a", "A", true), Ordering::Equal);
        assert!(!english.equals("a", "A", false));
    }

    #[test]
    fn test_turkish_ignore_case_keeps_dotted_and_dotless_i_distinct() {
        let turkish = Culture::new("tr-TR");
        assert!(!turkish.equals("i", "I", true));
        assert!(turkish.equals("i", "İ", true));
        assert!(turkish.equals("ı", "I", true));
    }

    #[test]
    fn test_english_ignore_case_folds_i() {
        let english = Culture::new("en-US");
        assert!(english.equals("i", "I", true));
        assert!(!english.equals("i", "I", false));
    }

    #[test]
    fn test_turkish_upper() {
        let turkish = Culture::new("tr-TR");
        assert_eq!(turkish.to_upper("istanbul"), "İSTANBUL");
        assert_eq!(Culture::invariant().to_upper("istanbul"), "ISTANBUL");
    }

    #[test]
    fn test_from_posix_locale() {
        assert_eq!(Culture::from_posix_locale("tr_TR.UTF-8").name(), "tr-TR");
        assert_eq!(Culture::from_posix_locale("az_AZ@latin").language(), "az");
        assert!(Culture::from_posix_locale("C").is_invariant());
        assert!(Culture::from_posix_locale("POSIX.UTF-8").is_invariant());
    }

    #[test]
    fn test_compare_orders_case_insensitively() {
        let culture = Culture::invariant();
        assert_eq!(culture.compare("apple", "BANANA", true), Ordering::Less);
        assert_eq!(culture.compare("apple", "APPLE", true), Ordering::Equal);
    }

    #[test]
    fn test_ordinal_ignore_case_contains() {
        let cmp = StringComparison::OrdinalIgnoreCase;
        assert!(cmp.contains("The quick brown fox", "QUICK"));
        assert!(cmp.starts_with("The quick", "THE"));
        assert!(cmp.ends_with("lazy dog.", "DOG."));
        assert!(!StringComparison::Ordinal.contains("The quick", "QUICK"));
    }
}
