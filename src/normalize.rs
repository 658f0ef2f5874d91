//! C1: trim/collapse whitespace and case-fold for identity comparisons (§4.1).

/// Trims the string and collapses runs of internal whitespace to a single space.
pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `fold(s) = lower(normalize(s))`, used wherever textual identity is compared
/// (natural keys, exact-match strategy, fuzzy strategy).
pub fn fold(s: &str) -> String {
    normalize(s).to_lowercase()
}

/// Empty-after-normalize is treated as absent.
pub fn is_empty_value(s: &str) -> bool {
    normalize(s).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("  Registered   Nurse\t"), "Registered Nurse");
    }

    #[test]
    fn fold_lowercases_after_normalizing() {
        assert_eq!(fold("  Registered   Nurse\t"), "registered nurse");
    }

    #[test]
    fn all_whitespace_is_empty() {
        assert!(is_empty_value("   \t  "));
        assert!(!is_empty_value(" a "));
    }
}
