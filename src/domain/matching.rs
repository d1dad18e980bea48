//! Expected-name guard.
//!
//! The consuming agent sends both a product id and the name it believes that
//! id refers to. When they disagree the id was almost certainly hallucinated
//! or mis-mapped, and applying the mutation would silently put the wrong
//! product in the cart. The heuristic is deliberately biased toward few
//! false positives: borderline matches pass, and an expected name made up
//! entirely of short words never fires the guard at all.

/// Outcome of comparing a canonical catalog name with a caller-supplied
/// expected name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    /// The expected name agrees with the canonical name.
    Matched,
    /// No significant keywords in the expected name; the guard does not fire.
    Vacuous,
    /// At least one significant keyword was present and none matched.
    Mismatch(NameMismatch),
}

/// Payload of a failed match, rendered as a conflict by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMismatch {
    pub canonical_name: String,
    pub expected_name: String,
}

/// Tokens longer than this many characters count as significant keywords.
const KEYWORD_MIN_LEN: usize = 3;

/// Compares `canonical` (the catalog's name for the product) against
/// `expected` (what the caller thinks the product is called).
///
/// Both sides are lowercased. The match succeeds if the canonical name
/// contains the whole expected string, or any significant keyword of the
/// expected name, as a substring.
pub fn match_expected_name(canonical: &str, expected: &str) -> NameMatch {
    let canonical_lc = canonical.to_lowercase();
    let expected_lc = expected.to_lowercase();

    let keywords: Vec<&str> = expected_lc
        .split_whitespace()
        .filter(|w| w.chars().count() > KEYWORD_MIN_LEN)
        .collect();

    let phrase = expected_lc.trim();
    let phrase_hit = !phrase.is_empty() && canonical_lc.contains(phrase);
    if phrase_hit || keywords.iter().any(|k| canonical_lc.contains(k)) {
        return NameMatch::Matched;
    }
    if keywords.is_empty() {
        return NameMatch::Vacuous;
    }
    NameMatch::Mismatch(NameMismatch {
        canonical_name: canonical.to_string(),
        expected_name: expected.to_string(),
    })
}
