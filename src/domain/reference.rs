//! Order reference detection in label text.
//!
//! Shipping labels print the order reference in different ways depending on
//! the carrier template: as an `ORM-<digits>` code, as a `Reference: <digits>`
//! field, or as a bare number on a line of its own. Each form is a
//! [`ReferencePattern`]; [`ReferenceMatcher`] runs them in priority order and
//! resolves the first capture that is a known payment id.

use super::order::OrdersByPayment;
use once_cell::sync::Lazy;
use regex::Regex;

/// One way a reference number can appear on a label.
pub trait ReferencePattern: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns the digits of the first match in a single, already trimmed
    /// fragment.
    fn captures<'a>(&self, fragment: &'a str) -> Option<&'a str>;
}

/// `ORM-<digits>` codes.
#[derive(Debug, Clone, Default)]
pub struct OrmCodePattern;

impl OrmCodePattern {
    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"ORM-(\d+)").expect("Valid ORM code regex"));
        &PATTERN
    }
}

impl ReferencePattern for OrmCodePattern {
    fn name(&self) -> &str {
        "orm-code"
    }

    fn captures<'a>(&self, fragment: &'a str) -> Option<&'a str> {
        capture_group(Self::regex(), fragment)
    }
}

/// `Reference: <digits>` fields, with optional whitespace after the colon.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFieldPattern;

impl ReferenceFieldPattern {
    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"Reference:\s*(\d+)").expect("Valid reference regex"));
        &PATTERN
    }
}

impl ReferencePattern for ReferenceFieldPattern {
    fn name(&self) -> &str {
        "reference-field"
    }

    fn captures<'a>(&self, fragment: &'a str) -> Option<&'a str> {
        capture_group(Self::regex(), fragment)
    }
}

/// A fragment made only of digits.
#[derive(Debug, Clone, Default)]
pub struct BareNumberPattern;

impl BareNumberPattern {
    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(\d+)$").expect("Valid bare number regex"));
        &PATTERN
    }
}

impl ReferencePattern for BareNumberPattern {
    fn name(&self) -> &str {
        "bare-number"
    }

    fn captures<'a>(&self, fragment: &'a str) -> Option<&'a str> {
        capture_group(Self::regex(), fragment)
    }
}

fn capture_group<'a>(regex: &Regex, text: &'a str) -> Option<&'a str> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A digit sequence found on a page, tagged with the pattern that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub pattern: String,
    pub digits: String,
}

/// Outcome of resolving one page's text against the known orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMatch {
    /// Every capture, in scan order
    pub candidates: Vec<Candidate>,
    /// Captures that are known payment ids, in scan order
    pub known: Vec<u64>,
}

impl ReferenceMatch {
    /// The resolved payment id: the first known capture.
    pub fn payment_id(&self) -> Option<u64> {
        self.known.first().copied()
    }

    /// The best guess at the printed reference, used in diagnostics.
    pub fn candidate_reference(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.digits.as_str())
    }
}

/// Finds order references in the text fragments of a label page.
pub struct ReferenceMatcher {
    patterns: Vec<Box<dyn ReferencePattern>>,
}

impl ReferenceMatcher {
    /// Creates a matcher with the standard patterns, most specific first.
    pub fn new() -> Self {
        Self::with_patterns(vec![
            Box::new(OrmCodePattern),
            Box::new(ReferenceFieldPattern),
            Box::new(BareNumberPattern),
        ])
    }

    /// Creates a matcher with custom patterns, tried in the given order.
    pub fn with_patterns(patterns: Vec<Box<dyn ReferencePattern>>) -> Self {
        Self { patterns }
    }

    /// Collects every capture from every fragment.
    ///
    /// Fragments are trimmed before matching. Each pattern contributes at
    /// most its first match per fragment; order is fragment order, then
    /// pattern priority.
    pub fn candidates<S: AsRef<str>>(&self, fragments: &[S]) -> Vec<Candidate> {
        let mut found = Vec::new();
        for fragment in fragments {
            let fragment = fragment.as_ref().trim();
            if fragment.is_empty() {
                continue;
            }
            for pattern in &self.patterns {
                found.extend(pattern.captures(fragment).into_iter().map(|digits| Candidate {
                    pattern: pattern.name().to_string(),
                    digits: digits.to_string(),
                }));
            }
        }
        found
    }

    /// Resolves the fragments of one page against the known orders.
    pub fn resolve<S: AsRef<str>>(&self, fragments: &[S], orders: &OrdersByPayment) -> ReferenceMatch {
        let candidates = self.candidates(fragments);
        let known = candidates
            .iter()
            .filter_map(|c| c.digits.parse::<u64>().ok())
            .filter(|id| orders.contains_key(id))
            .collect();
        ReferenceMatch { candidates, known }
    }
}

impl Default for ReferenceMatcher {
    fn default() -> Self {
        Self::new()
    }
}
