//! Rule-based field extractors for vouchers.
//!
//! Each field is read by an ordered chain of [`Rule`]s: the first rule whose
//! pattern matches and whose post-processing accepts the capture wins.

pub mod dates;
pub mod number;
pub mod patterns;
pub mod supplier;

pub use dates::{extract_due_date, DueDateExtractor};
pub use number::{extract_voucher_number, VoucherNumberExtractor, MIN_VOUCHER_DIGITS};
pub use supplier::{extract_supplier, SupplierExtractor, MIN_SUPPLIER_CHARS};

use regex::Regex;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text: the first accepted candidate.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Every accepted candidate, one per rule, in priority order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// One step of a field's pattern chain.
pub struct Rule {
    /// Stable identifier, reported with matches.
    pub name: &'static str,
    /// Pattern whose first capture group holds the raw value.
    pub pattern: &'static Regex,
    /// Cleans the capture; `None` rejects it and moves on to the next rule.
    pub accept: fn(&str) -> Option<String>,
}

impl Rule {
    /// Apply the rule to `text`, returning the accepted match if any.
    pub fn apply(&self, text: &str) -> Option<ExtractionMatch<String>> {
        let caps = self.pattern.captures(text)?;
        let group = caps.get(1)?;
        let value = (self.accept)(group.as_str())?;
        let full_match = caps.get(0)?;

        Some(
            ExtractionMatch::new(value, self.name, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }
}

/// Run a rule chain, stopping at the first accepted match.
pub fn first_match(rules: &[Rule], text: &str) -> Option<ExtractionMatch<String>> {
    rules.iter().find_map(|rule| rule.apply(text))
}

/// Run every rule of a chain, keeping accepted matches in priority order.
pub fn all_matches(rules: &[Rule], text: &str) -> Vec<ExtractionMatch<String>> {
    rules.iter().filter_map(|rule| rule.apply(text)).collect()
}

/// An extracted value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the rule that produced it.
    pub rule: &'static str,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rule: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            rule,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Short provenance line for logs: rule name, byte span and matched text.
    pub fn describe(&self) -> String {
        match self.position {
            Some((start, end)) => format!("{}@{}..{} {:?}", self.rule, start, end, self.source),
            None => format!("{} {:?}", self.rule, self.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_records_span_and_source() {
        let found = VoucherNumberExtractor::default().extract("xx Vale 12345678 yy");
        let found = found.map(|m| m.describe());

        assert_eq!(found, Some("vale@3..16 \"Vale 12345678\"".to_string()));
    }
}
