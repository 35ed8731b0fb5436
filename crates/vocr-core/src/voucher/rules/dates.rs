//! Due date extraction.
//!
//! Vouchers print their validity window as `Data: <start> a <end>`; the end of
//! the window is the due date. Documents without a range fall back to an
//! explicit `Vencimento`/`Venc.` label. Dates stay as printed text.

use super::patterns::{DUE_DATE_RANGE, DUE_DATE_VENC, DUE_DATE_VENCIMENTO};
use super::{all_matches, first_match, ExtractionMatch, FieldExtractor, Rule};

/// Due date field extractor.
pub struct DueDateExtractor {
    rules: [Rule; 3],
}

impl DueDateExtractor {
    pub fn new() -> Self {
        Self {
            rules: [
                Rule { name: "validity_range", pattern: &DUE_DATE_RANGE, accept: as_printed },
                Rule { name: "vencimento", pattern: &DUE_DATE_VENCIMENTO, accept: as_printed },
                Rule { name: "venc", pattern: &DUE_DATE_VENC, accept: as_printed },
            ],
        }
    }
}

impl Default for DueDateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DueDateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(&self.rules, text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        all_matches(&self.rules, text)
    }
}

/// Extract the due date from text.
pub fn extract_due_date(text: &str) -> Option<String> {
    DueDateExtractor::new().extract(text).map(|m| m.value)
}

fn as_printed(capture: &str) -> Option<String> {
    Some(capture.to_string())
}
