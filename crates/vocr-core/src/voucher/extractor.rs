//! Combined extraction of every voucher field.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rules::{
    DueDateExtractor, ExtractionMatch, FieldExtractor, SupplierExtractor, VoucherNumberExtractor,
};

/// Field values found in one OCR text; `None` means not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCandidates {
    /// Digits only, at least five of them.
    pub voucher_number: Option<String>,
    /// Supplier name as printed, trailing garbage removed.
    pub supplier: Option<String>,
    /// `d/m/yyyy` as printed.
    pub due_date: Option<String>,
}

/// Runs the three independent field extractors over OCR text.
#[derive(Default)]
pub struct VoucherExtractor {
    number: VoucherNumberExtractor,
    supplier: SupplierExtractor,
    due_date: DueDateExtractor,
}

impl VoucherExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every field. Non-matches are normal outcomes, never errors.
    pub fn extract(&self, text: &str) -> FieldCandidates {
        let voucher_number = self.number.extract(text);
        let supplier = self.supplier.extract(text);
        let due_date = self.due_date.extract(text);

        debug!(
            "Extraction rules matched: number={:?} supplier={:?} due_date={:?}",
            voucher_number.as_ref().map(ExtractionMatch::describe),
            supplier.as_ref().map(ExtractionMatch::describe),
            due_date.as_ref().map(ExtractionMatch::describe),
        );

        FieldCandidates {
            voucher_number: voucher_number.map(|m| m.value),
            supplier: supplier.map(|m| m.value),
            due_date: due_date.map(|m| m.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_full_voucher() {
        let text = r#"
            VALE TRANSPORTE
            Vale nº 00045123
            Fornecedor: Comercial ABC Ltda   Vale 123456
            Data: 01/01/2024 a 15/02/2024
        "#;

        let fields = VoucherExtractor::new().extract(text);

        assert_eq!(
            fields,
            FieldCandidates {
                voucher_number: Some("00045123".to_string()),
                supplier: Some("Comercial ABC Ltda".to_string()),
                due_date: Some("15/02/2024".to_string()),
            }
        );
    }

    #[test]
    fn test_unrelated_text() {
        let fields = VoucherExtractor::new().extract("lorem ipsum dolor sit amet");
        assert_eq!(fields, FieldCandidates::default());
    }
}
