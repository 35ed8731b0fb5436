//! Voucher number extraction.

use super::patterns::{NON_DIGIT, VOUCHER_NUMERO, VOUCHER_VALE, VOUCHER_VALE_UPPER, VOUCHER_V_ABBREV};
use super::{all_matches, first_match, ExtractionMatch, FieldExtractor, Rule};

/// Captures with fewer digits than this are OCR fragments, not voucher numbers.
pub const MIN_VOUCHER_DIGITS: usize = 5;

/// Voucher number field extractor.
pub struct VoucherNumberExtractor {
    rules: [Rule; 4],
}

impl VoucherNumberExtractor {
    pub fn new() -> Self {
        Self {
            rules: [
                Rule { name: "vale", pattern: &VOUCHER_VALE, accept: digits_only },
                Rule { name: "v_abbrev", pattern: &VOUCHER_V_ABBREV, accept: digits_only },
                Rule { name: "numero", pattern: &VOUCHER_NUMERO, accept: digits_only },
                Rule { name: "vale_upper", pattern: &VOUCHER_VALE_UPPER, accept: digits_only },
            ],
        }
    }
}

impl Default for VoucherNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VoucherNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(&self.rules, text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        all_matches(&self.rules, text)
    }
}

/// Extract the voucher number from text.
pub fn extract_voucher_number(text: &str) -> Option<String> {
    VoucherNumberExtractor::new().extract(text).map(|m| m.value)
}

fn digits_only(capture: &str) -> Option<String> {
    let digits = NON_DIGIT.replace_all(capture, "").into_owned();
    (digits.len() >= MIN_VOUCHER_DIGITS).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vale_with_ordinal() {
        assert_eq!(extract_voucher_number("Vale nº 00045123"), Some("00045123".to_string()));
    }

    #[test]
    fn test_vale_with_colon() {
        let m = VoucherNumberExtractor::new().extract("VALE: 9876543").unwrap();
        assert_eq!(m.value, "9876543");
        assert_eq!(m.rule, "vale");
    }

    #[test]
    fn test_abbreviation() {
        let m = VoucherNumberExtractor::new().extract("Ref V. 123456 emitido").unwrap();
        assert_eq!(m.value, "123456");
        assert_eq!(m.rule, "v_abbrev");
    }

    #[test]
    fn test_numero_symbol() {
        let m = VoucherNumberExtractor::new().extract("Documento N° - 5566778").unwrap();
        assert_eq!(m.value, "5566778");
    }

    #[test]
    fn test_short_numbers_rejected() {
        assert_eq!(extract_voucher_number("Vale 1234"), None);
        assert_eq!(extract_voucher_number("Nº 12-34"), None);
    }

    #[test]
    fn test_no_keyword() {
        assert_eq!(extract_voucher_number("Recibo de entrega 12345678"), None);
        assert_eq!(extract_voucher_number(""), None);
    }

    #[test]
    fn test_first_rule_wins() {
        let text = "Nº 11111111\nVale 22222222";
        assert_eq!(extract_voucher_number(text), Some("22222222".to_string()));
    }

    #[test]
    fn test_extract_all_in_priority_order() {
        let text = "Nº 11111111\nVale 22222222";
        let rules: Vec<&str> = VoucherNumberExtractor::new()
            .extract_all(text)
            .iter()
            .map(|m| m.rule)
            .collect();
        assert_eq!(rules, vec!["vale", "numero", "vale_upper"]);
    }

    #[test]
    fn test_result_is_ascii_digits() {
        let value = extract_voucher_number("Vale 0012345678").unwrap();
        assert!(value.chars().all(|c| c.is_ascii_digit()));
        assert!(value.len() >= MIN_VOUCHER_DIGITS);
    }
}
