//! Supplier name extraction.

use super::patterns::{
    SUPPLIER_DELIMITER, SUPPLIER_EMPRESA, SUPPLIER_FORNECEDOR, SUPPLIER_FORNECEDOR_UPPER,
};
use super::{all_matches, first_match, ExtractionMatch, FieldExtractor, Rule};

/// Names shorter than this are treated as noise.
pub const MIN_SUPPLIER_CHARS: usize = 4;

/// Supplier field extractor.
pub struct SupplierExtractor {
    rules: [Rule; 3],
}

impl SupplierExtractor {
    pub fn new() -> Self {
        Self {
            rules: [
                Rule { name: "fornecedor", pattern: &SUPPLIER_FORNECEDOR, accept: clean_supplier },
                Rule {
                    name: "fornecedor_upper",
                    pattern: &SUPPLIER_FORNECEDOR_UPPER,
                    accept: clean_supplier,
                },
                Rule { name: "empresa", pattern: &SUPPLIER_EMPRESA, accept: clean_supplier },
            ],
        }
    }
}

impl Default for SupplierExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for SupplierExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        first_match(&self.rules, text)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        all_matches(&self.rules, text)
    }
}

/// Extract the supplier name from text.
pub fn extract_supplier(text: &str) -> Option<String> {
    SupplierExtractor::new().extract(text).map(|m| m.value)
}

/// Trim, cut at the first trailing-garbage delimiter, reject short leftovers.
///
/// The length floor applies to the piece before the cut is trimmed, so
/// `"ABC - Filial"` still yields `ABC`.
fn clean_supplier(capture: &str) -> Option<String> {
    let piece = SUPPLIER_DELIMITER
        .split(capture.trim())
        .next()
        .unwrap_or_default();

    (piece.chars().count() >= MIN_SUPPLIER_CHARS).then(|| piece.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncates_before_double_space() {
        let text = "Fornecedor: Comercial ABC Ltda   Vale 123456";
        assert_eq!(extract_supplier(text), Some("Comercial ABC Ltda".to_string()));
    }

    #[test]
    fn test_stops_at_keyword() {
        let text = "Fornecedor: Padaria Pão Quente Data: 01/01/2024";
        assert_eq!(extract_supplier(text), Some("Padaria Pão Quente".to_string()));
    }

    #[test]
    fn test_runs_to_end_of_text() {
        let m = SupplierExtractor::new().extract("Fornecedor - Açougue Bom Corte").unwrap();
        assert_eq!(m.value, "Açougue Bom Corte");
        assert_eq!(m.rule, "fornecedor");
    }

    #[test]
    fn test_cut_at_pipe_and_hyphen() {
        assert_eq!(
            extract_supplier("Fornecedor: Mercado Sol | CNPJ"),
            Some("Mercado Sol".to_string())
        );
        assert_eq!(
            extract_supplier("Fornecedor: Auto Peças - Filial 2"),
            Some("Auto Peças".to_string())
        );
    }

    #[test]
    fn test_short_name_before_delimiter_kept() {
        assert_eq!(
            extract_supplier("Fornecedor: ABC - Filial 2"),
            Some("ABC".to_string())
        );
        assert_eq!(extract_supplier("Fornecedor: AB - Filial 2"), None);
    }

    #[test]
    fn test_greedy_fallback_when_terminator_missing() {
        // The comma is outside the name alphabet and is not a keyword, so only
        // the maximal-run fallback matches.
        let m = SupplierExtractor::new()
            .extract("FORNECEDOR: Distribuidora Norte, Rua 7")
            .unwrap();
        assert_eq!(m.value, "Distribuidora Norte");
        assert_eq!(m.rule, "fornecedor_upper");
    }

    #[test]
    fn test_empresa() {
        assert_eq!(
            extract_supplier("Empresa; Gráfica & Cia, centro"),
            Some("Gráfica & Cia".to_string())
        );
    }

    #[test]
    fn test_short_names_rejected() {
        assert_eq!(extract_supplier("Fornecedor: ABC"), None);
    }

    #[test]
    fn test_no_keyword() {
        assert_eq!(extract_supplier("Vale 123456 Data: 01/01/2024"), None);
        assert_eq!(extract_supplier(""), None);
    }
}
