//! Regex patterns for voucher field extraction.
//!
//! Every field has an ordered set of patterns; the first group of each pattern
//! holds the value. `regex` has no look-around, so keyword terminators are
//! consumed by the match instead of asserted.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Voucher number, in priority order
    pub static ref VOUCHER_VALE: Regex = Regex::new(
        r"(?i)Vale\s*[.:ºNº°\-\s]*\s*(\d{5,})"
    ).unwrap();

    pub static ref VOUCHER_V_ABBREV: Regex = Regex::new(
        r"(?i)V\.?\s*[.:º°\-\s]*\s*(\d{5,})"
    ).unwrap();

    pub static ref VOUCHER_NUMERO: Regex = Regex::new(
        r"(?i)N[º°]\s*[:.\-\s]*\s*(\d{5,})"
    ).unwrap();

    pub static ref VOUCHER_VALE_UPPER: Regex = Regex::new(
        r"(?i)VALE\s*(\d{5,})"
    ).unwrap();

    // Supplier, in priority order
    pub static ref SUPPLIER_FORNECEDOR: Regex = Regex::new(
        r"(?i)Fornecedor\s*[.:;\-]\s*([A-Za-zÀ-ÿ0-9\s.\-&]+?)(?:\s*(?:Vale|Data|Nº|\.)|\s*$)"
    ).unwrap();

    pub static ref SUPPLIER_FORNECEDOR_UPPER: Regex = Regex::new(
        r"(?i)FORNECEDOR\s*[.:;\-]\s*([A-Za-zÀ-ÿ0-9\s.\-&]+)"
    ).unwrap();

    pub static ref SUPPLIER_EMPRESA: Regex = Regex::new(
        r"(?i)Empresa\s*[.:;\-]\s*([A-Za-zÀ-ÿ0-9\s.\-&]+)"
    ).unwrap();

    /// Trailing garbage after a supplier name: wide gaps, dashes, pipes.
    pub static ref SUPPLIER_DELIMITER: Regex = Regex::new(
        r"\s{2,}|[-|]"
    ).unwrap();

    // Due date
    pub static ref DUE_DATE_RANGE: Regex = Regex::new(
        r"Data\s*[.:]\s*\d{1,2}/\d{1,2}/\d{4}\s*[aAà]\s*(\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    pub static ref DUE_DATE_VENCIMENTO: Regex = Regex::new(
        r"Vencimento\s*[.:]\s*(\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    pub static ref DUE_DATE_VENC: Regex = Regex::new(
        r"Venc\.?\s*[.:]\s*(\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    /// Anything that is not an ASCII digit.
    pub static ref NON_DIGIT: Regex = Regex::new(r"[^0-9]").unwrap();
}
