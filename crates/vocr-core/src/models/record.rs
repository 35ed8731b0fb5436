//! Output records: one row per processed voucher image.

use serde::{Deserialize, Serialize};

/// Placeholder shown for any field the extractor could not find.
pub const NOT_FOUND: &str = "Não encontrado";

/// Voucher column value marking an image whose processing failed.
pub const ERROR_MARKER: &str = "ERRO";

/// Maximum characters of an error message kept in the supplier column.
pub const ERROR_MESSAGE_LIMIT: usize = 50;

/// Column headers, in export order.
pub const COLUMNS: [&str; 5] = [
    "Arquivo",
    "Origem",
    "Número do Vale",
    "Fornecedor",
    "Vencimento",
];

/// Where an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    /// A local file handed to the CLI.
    Upload,
    /// An image downloaded from a shared Google Drive link.
    Drive,
}

impl ImageOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageOrigin::Upload => "upload",
            ImageOrigin::Drive => "drive",
        }
    }
}

impl std::fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the result table.
///
/// Every column is a presentation string; absent values are rendered as
/// [`NOT_FOUND`] so the table never holds empty cells for successful rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Arquivo")]
    pub source_name: String,

    #[serde(rename = "Origem")]
    pub origin: ImageOrigin,

    #[serde(rename = "Número do Vale")]
    pub voucher_number: String,

    #[serde(rename = "Fornecedor")]
    pub supplier: String,

    #[serde(rename = "Vencimento")]
    pub due_date: String,

    /// Raw OCR text, kept for display only and never exported.
    #[serde(skip)]
    pub ocr_text: Option<String>,
}

impl Record {
    /// Build the error row for an image whose recognition failed.
    pub fn failure(source_name: impl Into<String>, origin: ImageOrigin, message: &str) -> Self {
        let truncated: String = message.chars().take(ERROR_MESSAGE_LIMIT).collect();
        Self {
            source_name: source_name.into(),
            origin,
            voucher_number: ERROR_MARKER.to_string(),
            supplier: format!("Erro: {}", truncated),
            due_date: String::new(),
            ocr_text: None,
        }
    }

    /// Whether this row marks a failed image.
    pub fn is_error(&self) -> bool {
        self.voucher_number == ERROR_MARKER
    }

    /// Whether a voucher number was found for this row.
    pub fn has_voucher(&self) -> bool {
        self.voucher_number != NOT_FOUND && !self.is_error()
    }

    /// Column values in export order.
    pub fn columns(&self) -> [&str; 5] {
        [
            &self.source_name,
            self.origin.as_str(),
            &self.voucher_number,
            &self.supplier,
            &self.due_date,
        ]
    }
}

/// Ordered records of one batch, in input processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Aggregate counts for the consolidated view.
    pub fn stats(&self) -> BatchStats {
        let total = self.records.len();
        let vouchers_found = self.records.iter().filter(|r| r.has_voucher()).count();
        let errors = self.records.iter().filter(|r| r.is_error()).count();
        BatchStats {
            total,
            vouchers_found,
            errors,
        }
    }
}

impl FromIterator<Record> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Summary numbers of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Records produced.
    pub total: usize,
    /// Records with a voucher number.
    pub vouchers_found: usize,
    /// Error records.
    pub errors: usize,
}

impl BatchStats {
    /// Percentage of records with a voucher number, if any were processed.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.vouchers_found as f64 / self.total as f64 * 100.0)
        }
    }
}
