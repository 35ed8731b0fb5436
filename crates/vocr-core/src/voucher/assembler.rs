//! Turns extraction results into table rows.

use tracing::debug;

use crate::models::record::{ImageOrigin, Record, NOT_FOUND};

use super::extractor::FieldCandidates;

/// Build the record for a successfully recognized image.
///
/// A voucher number shorter than `min_digits` is discarded; this runs after,
/// and independently of, the extractor's own five-digit floor.
pub fn assemble(
    source_name: &str,
    origin: ImageOrigin,
    raw_text: &str,
    candidates: FieldCandidates,
    min_digits: usize,
) -> Record {
    let voucher_number = candidates.voucher_number.filter(|number| {
        let keep = number.len() >= min_digits;
        if !keep {
            debug!(
                "Discarding voucher number {} from {}: fewer than {} digits",
                number, source_name, min_digits
            );
        }
        keep
    });

    Record {
        source_name: source_name.to_string(),
        origin,
        voucher_number: or_not_found(voucher_number),
        supplier: or_not_found(candidates.supplier),
        due_date: or_not_found(candidates.due_date),
        ocr_text: Some(raw_text.to_string()),
    }
}

fn or_not_found(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_FOUND.to_string())
}
