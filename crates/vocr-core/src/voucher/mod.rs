//! Voucher field extraction and record assembly.

mod assembler;
mod extractor;
pub mod rules;

pub use assembler::assemble;
pub use extractor::{FieldCandidates, VoucherExtractor};
pub use rules::{extract_due_date, extract_supplier, extract_voucher_number, FieldExtractor};
