//! Spreadsheet exports of a result set.
//!
//! Both formats carry the same five columns, in [`COLUMNS`] order, one row per
//! record. Error rows are exported as they are.

use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::ExportError;
use crate::models::record::{COLUMNS, ResultSet};

/// Worksheet holding the results in the XLSX export.
pub const SHEET_NAME: &str = "Resultados";

/// Field separator of the CSV export.
pub const CSV_DELIMITER: u8 = b';';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const COLUMN_WIDTHS: [f64; 5] = [28.0, 10.0, 18.0, 36.0, 14.0];

/// CSV bytes: UTF-8 with a byte-order mark, `;`-separated, header first.
pub fn to_csv_bytes(results: &ResultSet) -> Result<Vec<u8>, ExportError> {
    let mut buf = UTF8_BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(CSV_DELIMITER)
            .from_writer(&mut buf);

        writer.write_record(COLUMNS)?;
        for record in results {
            writer.write_record(record.columns())?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// Workbook bytes with a single `Resultados` sheet.
pub fn to_xlsx_bytes(results: &ResultSet) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(results)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn write_csv(results: &ResultSet, path: &Path) -> Result<(), ExportError> {
    let bytes = to_csv_bytes(results)?;
    fs::write(path, bytes)?;
    info!("Wrote {} rows to {}", results.len(), path.display());
    Ok(())
}

pub fn write_xlsx(results: &ResultSet, path: &Path) -> Result<(), ExportError> {
    let mut workbook = build_workbook(results)?;
    workbook.save(path)?;
    info!("Wrote {} rows to {}", results.len(), path.display());
    Ok(())
}

fn build_workbook(results: &ResultSet) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in COLUMNS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, width)?;
    }

    for (row, record) in results.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, value) in record.columns().iter().enumerate() {
            sheet.write_string(row, col as u16, *value)?;
        }
    }

    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{ImageOrigin, NOT_FOUND, Record};
    use pretty_assertions::assert_eq;

    fn results() -> ResultSet {
        vec![
            Record {
                source_name: "vale1.jpg".to_string(),
                origin: ImageOrigin::Upload,
                voucher_number: "00045123".to_string(),
                supplier: "Comercial ABC; Ltda".to_string(),
                due_date: "15/02/2024".to_string(),
                ocr_text: Some("raw text".to_string()),
            },
            Record {
                source_name: "imagem_drive.jpg".to_string(),
                origin: ImageOrigin::Drive,
                voucher_number: NOT_FOUND.to_string(),
                supplier: NOT_FOUND.to_string(),
                due_date: NOT_FOUND.to_string(),
                ocr_text: None,
            },
            Record::failure("bad.png", ImageOrigin::Upload, "engine crashed"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_csv_layout() {
        let bytes = to_csv_bytes(&results()).unwrap();

        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Arquivo;Origem;Número do Vale;Fornecedor;Vencimento",
                "vale1.jpg;upload;00045123;\"Comercial ABC; Ltda\";15/02/2024",
                "imagem_drive.jpg;drive;Não encontrado;Não encontrado;Não encontrado",
                "bad.png;upload;ERRO;Erro: engine crashed;",
            ]
        );
    }

    #[test]
    fn test_csv_never_contains_ocr_text() {
        let bytes = to_csv_bytes(&results()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("raw text"));
    }

    #[test]
    fn test_empty_csv_has_header_only() {
        let bytes = to_csv_bytes(&ResultSet::default()).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_xlsx_is_zip_container() {
        let bytes = to_xlsx_bytes(&results()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("resultados_vales.csv");
        let xlsx_path = dir.path().join("resultados_vales.xlsx");

        write_csv(&results(), &csv_path).unwrap();
        write_xlsx(&results(), &xlsx_path).unwrap();

        assert!(fs::read(&csv_path).unwrap().starts_with(UTF8_BOM));
        assert!(fs::metadata(&xlsx_path).unwrap().len() > 0);
    }
}
