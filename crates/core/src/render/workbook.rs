//! Excel rendering of tabular data

use super::tabular::{Cell, TabularData};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::borrow::Cow;
use std::io::{Seek, Write};

/// Longest text a worksheet cell accepts, in characters
pub const EXCEL_CELL_LIMIT: usize = 32_767;

/// Cut `text` to the cell limit on a character boundary
fn fit_cell(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(EXCEL_CELL_LIMIT) {
        Some((end, _)) => Cow::Owned(text[..end].to_string()),
        None => Cow::Borrowed(text),
    }
}

/// Write the data to a single-sheet workbook.
///
/// Text longer than [`EXCEL_CELL_LIMIT`] is truncated; the number of
/// truncated cells is returned.
pub fn write_workbook<W>(data: &TabularData, sheet_name: &str, writer: W) -> Result<usize, XlsxError>
where
    W: Write + Seek + Send,
{
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, title) in data.header.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, title, &bold)?;
    }

    let mut truncated = 0usize;
    for (i, row) in data.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(s) => {
                    let text = fit_cell(s);
                    if matches!(text, Cow::Owned(_)) {
                        truncated += 1;
                    }
                    sheet.write_string(r, c, text.as_ref())?
                }
                Cell::Integer(n) => sheet.write_number(r, c, *n as f64)?,
                Cell::Percentage(p) => sheet.write_number(r, c, *p)?,
            };
        }
    }

    workbook.save_to_writer(writer)?;
    Ok(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn read_back(buf: Cursor<Vec<u8>>) -> Xlsx<Cursor<Vec<u8>>> {
        Xlsx::new(Cursor::new(buf.into_inner())).unwrap()
    }

    #[test]
    fn test_write_workbook_layout() {
        let data = TabularData {
            header: vec![
                "Contributor".to_string(),
                "Contributor %".to_string(),
                "Lines".to_string(),
            ],
            rows: vec![vec![
                Cell::Text("ada".to_string()),
                Cell::Percentage(62.5),
                Cell::Integer(3),
            ]],
        };
        let mut buf = Cursor::new(Vec::new());
        assert_eq!(write_workbook(&data, "contributions", &mut buf).unwrap(), 0);

        let mut workbook = read_back(buf);
        assert_eq!(workbook.sheet_names(), vec!["contributions".to_string()]);
        let range = workbook.worksheet_range("contributions").unwrap();
        assert_eq!(range.get_size(), (2, 3));
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Contributor".to_string())));
        assert_eq!(range.get_value((0, 2)), Some(&Data::String("Lines".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("ada".to_string())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(62.5)));
        assert!(matches!(
            range.get_value((1, 2)),
            Some(Data::Float(n)) if *n == 3.0
        ) || range.get_value((1, 2)) == Some(&Data::Int(3)));
    }

    #[test]
    fn test_long_text_is_truncated() {
        let long = "é".repeat(EXCEL_CELL_LIMIT + 10);
        let data = TabularData {
            header: vec!["Code".to_string(), "Code 2".to_string()],
            rows: vec![vec![Cell::Text(long), Cell::Text("short".to_string())]],
        };
        let mut buf = Cursor::new(Vec::new());
        assert_eq!(write_workbook(&data, "line_blame", &mut buf).unwrap(), 1);

        let mut workbook = read_back(buf);
        let range = workbook.worksheet_range("line_blame").unwrap();
        match range.get_value((1, 0)) {
            Some(Data::String(s)) => assert_eq!(s.chars().count(), EXCEL_CELL_LIMIT),
            other => panic!("expected text, got {:?}", other),
        }
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("short".to_string())));
    }

    #[test]
    fn test_fit_cell_borrows_short_text() {
        assert!(matches!(fit_cell("fn main() {}"), Cow::Borrowed(_)));
        assert_eq!(fit_cell(&"x".repeat(EXCEL_CELL_LIMIT)).len(), EXCEL_CELL_LIMIT);
    }

    #[test]
    fn test_write_workbook_rejects_bad_sheet_name() {
        let data = TabularData {
            header: vec!["A".to_string()],
            rows: Vec::new(),
        };
        let mut buf = Cursor::new(Vec::new());
        assert!(write_workbook(&data, "bad/name", &mut buf).is_err());
    }
}
