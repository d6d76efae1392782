//! CSV rendering of tabular data

use super::tabular::TabularData;
use std::io::Write;

/// Write the header and every row as CSV
pub fn write_csv<W: Write>(data: &TabularData, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&data.header)?;
    for row in &data.rows {
        out.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tabular::Cell;

    #[test]
    fn test_write_csv_quotes_and_formats() {
        let data = TabularData {
            header: vec!["Code".to_string(), "Share %".to_string(), "Lines".to_string()],
            rows: vec![vec![
                Cell::Text("let a = \"b, c\";".to_string()),
                Cell::Percentage(50.0),
                Cell::Integer(2),
            ]],
        };
        let mut buf = Vec::new();
        write_csv(&data, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Code,Share %,Lines\n\"let a = \"\"b, c\"\";\",50.000000,2\n"
        );
    }

    #[test]
    fn test_write_csv_header_only() {
        let data = TabularData {
            header: vec!["Contributor".to_string()],
            rows: Vec::new(),
        };
        let mut buf = Vec::new();
        write_csv(&data, &mut buf).unwrap();
        assert_eq!(buf, b"Contributor\n");
    }
}
