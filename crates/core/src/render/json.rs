//! JSON rendering for reports

use crate::report::Report;

/// Render the report as a pretty-printed JSON string
pub fn render_json_string(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisKind, Attribute, LineRecord, Warning};
    use crate::report::AnalysisResult;
    use serde_json::Value;
    use std::path::PathBuf;
    use time::macros::datetime;

    #[test]
    fn test_render_json_lines() {
        let record = LineRecord {
            file_path: PathBuf::from("README.md"),
            file_name: "README.md".to_string(),
            line_no: 1,
            code: "# demo".to_string(),
            commit: "e".repeat(40),
            timestamp: datetime!(2020-01-02 03:04:05 -05:00),
            contributor: "Lin".to_string(),
        };
        let mut report = Report::new(
            PathBuf::from("/repo"),
            AnalysisKind::LineBlame,
            vec![Attribute::Contributor, Attribute::Code],
            1,
            AnalysisResult::Lines(vec![record.clone()]),
        );
        report.add_warning(Warning::EmptyFile {
            path: PathBuf::from("empty.txt"),
        });

        let json = render_json_string(&report).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "line_blame");
        assert_eq!(value["line_count"], 1);
        assert_eq!(value["result"]["kind"], "lines");
        assert_eq!(
            value["result"]["data"][0]["timestamp"],
            "2020-01-02T03:04:05-05:00"
        );
        assert_eq!(value["warnings"][0]["type"], "empty_file");

        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.records(), Some(&[record][..]));
    }
}
