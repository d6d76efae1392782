//! Text-based rendering for reports

use crate::breakdown::BreakdownNode;
use crate::report::Report;

/// Render the breakdown as an indented tree
pub fn render_tree(report: &Report) -> String {
    let Some(breakdown) = report.breakdown() else {
        return format!("No breakdown available for {}\n", report.kind);
    };
    if breakdown.is_empty() {
        return "No lines were attributed\n".to_string();
    }

    let mut out = String::new();
    for node in &breakdown.nodes {
        render_node(node, 0, &mut out);
    }
    out
}

fn render_node(node: &BreakdownNode, depth: usize, out: &mut String) {
    let indent = "   ".repeat(depth);
    let connector = if depth == 0 { "" } else { "└─ " };
    out.push_str(&format!(
        "{}{}{} {:.2}% ({} lines)\n",
        indent, connector, node.value, node.percentage, node.count
    ));
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

/// Render a single-line summary
pub fn render_short(report: &Report) -> String {
    let top = report
        .breakdown()
        .and_then(|b| b.nodes.first())
        .map(|n| format!(" → top: {} ({:.1}%)", n.value, n.percentage))
        .unwrap_or_default();

    let warn_indicator = if report.has_warnings() {
        format!(" [{}⚠]", report.warnings.len())
    } else {
        String::new()
    };

    format!(
        "{}: {} lines in {} files{}{}",
        report.kind, report.line_count, report.files_analyzed, top, warn_indicator
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::build_breakdown;
    use crate::models::{AnalysisKind, Attribute, LineRecord};
    use crate::report::AnalysisResult;
    use std::path::PathBuf;
    use time::macros::datetime;

    fn records() -> Vec<LineRecord> {
        [("ada", "lib.rs"), ("ada", "lib.rs"), ("ada", "main.py"), ("grace", "lib.rs")]
            .iter()
            .enumerate()
            .map(|(i, (who, name))| LineRecord {
                file_path: PathBuf::from("src").join(name),
                file_name: name.to_string(),
                line_no: i as u32 + 1,
                code: String::new(),
                commit: "c".repeat(40),
                timestamp: datetime!(2021-06-01 00:00:00 UTC),
                contributor: who.to_string(),
            })
            .collect()
    }

    fn sample_report() -> Report {
        let breakdown = build_breakdown(&records(), &[Attribute::Contributor]).unwrap();
        Report::new(
            PathBuf::from("/work/demo"),
            AnalysisKind::Contributions,
            vec![Attribute::Contributor],
            1,
            AnalysisResult::Breakdown(breakdown),
        )
    }

    #[test]
    fn test_render_short() {
        let output = render_short(&sample_report());
        assert!(output.starts_with("contributions: 4 lines in 1 files"));
        assert!(output.contains("ada (75.0%)"));
    }

    #[test]
    fn test_render_tree_lists_groups() {
        let output = render_tree(&sample_report());
        assert_eq!(
            output,
            "ada 75.00% (3 lines)\ngrace 25.00% (1 lines)\n"
        );
    }

    #[test]
    fn test_render_tree_nests_children() {
        let columns = vec![Attribute::Contributor, Attribute::FileType];
        let breakdown = build_breakdown(&records(), &columns).unwrap();
        let report = Report::new(
            PathBuf::from("/work/demo"),
            AnalysisKind::Breakdown,
            columns,
            2,
            AnalysisResult::Breakdown(breakdown),
        );
        assert_eq!(
            render_tree(&report),
            "ada 75.00% (3 lines)\n   └─ rs 66.67% (2 lines)\n   └─ py 33.33% (1 lines)\n\
             grace 25.00% (1 lines)\n   └─ rs 100.00% (1 lines)\n"
        );
    }
}
