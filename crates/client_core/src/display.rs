//! Plain-text renderers for progress and results. They only read what they
//! are given.

use std::fmt::Write as _;

use shared::domain::{AnalysisStatus, AnalysisStep, DocumentAnalysis, RiskLevel, StepStatus};

use crate::intake::ACCEPTED_TYPES;

pub const PROGRESS_HEADING: &str = "AI Analysis Progress";

pub fn step_marker(index: usize, status: StepStatus) -> String {
    match status {
        StepStatus::Completed => "[✓]".to_string(),
        StepStatus::Processing => "[…]".to_string(),
        StepStatus::Pending => format!("[{}]", index + 1),
    }
}

pub fn render_progress(steps: &[AnalysisStep]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{PROGRESS_HEADING}");
    for (index, step) in steps.iter().enumerate() {
        let _ = writeln!(out, "{} {}", step_marker(index, step.status), step.title);
        let _ = writeln!(out, "    {}", step.description);
    }
    out
}

pub fn risk_badge(level: RiskLevel) -> String {
    format!("Risk Level: {}", level.label())
}

pub fn render_intake_banner(is_analyzing: bool) -> String {
    if is_analyzing {
        return "Analyzing Document...\n\
                Our AI is reviewing your document and preparing a simplified analysis.\n"
            .to_string();
    }

    let labels: Vec<&str> = ACCEPTED_TYPES.iter().map(|accepted| accepted.label).collect();
    format!(
        "Upload Your Legal Document\n\
         Provide the path of a legal document to analyze.\n\
         Accepted: {}\n\
         Your documents are processed locally and never stored.\n",
        labels.join(", ")
    )
}

pub fn render_results(analysis: &DocumentAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", analysis.file_name);

    if analysis.status == AnalysisStatus::Error {
        let _ = writeln!(out, "Analysis failed: {}", analysis.summary);
        return out;
    }

    let _ = writeln!(
        out,
        "{} • Analyzed on {}",
        analysis.document_type,
        analysis.upload_date.format("%Y-%m-%d")
    );
    let _ = writeln!(out, "{}", risk_badge(analysis.risk_level));

    section(&mut out, "Document Summary");
    let _ = writeln!(out, "{}", analysis.summary);

    section(&mut out, "Plain Language Explanation");
    let _ = writeln!(out, "{}", analysis.plain_language_explanation);

    section(&mut out, "Key Points");
    numbered(&mut out, &analysis.key_points);

    section(&mut out, "Recommendations");
    numbered(&mut out, &analysis.recommendations);

    section(&mut out, "Important Clauses");
    for clause in &analysis.important_clauses {
        let _ = writeln!(out, "- {} importance", clause.importance.as_str());
        let _ = writeln!(out, "  \"{}\"", clause.clause);
        let _ = writeln!(out, "  {}", clause.explanation);
    }

    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## {title}");
}

fn numbered(out: &mut String, items: &[String]) {
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{ImportantClause, Importance, StepDefinition};

    fn steps() -> Vec<AnalysisStep> {
        let mut steps: Vec<AnalysisStep> = [
            ("1", "Document Processing"),
            ("2", "Legal Term Identification"),
            ("3", "Risk Assessment"),
        ]
        .into_iter()
        .map(|(id, title)| StepDefinition::new(id, title, "desc").to_pending_step())
        .collect();
        steps[0].status = StepStatus::Completed;
        steps[1].status = StepStatus::Processing;
        steps
    }

    #[test]
    fn progress_uses_markers_by_status() {
        let rendered = render_progress(&steps());
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], PROGRESS_HEADING);
        assert_eq!(lines[1], "[✓] Document Processing");
        assert_eq!(lines[3], "[…] Legal Term Identification");
        assert_eq!(lines[5], "[3] Risk Assessment");
    }

    #[test]
    fn rendering_does_not_touch_input() {
        let input = steps();
        let before = input.clone();
        let _ = render_progress(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn results_list_sections_in_order() {
        let mut analysis = DocumentAnalysis::errored("contract.pdf", "");
        analysis.status = AnalysisStatus::Completed;
        analysis.document_type = "NDA".into();
        analysis.risk_level = RiskLevel::High;
        analysis.summary = "Short summary".into();
        analysis.key_points = vec!["first".into(), "second".into()];
        analysis.recommendations = vec!["negotiate".into()];
        analysis.important_clauses = vec![ImportantClause {
            clause: "Non-compete for 12 months".into(),
            explanation: "Limits future work".into(),
            importance: Importance::High,
        }];

        let rendered = render_results(&analysis);
        assert!(rendered.starts_with("contract.pdf\nNDA • Analyzed on "));
        assert!(rendered.contains("Risk Level: High"));
        assert!(rendered.contains("1. first\n2. second\n"));
        assert!(rendered.contains("- high importance\n  \"Non-compete for 12 months\""));

        let summary = rendered.find("## Document Summary").expect("summary");
        let clauses = rendered.find("## Important Clauses").expect("clauses");
        assert!(summary < clauses);
    }

    #[test]
    fn errored_results_show_failure_only() {
        let analysis = DocumentAnalysis::errored("contract.pdf", "engine unavailable");
        let rendered = render_results(&analysis);
        assert_eq!(
            rendered,
            "contract.pdf\nAnalysis failed: engine unavailable\n"
        );
    }

    #[test]
    fn banner_lists_accepted_types_when_idle() {
        assert!(render_intake_banner(false).contains("Accepted: PDF, DOC, DOCX, TXT"));
        assert!(render_intake_banner(true).starts_with("Analyzing Document..."));
    }
}
