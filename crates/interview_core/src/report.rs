//! crates/interview_core/src/report.rs
//!
//! Resilient extraction of a structured [`Report`] from free-form model
//! output. Generation is non-deterministic and can be truncated by the
//! token budget, so parsing is total: every input yields a usable value,
//! and a zeroed fallback report is itself the failure signal.

use crate::domain::{QuestionAnalysis, Report, ScoringBreakdown};
use tracing::warn;

/// Parses a raw model response into a [`Report`].
///
/// Never errors. The pipeline is: strip markdown fences, slice the outermost
/// JSON object, try a direct parse, then try to salvage a truncated
/// `questionAnalysis` array, and finally fall back to a fixed placeholder.
pub fn parse(raw: &str) -> Report {
    let stripped = strip_code_fences(raw);
    let cleaned = extract_json_block(stripped);

    if let Some(report) = attempt_parse(cleaned) {
        return report;
    }

    // Salvage works on the fence-stripped text rather than the sliced block:
    // slicing to the last '}' eats the comma after the last complete array
    // element, which is exactly the boundary the salvage scan needs.
    if let Some(rebuilt) = salvage_question_analysis(stripped) {
        if let Some(report) = attempt_parse(&rebuilt) {
            warn!("Report JSON was truncated; salvaged a partial questionAnalysis array");
            return report;
        }
    }

    warn!(
        "Report JSON could not be parsed or salvaged (first 200 chars: {:?})",
        raw.chars().take(200).collect::<String>()
    );
    fallback_report()
}

/// Removes leading/trailing markdown code-fence markers, if present.
fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim_start();
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.trim_start();
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }
    cleaned.trim()
}

/// Slices the substring between the first `{` and the last `}`, defending
/// against leading or trailing prose around the JSON object.
fn extract_json_block(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// A structural parse, accepted only when the blob carries a
/// `scoringBreakdown` object and an array-valued `questionAnalysis` field
/// (both are required fields of [`Report`]).
fn attempt_parse(text: &str) -> Option<Report> {
    serde_json::from_str::<Report>(text).ok()
}

/// Repairs output truncated mid-way through the `questionAnalysis` array:
/// keeps everything up to the last fully-closed element (a `},` boundary),
/// re-closes the array, and appends the deficit of closing braces.
fn salvage_question_analysis(text: &str) -> Option<String> {
    let qa_index = text.find("\"questionAnalysis\"")?;
    let array_start = qa_index + text[qa_index..].find('[')?;
    let array_slice = &text[array_start + 1..];
    let last_complete = array_slice.rfind("},")?;

    let mut rebuilt = format!(
        "{}{}\n]",
        &text[..=array_start],
        &array_slice[..=last_complete]
    );

    let open_braces = rebuilt.matches('{').count();
    let close_braces = rebuilt.matches('}').count();
    if open_braces > close_braces {
        rebuilt.push('\n');
        rebuilt.extend(std::iter::repeat('}').take(open_braces - close_braces));
    }
    Some(rebuilt)
}

/// The fixed placeholder returned when both the direct parse and the salvage
/// pass fail. Zeroed scores plus the single explanatory mistake entry are
/// the caller-visible failure signal.
fn fallback_report() -> Report {
    Report {
        overall_score: 0.0,
        scoring_breakdown: ScoringBreakdown {
            technical_accuracy: 0.0,
            communication_clarity: 0.0,
            confidence_index: 0.0,
        },
        question_analysis: Vec::new(),
        top_mistakes: vec![
            "Report generation encountered an error. The AI response was incomplete or malformed."
                .to_string(),
        ],
        strengths: Vec::new(),
        summary: "Unable to generate complete report. Please try again or check interview transcript manually."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "overallScore": 7.5,
        "scoringBreakdown": {"technicalAccuracy": 8, "communicationClarity": 7, "confidenceIndex": 7.5},
        "questionAnalysis": [
            {"question": "What is ownership?", "answer": "Each value has one owner.", "feedback": "Accurate and concise."}
        ],
        "topMistakes": ["Rushed the system design answer"],
        "strengths": ["Clear explanations"],
        "summary": "A solid performance overall. Communication was clear throughout."
    }"#;

    #[test]
    fn well_formed_json_round_trips() {
        let report = parse(WELL_FORMED);
        assert_eq!(report.overall_score, 7.5);
        assert_eq!(report.scoring_breakdown.technical_accuracy, 8.0);
        assert_eq!(report.question_analysis.len(), 1);
        assert_eq!(report.question_analysis[0].question, "What is ownership?");
        assert_eq!(report.top_mistakes, vec!["Rushed the system design answer"]);

        let reserialized = serde_json::to_string(&report).unwrap();
        assert_eq!(parse(&reserialized), report);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let fenced = format!("```json\n{}\n```", WELL_FORMED);
        assert_eq!(parse(&fenced), parse(WELL_FORMED));

        let bare_fence = format!("```\n{}\n```", WELL_FORMED);
        assert_eq!(parse(&bare_fence), parse(WELL_FORMED));
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let chatty = format!("Here is the evaluation you asked for:\n{}\nHope that helps!", WELL_FORMED);
        assert_eq!(parse(&chatty), parse(WELL_FORMED));
    }

    #[test]
    fn truncation_mid_second_element_salvages_the_first() {
        // Cut off mid-way through the second questionAnalysis element, as a
        // token budget would.
        let truncated = r#"{
            "overallScore": 6.8,
            "scoringBreakdown": {"technicalAccuracy": 7, "communicationClarity": 6.5, "confidenceIndex": 7},
            "questionAnalysis": [
                {"question": "Explain indexes.", "answer": "They speed up lookups.", "feedback": "Correct but shallow."},
                {"question": "Describe a deadlock.", "answer": "Two transactions wait on ea"#;

        let report = parse(truncated);
        assert_eq!(report.question_analysis.len(), 1);
        assert_eq!(report.question_analysis[0].question, "Explain indexes.");
        // Scores survive: this is the salvage path, not the fallback.
        assert_eq!(report.overall_score, 6.8);
        assert_eq!(report.scoring_breakdown.communication_clarity, 6.5);
        assert!(report.top_mistakes.is_empty());
        assert!(report.summary.is_empty());
    }

    #[test]
    fn truncation_mid_later_element_keeps_earlier_boundary() {
        let truncated = r#"{
            "overallScore": 8.1,
            "scoringBreakdown": {"technicalAccuracy": 8, "communicationClarity": 8, "confidenceIndex": 8},
            "questionAnalysis": [
                {"question": "Q1", "answer": "A1", "feedback": "F1"},
                {"question": "Q2", "answer": "A2", "feedback": "F2"},
                {"question": "Q3", "answer": "A3", "feedback": "Started strong but the resp"#;

        let report = parse(truncated);
        assert!(!report.question_analysis.is_empty());
        assert_eq!(report.question_analysis[0].question, "Q1");
        assert_eq!(report.overall_score, 8.1);
    }

    #[test]
    fn garbage_yields_the_fixed_fallback() {
        let report = parse("not json at all");
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.scoring_breakdown.technical_accuracy, 0.0);
        assert!(report.question_analysis.is_empty());
        assert_eq!(report.top_mistakes.len(), 1);
        assert!(report.strengths.is_empty());
        assert!(report.summary.contains("Unable to generate complete report"));
    }

    #[test]
    fn missing_scoring_breakdown_is_not_accepted_as_a_report() {
        // Structurally valid JSON, but not a report.
        let report = parse(r#"{"overallScore": 9.0, "questionAnalysis": []}"#);
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.top_mistakes.len(), 1);
    }

    #[test]
    fn empty_input_yields_fallback() {
        let report = parse("");
        assert_eq!(report.top_mistakes.len(), 1);
    }
}
