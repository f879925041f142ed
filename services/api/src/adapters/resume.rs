//! services/api/src/adapters/resume.rs
//!
//! This module contains the resume-handling adapter: PDF text extraction
//! (implementing the `ResumeParser` port) plus the lightweight keyword
//! heuristics that summarize a resume for the init response.

use async_trait::async_trait;
use interview_core::ports::{PortError, PortResult, ResumeParser};
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ResumeParser` port using `pdf-extract`.
#[derive(Clone, Default)]
pub struct PdfResumeParser;

impl PdfResumeParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResumeParser for PdfResumeParser {
    /// Extracts plain text from a PDF. Extraction is CPU-bound, so it runs
    /// on the blocking pool.
    async fn extract_text(&self, pdf_bytes: &[u8]) -> PortResult<String> {
        let bytes = pdf_bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .map_err(|e| PortError::ParseError(format!("Failed to parse resume PDF: {}", e)))?;
        Ok(text)
    }
}

//=========================================================================================
// Resume Summary Heuristics
//=========================================================================================

/// A shallow, keyword-driven summary of a resume, returned alongside the
/// opening question so the client can show what was picked up.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumeInfo {
    pub skills: Vec<String>,
    /// Count of year-range mentions (e.g. "2020-2023"), a rough proxy for
    /// the number of listed positions.
    pub experience: usize,
    pub education: Vec<String>,
}

const SKILL_KEYWORDS: &[&str] = &[
    "JavaScript",
    "Python",
    "Java",
    "React",
    "Node.js",
    "SQL",
    "AWS",
    "Docker",
    "Kubernetes",
    "Machine Learning",
    "AI",
    "TypeScript",
    "Angular",
    "Vue",
    "MongoDB",
    "PostgreSQL",
    "Rust",
    "Go",
];

const DEGREE_KEYWORDS: &[&str] = &["bachelor", "master", "phd", "diploma", "degree"];

/// Extracts the keyword summary from resume text. Deliberately simple
/// keyword matching, not NLP.
pub fn extract_key_information(resume_text: &str) -> ResumeInfo {
    let lowered = resume_text.to_lowercase();

    let skills = SKILL_KEYWORDS
        .iter()
        .filter(|skill| lowered.contains(&skill.to_lowercase()))
        .map(|skill| skill.to_string())
        .collect();

    // Year ranges like "2020-2023", "2019 – present".
    let year_pattern = Regex::new(r"(?i)(\d{4})\s*[-\x{2013}]\s*(\d{4}|present)").unwrap();
    let experience = year_pattern.find_iter(resume_text).count();

    let education = DEGREE_KEYWORDS
        .iter()
        .filter(|degree| lowered.contains(**degree))
        .map(|degree| degree.to_string())
        .collect();

    ResumeInfo {
        skills,
        experience,
        education,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_up_skills_case_insensitively() {
        let info = extract_key_information(
            "Built services in rust and TypeScript, deployed on AWS with docker.",
        );
        assert!(info.skills.contains(&"Rust".to_string()));
        assert!(info.skills.contains(&"TypeScript".to_string()));
        assert!(info.skills.contains(&"AWS".to_string()));
        assert!(info.skills.contains(&"Docker".to_string()));
    }

    #[test]
    fn counts_year_ranges_including_present() {
        let info = extract_key_information(
            "Acme Corp, 2019-2021. Widgets Inc, 2021 - present. Graduated 2018.",
        );
        assert_eq!(info.experience, 2);
    }

    #[test]
    fn finds_degree_mentions() {
        let info =
            extract_key_information("Bachelor of Science in CS; pursuing a Master's degree.");
        assert_eq!(info.education, vec!["bachelor", "master", "degree"]);
    }

    #[test]
    fn empty_text_yields_empty_summary() {
        let info = extract_key_information("");
        assert!(info.skills.is_empty());
        assert_eq!(info.experience, 0);
        assert!(info.education.is_empty());
    }
}
