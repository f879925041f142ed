//! crates/interview_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seniority level the interview is calibrated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPosition {
    Intern,
    Junior,
    Senior,
}

impl JobPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPosition::Intern => "intern",
            JobPosition::Junior => "junior",
            JobPosition::Senior => "senior",
        }
    }
}

impl std::str::FromStr for JobPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intern" => Ok(JobPosition::Intern),
            "junior" => Ok(JobPosition::Junior),
            "senior" => Ok(JobPosition::Senior),
            other => Err(format!("'{}' is not a valid job position", other)),
        }
    }
}

/// The focus area of the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Technical,
    Hr,
    Hybrid,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Technical => "technical",
            InterviewType::Hr => "hr",
            InterviewType::Hybrid => "hybrid",
        }
    }
}

impl std::str::FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technical" => Ok(InterviewType::Technical),
            "hr" => Ok(InterviewType::Hr),
            "hybrid" => Ok(InterviewType::Hybrid),
            other => Err(format!("'{}' is not a valid interview type", other)),
        }
    }
}

/// How demanding the generated questions should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("'{}' is not a valid difficulty", other)),
        }
    }
}

/// Immutable configuration captured when an interview session is created.
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    pub job_description: String,
    pub job_position: JobPosition,
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub time_limit_minutes: u32,
    /// Plain text extracted from the candidate's uploaded resume PDF.
    pub resume_text: String,
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Interviewer,
    Candidate,
}

/// A single utterance in the interview transcript.
///
/// The transcript is append-only; insertion order is significant because it
/// is replayed verbatim into the report prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// An opaque reference to the conversational context held by the chat
/// gateway. The gateway accumulates history server-side; the session owns
/// this handle exclusively and never reconstructs history itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatHandle(pub Uuid);

impl ChatHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChatHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a session. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Ended,
}

/// One ongoing (or recently ended) simulated interview.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub config: InterviewConfig,
    pub chat: ChatHandle,
    pub transcript: Vec<TranscriptEntry>,
    pub turn_count: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Write-once: set either opportunistically during the closing turn or
    /// lazily on demand, never recomputed afterwards.
    pub report: Option<Report>,
    pub status: SessionStatus,
}

impl Session {
    pub fn new(config: InterviewConfig, chat: ChatHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            chat,
            transcript: Vec::new(),
            turn_count: 0,
            started_at: Utc::now(),
            ended_at: None,
            report: None,
            status: SessionStatus::Active,
        }
    }
}

/// What `end` hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub duration_ms: i64,
    pub turn_count: u32,
    pub position: JobPosition,
    pub interview_type: InterviewType,
}

/// Per-dimension scores in the structured evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringBreakdown {
    #[serde(default)]
    pub technical_accuracy: f64,
    #[serde(default)]
    pub communication_clarity: f64,
    #[serde(default)]
    pub confidence_index: f64,
}

/// Feedback on a single question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub feedback: String,
}

/// The structured post-interview evaluation.
///
/// Field names match the JSON the evaluation model is instructed to emit.
/// `scoring_breakdown` and `question_analysis` are deliberately required:
/// a blob missing either is not accepted as a report, which is what routes
/// truncated output into the salvage pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub overall_score: f64,
    pub scoring_breakdown: ScoringBreakdown,
    pub question_analysis: Vec<QuestionAnalysis>,
    #[serde(default)]
    pub top_mistakes: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// A persisted record of a finished interview, saved to the archive
/// collaborator on behalf of a known user.
#[derive(Debug, Clone)]
pub struct InterviewRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub job_position: JobPosition,
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub time_limit_minutes: u32,
    pub duration_ms: i64,
    pub report: Option<Report>,
    pub transcript: Vec<TranscriptEntry>,
    pub created_at: DateTime<Utc>,
}
