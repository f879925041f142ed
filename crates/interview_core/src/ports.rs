//! crates/interview_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the chat API or database.

use crate::domain::{ChatHandle, InterviewRecord};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port and core operation.
///
/// All of these are recoverable at the request boundary; none should ever
/// take the process down.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A required field was missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The session identifier is unknown, expired, or already ended.
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    /// The upstream chat gateway failed mid-turn. Retryable: the transcript
    /// is left untouched, so resending the same utterance is safe.
    #[error("Turn failed: {0}")]
    TurnFailed(String),
    /// Malformed upstream data (corrupt PDF, or report JSON that exhausted
    /// salvage).
    #[error("Parse error: {0}")]
    ParseError(String),
    /// A report was requested before any turn occurred.
    #[error("No transcript recorded for this session yet")]
    NoTranscript,
    /// A catch-all for adapter internals (network, database, ...).
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// A stable machine-readable kind, surfaced alongside the human detail.
    pub fn kind(&self) -> &'static str {
        match self {
            PortError::InvalidInput(_) => "InvalidInput",
            PortError::SessionNotFound(_) => "SessionNotFound",
            PortError::TurnFailed(_) => "TurnFailed",
            PortError::ParseError(_) => "ParseError",
            PortError::NoTranscript => "NoTranscript",
            PortError::Unexpected(_) => "Unexpected",
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The external conversational AI, treated as an opaque stateful RPC.
///
/// The gateway accumulates conversational history on its side of the
/// `ChatHandle`; callers send one utterance and receive one response.
/// Latency is unbounded by design (generation can take minutes) so no
/// artificial timeout is applied here.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Opens a new conversational context seeded with the system prompt and
    /// a scripted acknowledgment.
    async fn open(&self, system_prompt: &str) -> PortResult<ChatHandle>;

    /// Sends one utterance (optionally with a base64-encoded still image for
    /// non-verbal-cue analysis) and returns the model's text response.
    async fn send(
        &self,
        handle: &ChatHandle,
        message: &str,
        image_b64: Option<&str>,
    ) -> PortResult<String>;

    /// Discards the conversational context behind a handle.
    async fn close(&self, handle: &ChatHandle);
}

/// One-shot text generation used to synthesize a report on demand when the
/// closing turn did not produce one.
#[async_trait]
pub trait EvaluationService: Send + Sync {
    async fn evaluate(&self, prompt: &str) -> PortResult<String>;
}

/// PDF-to-text extraction for the uploaded resume.
#[async_trait]
pub trait ResumeParser: Send + Sync {
    /// Fails with `ParseError` on corrupt input.
    async fn extract_text(&self, pdf_bytes: &[u8]) -> PortResult<String>;
}

/// The document-store collaborator that persists finished interviews keyed
/// by user identity. Plain CRUD, out of the core's hard path.
#[async_trait]
pub trait InterviewArchive: Send + Sync {
    async fn save_interview(&self, record: InterviewRecord) -> PortResult<()>;

    async fn interviews_for_user(&self, user_id: Uuid) -> PortResult<Vec<InterviewRecord>>;
}
