pub mod domain;
pub mod orchestrator;
pub mod ports;
pub mod prompt;
pub mod registry;
pub mod report;

pub use domain::{
    ChatHandle, Difficulty, InterviewConfig, InterviewRecord, InterviewType, JobPosition,
    QuestionAnalysis, Report, ScoringBreakdown, Session, SessionStatus, SessionSummary, Speaker,
    TranscriptEntry,
};
pub use orchestrator::{InterviewOrchestrator, TurnOutcome, RETENTION_WINDOW};
pub use ports::{
    ChatGateway, EvaluationService, InterviewArchive, PortError, PortResult, ResumeParser,
};
pub use registry::SessionRegistry;
