//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use interview_core::{
    orchestrator::InterviewOrchestrator,
    ports::{InterviewArchive, ResumeParser},
    registry::SessionRegistry,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The registry is the same instance the orchestrator was built around; it is
/// exposed here so the archive handlers can snapshot session records directly.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub orchestrator: Arc<InterviewOrchestrator>,
    pub resume_parser: Arc<dyn ResumeParser>,
    pub archive: Arc<dyn InterviewArchive>,
    pub config: Arc<Config>,
}
