//! crates/interview_core/src/registry.rs
//!
//! The in-memory session arena. An explicit registry object (passed by
//! handle to whoever needs it) replaces any ambient process-wide map, and
//! all mutation happens under per-session locks; there is no global lock
//! across sessions.

use crate::domain::{Report, Session, SessionStatus, SessionSummary};
use crate::ports::{PortError, PortResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// One registry entry. The record lock is held only for short, in-memory
/// mutations; the turn gate is held across an entire turn (including the
/// long-latency gateway call) to serialize concurrent turns on one session
/// without blocking reads or `end`.
pub struct SessionSlot {
    pub record: Mutex<Session>,
    pub turn_gate: Mutex<()>,
}

/// Outcome of marking a session ended. `newly_ended` tells the caller
/// whether this call performed the transition (and should therefore
/// schedule eviction) or merely observed an already-ended session.
pub struct EndOutcome {
    pub summary: SessionSummary,
    pub newly_ended: bool,
}

/// Mapping from session identifier to session record. Owns lifecycle state
/// but performs no I/O of its own.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionSlot>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly created session and returns its identifier.
    ///
    /// Identifiers are v4 UUIDs (122 random bits), so uniqueness holds
    /// without coordination.
    pub async fn insert(&self, session: Session) -> Uuid {
        let id = session.id;
        let slot = Arc::new(SessionSlot {
            record: Mutex::new(session),
            turn_gate: Mutex::new(()),
        });
        self.sessions.write().await.insert(id, slot);
        id
    }

    /// Looks up the slot for a session, shared-lock only.
    pub async fn slot(&self, id: Uuid) -> PortResult<Arc<SessionSlot>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::SessionNotFound(id.to_string()))
    }

    /// Returns a point-in-time clone of the session record.
    pub async fn snapshot(&self, id: Uuid) -> PortResult<Session> {
        let slot = self.slot(id).await?;
        let record = slot.record.lock().await;
        Ok(record.clone())
    }

    /// Idempotent first-write: once a report is set it is never replaced.
    pub async fn set_report(&self, id: Uuid, report: Report) -> PortResult<()> {
        let slot = self.slot(id).await?;
        let mut record = slot.record.lock().await;
        if record.report.is_none() {
            record.report = Some(report);
        }
        Ok(())
    }

    /// Marks a session ended and returns its summary.
    ///
    /// The transition is one-way: a second call returns the same summary
    /// without resetting `ended_at`, and an in-flight turn that finishes
    /// afterwards may still append its result but cannot un-end the session.
    pub async fn end(&self, id: Uuid) -> PortResult<EndOutcome> {
        let slot = self.slot(id).await?;
        let mut record = slot.record.lock().await;

        let newly_ended = record.status == SessionStatus::Active;
        if newly_ended {
            record.status = SessionStatus::Ended;
            record.ended_at = Some(Utc::now());
        }

        let ended_at = record.ended_at.unwrap_or_else(Utc::now);
        Ok(EndOutcome {
            summary: SessionSummary {
                duration_ms: (ended_at - record.started_at).num_milliseconds(),
                turn_count: record.turn_count,
                position: record.config.job_position,
                interview_type: record.config.interview_type,
            },
            newly_ended,
        })
    }

    /// Physically removes a session (eviction), returning the final record.
    pub async fn remove(&self, id: Uuid) -> Option<Session> {
        let slot = self.sessions.write().await.remove(&id)?;
        let record = slot.record.lock().await;
        Some(record.clone())
    }

    /// Number of entries currently held, active or pending eviction.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
