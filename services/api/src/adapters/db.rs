//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `InterviewArchive` port from the `core` crate. It persists finished
//! interviews to PostgreSQL using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_core::domain::{InterviewRecord, Report, TranscriptEntry};
use interview_core::ports::{InterviewArchive, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `InterviewArchive` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct InterviewRow {
    id: Uuid,
    user_id: Uuid,
    session_id: Uuid,
    job_position: String,
    interview_type: String,
    difficulty: String,
    time_limit_minutes: i32,
    duration_ms: i64,
    report: Option<serde_json::Value>,
    transcript: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl InterviewRow {
    fn to_domain(self) -> PortResult<InterviewRecord> {
        let report = match self.report {
            Some(value) => Some(
                serde_json::from_value::<Report>(value)
                    .map_err(|e| PortError::Unexpected(format!("Stored report is invalid: {}", e)))?,
            ),
            None => None,
        };
        let transcript = serde_json::from_value::<Vec<TranscriptEntry>>(self.transcript)
            .map_err(|e| PortError::Unexpected(format!("Stored transcript is invalid: {}", e)))?;

        Ok(InterviewRecord {
            id: self.id,
            user_id: self.user_id,
            session_id: self.session_id,
            job_position: self
                .job_position
                .parse()
                .map_err(PortError::Unexpected)?,
            interview_type: self
                .interview_type
                .parse()
                .map_err(PortError::Unexpected)?,
            difficulty: self.difficulty.parse().map_err(PortError::Unexpected)?,
            time_limit_minutes: self.time_limit_minutes as u32,
            duration_ms: self.duration_ms,
            report,
            transcript,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `InterviewArchive` Trait Implementation
//=========================================================================================

#[async_trait]
impl InterviewArchive for DbAdapter {
    async fn save_interview(&self, record: InterviewRecord) -> PortResult<()> {
        let report = record
            .report
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let transcript = serde_json::to_value(&record.transcript)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO interviews
                (id, user_id, session_id, job_position, interview_type, difficulty,
                 time_limit_minutes, duration_ms, report, transcript, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.session_id)
        .bind(record.job_position.as_str())
        .bind(record.interview_type.as_str())
        .bind(record.difficulty.as_str())
        .bind(record.time_limit_minutes as i32)
        .bind(record.duration_ms)
        .bind(report)
        .bind(transcript)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(())
    }

    async fn interviews_for_user(&self, user_id: Uuid) -> PortResult<Vec<InterviewRecord>> {
        let rows = sqlx::query_as::<_, InterviewRow>(
            r#"
            SELECT id, user_id, session_id, job_position, interview_type, difficulty,
                   time_limit_minutes, duration_ms, report, transcript, created_at
            FROM interviews
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        rows.into_iter().map(InterviewRow::to_domain).collect()
    }
}
