//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::adapters::resume::{self, ResumeInfo};
use crate::error::{ApiRejection, ErrorBody};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use interview_core::domain::{
    Difficulty, InterviewConfig, InterviewRecord, InterviewType, JobPosition, Report,
    SessionStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        init_interview_handler,
        send_message_handler,
        end_interview_handler,
        get_report_handler,
        session_status_handler,
        save_interview_handler,
        list_interviews_handler,
    ),
    components(
        schemas(
            InitInterviewResponse,
            ResumeInfo,
            SendMessageRequest,
            SendMessageResponse,
            EndInterviewRequest,
            EndInterviewResponse,
            SessionStatusResponse,
            SaveInterviewRequest,
            SavedInterviewResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "Interview API", description = "API endpoints for the simulated voice interview.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after successfully initializing an interview.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitInterviewResponse {
    session_id: Uuid,
    /// The interviewer's opening question.
    message: String,
    resume_info: ResumeInfo,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    session_id: Uuid,
    message: String,
    time_remaining_seconds: u32,
    /// Optional webcam still as a data URI, used for non-verbal-cue analysis.
    snapshot: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    message: String,
    should_end_interview: bool,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndInterviewRequest {
    session_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndInterviewResponse {
    duration_ms: i64,
    turn_count: u32,
    position: String,
    interview_type: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    active_sessions: usize,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveInterviewRequest {
    session_id: Uuid,
}

/// A persisted interview as returned by the listing endpoint.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedInterviewResponse {
    id: Uuid,
    session_id: Uuid,
    position: String,
    interview_type: String,
    difficulty: String,
    overall_score: Option<f64>,
    duration_ms: i64,
    created_at: chrono::DateTime<Utc>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Initialize a new interview session.
///
/// Accepts a multipart/form-data request with the resume PDF plus the
/// interview configuration fields, and returns the opening question.
#[utoipa::path(
    post,
    path = "/api/interview/init",
    request_body(content_type = "multipart/form-data", description = "Resume PDF plus jobDescription, jobPosition, interviewType, difficulty and timeLimit fields."),
    responses(
        (status = 201, description = "Interview session created", body = InitInterviewResponse),
        (status = 400, description = "Missing or malformed configuration", body = ErrorBody),
        (status = 422, description = "Resume PDF could not be parsed", body = ErrorBody)
    )
)]
pub async fn init_interview_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiRejection> {
    let mut resume_bytes: Option<bytes::Bytes> = None;
    let mut job_description: Option<String> = None;
    let mut job_position = JobPosition::Junior;
    let mut interview_type = InterviewType::Technical;
    let mut difficulty = Difficulty::Medium;
    let mut time_limit_minutes: u32 = 15;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiRejection::invalid_input(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let data = field.bytes().await.map_err(|e| {
                    ApiRejection::invalid_input(format!("Failed to read resume bytes: {}", e))
                })?;
                resume_bytes = Some(data);
            }
            "jobDescription" => {
                job_description = Some(read_text_field(field, "jobDescription").await?);
            }
            "jobPosition" => {
                job_position = read_text_field(field, "jobPosition")
                    .await?
                    .parse()
                    .map_err(ApiRejection::invalid_input)?;
            }
            "interviewType" => {
                interview_type = read_text_field(field, "interviewType")
                    .await?
                    .parse()
                    .map_err(ApiRejection::invalid_input)?;
            }
            "difficulty" => {
                difficulty = read_text_field(field, "difficulty")
                    .await?
                    .parse()
                    .map_err(ApiRejection::invalid_input)?;
            }
            "timeLimit" => {
                time_limit_minutes = read_text_field(field, "timeLimit")
                    .await?
                    .parse()
                    .map_err(|_| ApiRejection::invalid_input("timeLimit must be a number of minutes"))?;
            }
            _ => {}
        }
    }

    let resume_bytes =
        resume_bytes.ok_or_else(|| ApiRejection::invalid_input("Resume PDF is required"))?;
    let job_description = job_description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiRejection::invalid_input("Job description is required"))?;

    let resume_text = app_state.resume_parser.extract_text(&resume_bytes).await?;
    let resume_info = resume::extract_key_information(&resume_text);

    let config = InterviewConfig {
        job_description,
        job_position,
        interview_type,
        difficulty,
        time_limit_minutes,
        resume_text,
    };

    let (session_id, message) = app_state.orchestrator.start(config).await?;
    info!(%session_id, "Initialized interview session");

    Ok((
        StatusCode::CREATED,
        Json(InitInterviewResponse {
            session_id,
            message,
            resume_info,
        }),
    ))
}

/// Submit one candidate utterance and receive the interviewer's response.
#[utoipa::path(
    post,
    path = "/api/interview/message",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Interviewer response", body = SendMessageResponse),
        (status = 404, description = "Unknown or ended session", body = ErrorBody),
        (status = 502, description = "Upstream gateway failed; the turn is retryable", body = ErrorBody)
    )
)]
pub async fn send_message_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    if payload.message.trim().is_empty() {
        return Err(ApiRejection::invalid_input("Message must not be empty"));
    }

    let outcome = app_state
        .orchestrator
        .turn(
            payload.session_id,
            &payload.message,
            payload.time_remaining_seconds,
            payload.snapshot.as_deref(),
        )
        .await?;

    Ok(Json(SendMessageResponse {
        message: outcome.message,
        should_end_interview: outcome.should_end,
    }))
}

/// End an interview session and receive its summary.
#[utoipa::path(
    post,
    path = "/api/interview/end",
    request_body = EndInterviewRequest,
    responses(
        (status = 200, description = "Session summary", body = EndInterviewResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn end_interview_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<EndInterviewRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    let summary = app_state.orchestrator.end(payload.session_id).await?;
    Ok(Json(EndInterviewResponse {
        duration_ms: summary.duration_ms,
        turn_count: summary.turn_count,
        position: summary.position.as_str().to_string(),
        interview_type: summary.interview_type.as_str().to_string(),
    }))
}

/// Fetch the evaluation report for a session.
///
/// Returns the cached report when one was captured during the closing turn;
/// otherwise synthesizes one from the transcript. The result is cached, so
/// repeated calls return identical content.
#[utoipa::path(
    get,
    path = "/api/interview/report/{session_id}",
    params(
        ("session_id" = Uuid, Path, description = "The interview session identifier.")
    ),
    responses(
        (status = 200, description = "The structured evaluation report"),
        (status = 404, description = "Unknown or evicted session", body = ErrorBody),
        (status = 409, description = "No turns occurred yet", body = ErrorBody)
    )
)]
pub async fn get_report_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Report>, ApiRejection> {
    let report = app_state.orchestrator.report(session_id).await?;
    Ok(Json(report))
}

/// Number of sessions currently held in the registry.
#[utoipa::path(
    get,
    path = "/api/interview/status",
    responses(
        (status = 200, description = "Active session count", body = SessionStatusResponse)
    )
)]
pub async fn session_status_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse {
        active_sessions: app_state.orchestrator.active_sessions().await,
    })
}

/// Persist a finished interview to the archive on behalf of a user.
///
/// The record is assembled server-side from the session's own transcript and
/// report; a `x-user-id` header identifies the owner.
#[utoipa::path(
    post,
    path = "/api/interviews",
    request_body = SaveInterviewRequest,
    responses(
        (status = 201, description = "Interview saved", body = SavedInterviewResponse),
        (status = 400, description = "Missing or invalid x-user-id header", body = ErrorBody),
        (status = 404, description = "Unknown session", body = ErrorBody)
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn save_interview_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SaveInterviewRequest>,
) -> Result<impl IntoResponse, ApiRejection> {
    let user_id = user_id_from_headers(&headers)?;
    let session = app_state.registry.snapshot(payload.session_id).await?;

    let ended_at = match session.status {
        SessionStatus::Ended => session.ended_at.unwrap_or_else(Utc::now),
        SessionStatus::Active => Utc::now(),
    };

    let record = InterviewRecord {
        id: Uuid::new_v4(),
        user_id,
        session_id: session.id,
        job_position: session.config.job_position,
        interview_type: session.config.interview_type,
        difficulty: session.config.difficulty,
        time_limit_minutes: session.config.time_limit_minutes,
        duration_ms: (ended_at - session.started_at).num_milliseconds(),
        report: session.report,
        transcript: session.transcript,
        created_at: Utc::now(),
    };
    let response = saved_interview_response(&record);

    if let Err(e) = app_state.archive.save_interview(record).await {
        error!("Failed to save interview: {:?}", e);
        return Err(e.into());
    }

    Ok((StatusCode::CREATED, Json(response)))
}

/// List the persisted interviews for a user, newest first.
#[utoipa::path(
    get,
    path = "/api/interviews",
    responses(
        (status = 200, description = "The user's saved interviews", body = [SavedInterviewResponse]),
        (status = 400, description = "Missing or invalid x-user-id header", body = ErrorBody)
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_interviews_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SavedInterviewResponse>>, ApiRejection> {
    let user_id = user_id_from_headers(&headers)?;
    let records = app_state.archive.interviews_for_user(user_id).await?;
    Ok(Json(
        records.iter().map(saved_interview_response).collect(),
    ))
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiRejection> {
    field
        .text()
        .await
        .map_err(|e| ApiRejection::invalid_input(format!("Failed to read field '{}': {}", name, e)))
}

fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, ApiRejection> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiRejection::invalid_input("x-user-id header is required"))?;
    Uuid::parse_str(raw).map_err(|_| ApiRejection::invalid_input("Invalid x-user-id format"))
}

fn saved_interview_response(record: &InterviewRecord) -> SavedInterviewResponse {
    SavedInterviewResponse {
        id: record.id,
        session_id: record.session_id,
        position: record.job_position.as_str().to_string(),
        interview_type: record.interview_type.as_str().to_string(),
        difficulty: record.difficulty.as_str().to_string(),
        overall_score: record.report.as_ref().map(|r| r.overall_score),
        duration_ms: record.duration_ms,
        created_at: record.created_at,
    }
}
