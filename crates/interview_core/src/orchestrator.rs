//! crates/interview_core/src/orchestrator.rs
//!
//! The interview state machine. A session moves `Active -> Ended` (with a
//! closing turn in between once the time signal drops below the threshold);
//! there is no way back from `Ended`. The orchestrator consumes candidate
//! utterances, decorates them with time context, drives the chat gateway,
//! maintains the transcript, and interleaves report extraction with the
//! final turn.

use crate::domain::{Report, Session, SessionStatus, SessionSummary, Speaker, TranscriptEntry};
use crate::ports::{ChatGateway, EvaluationService, PortError, PortResult};
use crate::prompt;
use crate::registry::SessionRegistry;
use crate::report;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How long an ended session stays queryable before eviction.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Below this many seconds remaining, the next exchange is the closing turn.
/// The threshold is strict: exactly 60 seconds does not trigger it.
const CLOSING_THRESHOLD_SECS: u32 = 60;

/// What a processed turn hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The text to display/speak. On the closing turn this is only the
    /// closing statement, never the raw response with the embedded report.
    pub message: String,
    pub should_end: bool,
}

/// Drives interview sessions end to end. The registry is injected storage;
/// the gateway and evaluator are opaque upstream services.
pub struct InterviewOrchestrator {
    registry: Arc<SessionRegistry>,
    chat: Arc<dyn ChatGateway>,
    evaluator: Arc<dyn EvaluationService>,
    retention: Duration,
    shutdown: CancellationToken,
}

impl InterviewOrchestrator {
    pub fn new(
        registry: Arc<SessionRegistry>,
        chat: Arc<dyn ChatGateway>,
        evaluator: Arc<dyn EvaluationService>,
    ) -> Self {
        Self::with_retention(registry, chat, evaluator, RETENTION_WINDOW)
    }

    pub fn with_retention(
        registry: Arc<SessionRegistry>,
        chat: Arc<dyn ChatGateway>,
        evaluator: Arc<dyn EvaluationService>,
        retention: Duration,
    ) -> Self {
        Self {
            registry,
            chat,
            evaluator,
            retention,
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a session: builds the system prompt, opens a seeded gateway
    /// context, obtains the opening question via the scripted trigger, and
    /// registers the session. The opening question is returned to the caller
    /// but not recorded in the transcript, which only holds real turns.
    pub async fn start(
        &self,
        config: crate::domain::InterviewConfig,
    ) -> PortResult<(Uuid, String)> {
        let system_prompt = prompt::build_system_prompt(&config);
        let handle = self.chat.open(&system_prompt).await?;

        let opening_question = match self.chat.send(&handle, prompt::OPENING_TRIGGER, None).await {
            Ok(text) => text,
            Err(e) => {
                // Don't leak a context the session will never own.
                self.chat.close(&handle).await;
                return Err(e);
            }
        };

        let session = Session::new(config, handle);
        let id = self.registry.insert(session).await;
        info!(session_id = %id, "Interview session started");
        Ok((id, opening_question))
    }

    /// Processes one candidate utterance.
    ///
    /// Turns on the same session are serialized by the slot's turn gate. The
    /// transcript is only touched after the gateway call succeeds, so a
    /// `TurnFailed` turn leaves no orphaned candidate entry and the same
    /// utterance can simply be resent.
    pub async fn turn(
        &self,
        id: Uuid,
        utterance: &str,
        time_remaining_secs: u32,
        snapshot: Option<&str>,
    ) -> PortResult<TurnOutcome> {
        let slot = self.registry.slot(id).await?;
        let _gate = slot.turn_gate.lock().await;

        let handle = {
            let record = slot.record.lock().await;
            if record.status == SessionStatus::Ended {
                return Err(PortError::SessionNotFound(format!(
                    "session {} has already ended",
                    id
                )));
            }
            record.chat
        };

        let decorated = prompt::decorate_utterance(utterance, time_remaining_secs);
        let image = snapshot.map(strip_data_uri_prefix);

        let response = self
            .chat
            .send(&handle, &decorated, image)
            .await
            .map_err(|e| PortError::TurnFailed(e.to_string()))?;

        let should_end = time_remaining_secs < CLOSING_THRESHOLD_SECS;

        // The closing turn may interleave the report with the spoken outro.
        let (message, embedded_report) = if should_end {
            match response.split_once(prompt::REPORT_DELIMITER) {
                Some((closing, report_json)) => {
                    (closing.trim().to_string(), Some(report::parse(report_json)))
                }
                None => {
                    warn!(session_id = %id, "Closing turn produced no report delimiter");
                    (response.clone(), None)
                }
            }
        } else {
            (response.clone(), None)
        };

        {
            // An `end()` racing this turn is fine: the completed exchange is
            // still recorded, but status and ended_at stay untouched.
            let mut record = slot.record.lock().await;
            record.transcript.push(TranscriptEntry {
                speaker: Speaker::Candidate,
                text: utterance.to_string(),
            });
            record.transcript.push(TranscriptEntry {
                speaker: Speaker::Interviewer,
                text: response,
            });
            record.turn_count += 1;
            if let Some(report) = embedded_report {
                if record.report.is_none() {
                    info!(session_id = %id, "Report captured during closing turn");
                    record.report = Some(report);
                }
            }
        }

        Ok(TurnOutcome {
            message,
            should_end,
        })
    }

    /// Marks a session ended and schedules its eviction. Repeated calls
    /// return the same summary; only the first schedules the timer. An
    /// in-flight turn is not cancelled.
    pub async fn end(&self, id: Uuid) -> PortResult<SessionSummary> {
        let outcome = self.registry.end(id).await?;
        if outcome.newly_ended {
            info!(
                session_id = %id,
                duration_ms = outcome.summary.duration_ms,
                turns = outcome.summary.turn_count,
                "Interview session ended"
            );
            self.schedule_eviction(id);
        }
        Ok(outcome.summary)
    }

    /// Returns the evaluation report for a session.
    ///
    /// Cached-first: once a report exists it is returned verbatim, with no
    /// further upstream calls. Otherwise one evaluation call is made over
    /// the full transcript and parsed leniently; the extractor never fails,
    /// so a zeroed fallback report is the worst case.
    pub async fn report(&self, id: Uuid) -> PortResult<Report> {
        let session = self.registry.snapshot(id).await?;
        if let Some(report) = session.report {
            return Ok(report);
        }
        if session.transcript.is_empty() {
            return Err(PortError::NoTranscript);
        }

        let report_prompt = prompt::build_report_prompt(&session.config, &session.transcript);
        let raw = self.evaluator.evaluate(&report_prompt).await?;
        let report = report::parse(&raw);

        // First write wins; hand back whatever is stored so concurrent
        // requests observe identical content.
        self.registry.set_report(id, report.clone()).await?;
        let stored = self.registry.snapshot(id).await?.report;
        Ok(stored.unwrap_or(report))
    }

    /// Number of sessions currently held (active or awaiting eviction).
    pub async fn active_sessions(&self) -> usize {
        self.registry.count().await
    }

    /// Cancels all pending eviction timers. Sessions are best-effort and not
    /// durably persisted before an explicit save, so losing timers across a
    /// restart is acceptable.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// One-shot, cancellable eviction task for an ended session.
    fn schedule_eviction(&self, id: Uuid) {
        let registry = Arc::clone(&self.registry);
        let chat = Arc::clone(&self.chat);
        let retention = self.retention;
        let token = self.shutdown.child_token();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(retention) => {
                    match registry.remove(id).await {
                        Some(session) => {
                            chat.close(&session.chat).await;
                            info!(session_id = %id, "Evicted ended session after retention window");
                        }
                        None => error!(session_id = %id, "Eviction found no session to remove"),
                    }
                }
            }
        });
    }
}

/// Strips a `data:image/...;base64,` prefix so only the raw base64 payload
/// is transmitted upstream.
fn strip_data_uri_prefix(snapshot: &str) -> &str {
    if snapshot.starts_with("data:") {
        match snapshot.find("base64,") {
            Some(idx) => &snapshot[idx + "base64,".len()..],
            None => snapshot,
        }
    } else {
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatHandle, Difficulty, InterviewConfig, InterviewType, JobPosition};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// A gateway that replays scripted responses and records what it saw.
    #[derive(Default)]
    struct ScriptedGateway {
        responses: Mutex<VecDeque<PortResult<String>>>,
        sent: Mutex<Vec<(String, Option<String>)>>,
        closed: Mutex<Vec<ChatHandle>>,
    }

    impl ScriptedGateway {
        async fn push_ok(&self, text: &str) {
            self.responses.lock().await.push_back(Ok(text.to_string()));
        }

        async fn push_err(&self, detail: &str) {
            self.responses
                .lock()
                .await
                .push_back(Err(PortError::Unexpected(detail.to_string())));
        }
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn open(&self, _system_prompt: &str) -> PortResult<ChatHandle> {
            Ok(ChatHandle::new())
        }

        async fn send(
            &self,
            _handle: &ChatHandle,
            message: &str,
            image_b64: Option<&str>,
        ) -> PortResult<String> {
            self.sent
                .lock()
                .await
                .push((message.to_string(), image_b64.map(str::to_string)));
            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok("Interesting. Can you expand on that?".to_string()))
        }

        async fn close(&self, handle: &ChatHandle) {
            self.closed.lock().await.push(*handle);
        }
    }

    /// An evaluator that returns a fixed blob and counts invocations.
    struct CountingEvaluator {
        response: String,
        calls: AtomicUsize,
    }

    impl CountingEvaluator {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EvaluationService for CountingEvaluator {
        async fn evaluate(&self, _prompt: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    const REPORT_JSON: &str = r#"{
        "overallScore": 7.2,
        "scoringBreakdown": {"technicalAccuracy": 7, "communicationClarity": 7.5, "confidenceIndex": 7},
        "questionAnalysis": [{"question": "Q", "answer": "A", "feedback": "F"}],
        "topMistakes": ["Vague on testing"],
        "strengths": ["Good fundamentals"],
        "summary": "A decent interview."
    }"#;

    fn config() -> InterviewConfig {
        InterviewConfig {
            job_description: "Rust backend role".to_string(),
            job_position: JobPosition::Junior,
            interview_type: InterviewType::Technical,
            difficulty: Difficulty::Hard,
            time_limit_minutes: 15,
            resume_text: "Some resume text".to_string(),
        }
    }

    fn orchestrator(
        gateway: Arc<ScriptedGateway>,
        evaluator: Arc<CountingEvaluator>,
    ) -> InterviewOrchestrator {
        InterviewOrchestrator::new(Arc::new(SessionRegistry::new()), gateway, evaluator)
    }

    #[tokio::test]
    async fn start_returns_opening_question_and_registers_session() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Tell me about yourself?").await;
        let orch = orchestrator(gateway.clone(), Arc::new(CountingEvaluator::new("{}")));

        assert_eq!(orch.active_sessions().await, 0);
        let (id, opening) = orch.start(config()).await.unwrap();
        assert_eq!(opening, "Tell me about yourself?");
        assert_eq!(orch.active_sessions().await, 1);

        // The opening trigger went out; the transcript starts empty.
        let sent = gateway.sent.lock().await;
        assert_eq!(sent[0].0, prompt::OPENING_TRIGGER);
        drop(sent);
        assert!(orch.registry.snapshot(id).await.unwrap().transcript.is_empty());
    }

    #[tokio::test]
    async fn transcript_grows_by_two_per_turn_in_call_order() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        gateway.push_ok("First follow-up?").await;
        gateway.push_ok("Second follow-up?").await;
        let orch = orchestrator(gateway.clone(), Arc::new(CountingEvaluator::new("{}")));

        let (id, _) = orch.start(config()).await.unwrap();
        let first = orch.turn(id, "Answer one", 500, None).await.unwrap();
        assert!(!first.should_end);
        orch.turn(id, "Answer two", 400, None).await.unwrap();

        let transcript = orch.registry.snapshot(id).await.unwrap().transcript;
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[0].speaker, Speaker::Candidate);
        assert_eq!(transcript[0].text, "Answer one");
        assert_eq!(transcript[1].speaker, Speaker::Interviewer);
        assert_eq!(transcript[1].text, "First follow-up?");
        assert_eq!(transcript[2].text, "Answer two");
        assert_eq!(transcript[3].text, "Second follow-up?");
    }

    #[tokio::test]
    async fn failed_turn_leaves_transcript_untouched_and_is_retryable() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        gateway.push_err("upstream flaked").await;
        gateway.push_ok("Recovered follow-up?").await;
        let orch = orchestrator(gateway.clone(), Arc::new(CountingEvaluator::new("{}")));

        let (id, _) = orch.start(config()).await.unwrap();
        let err = orch.turn(id, "My answer", 300, None).await.unwrap_err();
        assert!(matches!(err, PortError::TurnFailed(_)));
        assert!(orch.registry.snapshot(id).await.unwrap().transcript.is_empty());

        // Resending the same utterance duplicates nothing.
        orch.turn(id, "My answer", 290, None).await.unwrap();
        let transcript = orch.registry.snapshot(id).await.unwrap().transcript;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].text, "My answer");
    }

    #[tokio::test]
    async fn closing_turn_splits_report_and_caches_it() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        gateway.push_ok("Mid follow-up?").await;
        gateway
            .push_ok(&format!(
                "Thank you for your time, that concludes our interview. Best of luck!\n{}\n{}",
                prompt::REPORT_DELIMITER,
                REPORT_JSON
            ))
            .await;
        let evaluator = Arc::new(CountingEvaluator::new("{}"));
        let orch = orchestrator(gateway.clone(), evaluator.clone());

        let (id, _) = orch.start(config()).await.unwrap();

        let first = orch.turn(id, "Answer", 500, None).await.unwrap();
        assert!(!first.should_end);
        assert_eq!(
            orch.registry.snapshot(id).await.unwrap().transcript.len(),
            2
        );

        let closing = orch.turn(id, "Final answer", 30, None).await.unwrap();
        assert!(closing.should_end);
        assert_eq!(
            closing.message,
            "Thank you for your time, that concludes our interview. Best of luck!"
        );

        // The report came from the closing turn; no evaluation call is made.
        let report = orch.report(id).await.unwrap();
        assert_eq!(report.overall_score, 7.2);
        assert_eq!(evaluator.call_count(), 0);
    }

    #[tokio::test]
    async fn closing_turn_without_delimiter_returns_full_response() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        gateway.push_ok("Thanks, we are out of time. Goodbye!").await;
        let orch = orchestrator(gateway.clone(), Arc::new(CountingEvaluator::new("{}")));

        let (id, _) = orch.start(config()).await.unwrap();
        let outcome = orch.turn(id, "Answer", 45, None).await.unwrap();
        assert!(outcome.should_end);
        assert_eq!(outcome.message, "Thanks, we are out of time. Goodbye!");
        assert!(orch.registry.snapshot(id).await.unwrap().report.is_none());
    }

    #[tokio::test]
    async fn sixty_seconds_is_not_the_closing_turn_but_fifty_nine_is() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        let orch = orchestrator(gateway.clone(), Arc::new(CountingEvaluator::new("{}")));
        let (id, _) = orch.start(config()).await.unwrap();

        let at_sixty = orch.turn(id, "Answer", 60, None).await.unwrap();
        assert!(!at_sixty.should_end);

        let at_fifty_nine = orch.turn(id, "Answer", 59, None).await.unwrap();
        assert!(at_fifty_nine.should_end);
    }

    #[tokio::test]
    async fn lazy_report_is_generated_once_and_cached() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        let evaluator = Arc::new(CountingEvaluator::new(REPORT_JSON));
        let orch = orchestrator(gateway.clone(), evaluator.clone());

        let (id, _) = orch.start(config()).await.unwrap();
        orch.turn(id, "Answer", 120, None).await.unwrap();

        let first = orch.report(id).await.unwrap();
        let second = orch.report(id).await.unwrap();
        assert_eq!(evaluator.call_count(), 1);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn report_before_any_turn_is_no_transcript() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        let orch = orchestrator(gateway.clone(), Arc::new(CountingEvaluator::new("{}")));

        let (id, _) = orch.start(config()).await.unwrap();
        assert!(matches!(
            orch.report(id).await,
            Err(PortError::NoTranscript)
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found_everywhere() {
        let orch = orchestrator(
            Arc::new(ScriptedGateway::default()),
            Arc::new(CountingEvaluator::new("{}")),
        );
        let id = Uuid::new_v4();

        assert!(matches!(
            orch.turn(id, "hello", 100, None).await,
            Err(PortError::SessionNotFound(_))
        ));
        assert!(matches!(
            orch.end(id).await,
            Err(PortError::SessionNotFound(_))
        ));
        assert!(matches!(
            orch.report(id).await,
            Err(PortError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn turn_after_end_is_rejected_but_report_still_readable() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        let evaluator = Arc::new(CountingEvaluator::new(REPORT_JSON));
        let orch = orchestrator(gateway.clone(), evaluator.clone());

        let (id, _) = orch.start(config()).await.unwrap();
        orch.turn(id, "Answer", 200, None).await.unwrap();

        let summary = orch.end(id).await.unwrap();
        assert_eq!(summary.turn_count, 1);
        assert_eq!(summary.position, JobPosition::Junior);

        assert!(matches!(
            orch.turn(id, "Too late", 100, None).await,
            Err(PortError::SessionNotFound(_))
        ));
        // Still readable inside the retention window.
        assert_eq!(orch.report(id).await.unwrap().overall_score, 7.2);
    }

    #[tokio::test(start_paused = true)]
    async fn ended_sessions_are_evicted_after_the_retention_window() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        let orch = InterviewOrchestrator::with_retention(
            Arc::new(SessionRegistry::new()),
            gateway.clone(),
            Arc::new(CountingEvaluator::new("{}")),
            Duration::from_secs(5),
        );

        let (id, _) = orch.start(config()).await.unwrap();
        orch.end(id).await.unwrap();
        assert_eq!(orch.active_sessions().await, 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(orch.active_sessions().await, 0);
        assert!(matches!(
            orch.report(id).await,
            Err(PortError::SessionNotFound(_))
        ));
        assert_eq!(gateway.closed.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_data_uri_prefix_is_stripped() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.push_ok("Opening?").await;
        gateway.push_ok("Noted. Next question?").await;
        let orch = orchestrator(gateway.clone(), Arc::new(CountingEvaluator::new("{}")));

        let (id, _) = orch.start(config()).await.unwrap();
        orch.turn(
            id,
            "Answer",
            500,
            Some("data:image/jpeg;base64,AAAABBBB"),
        )
        .await
        .unwrap();

        let sent = gateway.sent.lock().await;
        let (message, image) = &sent[1];
        assert!(message.contains("[Time remaining: 8 minutes 20 seconds]"));
        assert_eq!(image.as_deref(), Some("AAAABBBB"));
    }

    #[test]
    fn strip_data_uri_prefix_passes_bare_base64_through() {
        assert_eq!(strip_data_uri_prefix("AAAA"), "AAAA");
        assert_eq!(strip_data_uri_prefix("data:image/png;base64,XYZ"), "XYZ");
    }
}
