//! crates/interview_core/src/prompt.rs
//!
//! Pure prompt construction: everything the downstream model is told about
//! the interview lives here, as deterministic string templates with no state.

use crate::domain::{Difficulty, InterviewConfig, InterviewType, Speaker, TranscriptEntry};

/// Scripted assistant reply used to seed the chat context right after the
/// system prompt, before the first real exchange.
pub const SEED_ACKNOWLEDGMENT: &str =
    "Understood. I am ready to conduct the interview. Every response will end with a clear question.";

/// Scripted trigger utterance that elicits the opening question.
pub const OPENING_TRIGGER: &str = "Please start the interview with an opening question.";

/// Literal token separating the closing statement from the embedded report
/// JSON in the final model response.
pub const REPORT_DELIMITER: &str = "---REPORT---";

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are an AI interviewer conducting a {interview_type} interview for a {job_position} position.

Job Description:
{job_description}

Candidate's Resume:
{resume_text}

Your role:
- Ask relevant interview questions based on the job description and position level
{focus_lines}
- Question difficulty: {difficulty_line}
- Be conversational and professional
- Ask follow-up questions based on candidate responses

The interview has a time budget of {time_limit} minutes. Pace your questions accordingly.

CRITICAL RULES:
1. EVERY response MUST end with a clear, direct question
2. Keep responses concise (3 sentences maximum, including the question)
3. Never repeat questions already asked
4. Format: [Brief acknowledgment/comment] + [Clear Question]
5. Example: "That's great experience with React. How would you handle state management in a large-scale application?"

Remember: ALWAYS end your response with a question mark (?). Your response is incomplete without a question."#;

const REPORT_SCHEMA_BLOCK: &str = r#"{
  "overallScore": <0-10, one decimal>,
  "scoringBreakdown": {"technicalAccuracy":<0-10>,"communicationClarity":<0-10>,"confidenceIndex":<0-10>},
  "questionAnalysis": [{"question":"<q>","answer":"<a>","feedback":"<specific feedback>"}],
  "topMistakes": ["<mistake1>","<mistake2>","<mistake3>","<mistake4>","<mistake5>"],
  "strengths": ["<strength1>","<strength2>","<strength3>","<strength4>","<strength5>"],
  "summary": "<2-3 sentences>"
}"#;

/// Builds the system prompt that seeds the gateway's conversational context.
///
/// Pure and deterministic: the same config always yields the same string.
pub fn build_system_prompt(config: &InterviewConfig) -> String {
    let focus_lines = match config.interview_type {
        InterviewType::Technical => {
            "- Focus on technical skills, problem-solving, coding concepts, and system design"
        }
        InterviewType::Hr => {
            "- Focus on behavioral questions, team fit, communication skills, and career goals"
        }
        InterviewType::Hybrid => {
            "- Alternate between technical depth (skills, problem-solving, system design) and behavioral topics (teamwork, communication, career goals)"
        }
    };

    let difficulty_line = match config.difficulty {
        Difficulty::Easy => "stick to fundamentals and straightforward questions",
        Difficulty::Medium => "ask applied, analytical questions that require reasoning",
        Difficulty::Hard => "ask advanced questions that demand critical thinking",
    };

    let resume_text = if config.resume_text.trim().is_empty() {
        "Resume information will be analyzed separately"
    } else {
        config.resume_text.as_str()
    };

    SYSTEM_PROMPT_TEMPLATE
        .replace("{interview_type}", config.interview_type.as_str())
        .replace("{job_position}", config.job_position.as_str())
        .replace("{job_description}", &config.job_description)
        .replace("{resume_text}", resume_text)
        .replace("{focus_lines}", focus_lines)
        .replace("{difficulty_line}", difficulty_line)
        .replace("{time_limit}", &config.time_limit_minutes.to_string())
}

/// Decorates a candidate utterance with the machine-readable time annotation.
///
/// Below 60 seconds remaining the decoration also embeds the closing
/// instruction: a short closing statement, the literal delimiter, then a
/// JSON report. This interleaves report generation with the final turn so
/// no second round-trip is needed.
pub fn decorate_utterance(utterance: &str, time_remaining_secs: u32) -> String {
    let minutes = time_remaining_secs / 60;
    let seconds = time_remaining_secs % 60;

    if time_remaining_secs < 60 {
        format!(
            "{utterance}\n\n[Time remaining: {minutes} minutes {seconds} seconds. The interview is ending now. \
             Respond with a brief closing statement (2 sentences maximum) thanking the candidate. \
             Then, on a new line, write exactly {delim} followed by a JSON object with this structure, \
             evaluating the candidate's actual answers from this conversation:\n{schema}\nReturn nothing after the JSON.]",
            utterance = utterance,
            minutes = minutes,
            seconds = seconds,
            delim = REPORT_DELIMITER,
            schema = REPORT_SCHEMA_BLOCK,
        )
    } else {
        format!(
            "{}\n\n[Time remaining: {} minutes {} seconds]",
            utterance, minutes, seconds
        )
    }
}

/// Builds the one-shot evaluation prompt used when a report is requested on
/// demand from the full transcript.
pub fn build_report_prompt(config: &InterviewConfig, transcript: &[TranscriptEntry]) -> String {
    let transcript_text = transcript
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let tag = match entry.speaker {
                Speaker::Interviewer => "Q",
                Speaker::Candidate => "A",
            };
            format!("{}. {}: {}", idx + 1, tag, entry.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Evaluate interview: {position} ({itype}, {difficulty}, {limit}min)\n\n\
         Job: {job}\n\n\
         TRANSCRIPT:\n{transcript}\n\n\
         Generate JSON report:\n{schema}\n\n\
         Requirements:\n\
         - Be specific, reference actual answers\n\
         - Provide actionable feedback\n\
         - Balance criticism with encouragement\n\
         - Technical interview: focus on accuracy\n\
         - HR interview: focus on soft skills\n\
         - Hybrid: balance both\n\
         - Return ONLY JSON",
        position = config.job_position.as_str(),
        itype = config.interview_type.as_str(),
        difficulty = config.difficulty.as_str(),
        limit = config.time_limit_minutes,
        job = config.job_description,
        transcript = transcript_text,
        schema = REPORT_SCHEMA_BLOCK,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, InterviewConfig, InterviewType, JobPosition};

    fn config(interview_type: InterviewType, difficulty: Difficulty) -> InterviewConfig {
        InterviewConfig {
            job_description: "Build and operate distributed systems in Rust.".to_string(),
            job_position: JobPosition::Senior,
            interview_type,
            difficulty,
            time_limit_minutes: 15,
            resume_text: "Five years of backend experience.".to_string(),
        }
    }

    #[test]
    fn system_prompt_mentions_role_and_rules() {
        let prompt = build_system_prompt(&config(InterviewType::Technical, Difficulty::Hard));
        assert!(prompt.contains("technical interview for a senior position"));
        assert!(prompt.contains("Build and operate distributed systems in Rust."));
        assert!(prompt.contains("Five years of backend experience."));
        assert!(prompt.contains("system design"));
        assert!(prompt.contains("critical thinking"));
        assert!(prompt.contains("time budget of 15 minutes"));
        assert!(prompt.contains("EVERY response MUST end with a clear, direct question"));
        assert!(prompt.contains("Never repeat questions already asked"));
    }

    #[test]
    fn system_prompt_is_deterministic() {
        let cfg = config(InterviewType::Hybrid, Difficulty::Medium);
        assert_eq!(build_system_prompt(&cfg), build_system_prompt(&cfg));
    }

    #[test]
    fn hr_prompt_focuses_on_behavior() {
        let prompt = build_system_prompt(&config(InterviewType::Hr, Difficulty::Easy));
        assert!(prompt.contains("behavioral questions"));
        assert!(prompt.contains("fundamentals"));
        assert!(!prompt.contains("system design"));
    }

    #[test]
    fn decoration_carries_minutes_and_seconds() {
        let decorated = decorate_utterance("I would use a hash map.", 500);
        assert!(decorated.starts_with("I would use a hash map."));
        assert!(decorated.contains("[Time remaining: 8 minutes 20 seconds]"));
        assert!(!decorated.contains(REPORT_DELIMITER));
    }

    #[test]
    fn decoration_embeds_closing_instruction_below_sixty_seconds() {
        let decorated = decorate_utterance("That is my final answer.", 30);
        assert!(decorated.contains("0 minutes 30 seconds"));
        assert!(decorated.contains(REPORT_DELIMITER));
        assert!(decorated.contains("\"questionAnalysis\""));
    }

    #[test]
    fn report_prompt_numbers_the_transcript() {
        let transcript = vec![
            TranscriptEntry {
                speaker: Speaker::Candidate,
                text: "I led a migration to Kubernetes.".to_string(),
            },
            TranscriptEntry {
                speaker: Speaker::Interviewer,
                text: "What was the hardest part?".to_string(),
            },
        ];
        let prompt = build_report_prompt(&config(InterviewType::Technical, Difficulty::Medium), &transcript);
        assert!(prompt.contains("1. A: I led a migration to Kubernetes."));
        assert!(prompt.contains("2. Q: What was the hardest part?"));
        assert!(prompt.contains("Return ONLY JSON"));
    }
}
