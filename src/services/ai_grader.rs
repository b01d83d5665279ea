use serde::{Deserialize, Serialize};

use crate::config::GraderConfig;
use crate::store::operations::content::Assignment;
use crate::store::operations::submissions::SubmissionStatus;

/// Outcome of one grading attempt. `grade` never errors: any failure along
/// the collaborator path collapses into a Pending verdict with score 0, so
/// the submission waits for manual review instead of being lost.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeVerdict {
    pub score: u32,
    pub feedback: String,
    pub status: SubmissionStatus,
}

impl GradeVerdict {
    fn pending(feedback: impl Into<String>) -> Self {
        Self {
            score: 0,
            feedback: feedback.into(),
            status: SubmissionStatus::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiGrader {
    config: GraderConfig,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
enum GraderError {
    #[error("grader request failed: {0}")]
    Network(String),
    #[error("grader api error: status={0}")]
    ApiStatus(u16),
    #[error("grader returned an unparseable verdict")]
    MalformedVerdict,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct RawVerdict {
    score: u32,
    #[serde(default)]
    feedback: String,
}

impl AiGrader {
    pub fn new(config: &GraderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Validate grader configuration at startup.
    /// Panics when real mode is requested without an API key, since every
    /// grading call would silently fall back to Pending.
    pub fn validate_config(config: &GraderConfig) {
        if config.enabled && !config.mock && config.api_key.is_empty() {
            panic!(
                "Invalid grader configuration: enabled=true and mock=false \
                 but GRADER_API_KEY is empty. Set the key, or set \
                 GRADER_MOCK=true or GRADER_ENABLED=false."
            );
        }
    }

    /// Grade one submission against its assignment. Approval is automatic at
    /// or above the configured score threshold; below it the submission is
    /// rejected with the model's feedback attached.
    pub async fn grade(
        &self,
        assignment: &Assignment,
        submission_text: Option<&str>,
        submission_url: Option<&str>,
    ) -> GradeVerdict {
        if !self.config.enabled {
            return GradeVerdict::pending("Automatic grading is disabled; awaiting manual review");
        }
        if self.config.mock {
            return self.verdict_from_score(85, "Mock grading feedback".to_string());
        }

        match self
            .call_model(assignment, submission_text, submission_url)
            .await
        {
            Ok(raw) => self.verdict_from_score(raw.score.min(100), raw.feedback),
            Err(e) => {
                tracing::warn!(
                    assignment_id = %assignment.id,
                    error = %e,
                    "AI grading failed, leaving submission pending"
                );
                GradeVerdict::pending("Automatic grading unavailable; awaiting manual review")
            }
        }
    }

    fn verdict_from_score(&self, score: u32, feedback: String) -> GradeVerdict {
        let status = if score >= self.config.approve_threshold {
            SubmissionStatus::Approved
        } else {
            SubmissionStatus::Rejected
        };
        GradeVerdict {
            score,
            feedback,
            status,
        }
    }

    async fn call_model(
        &self,
        assignment: &Assignment,
        submission_text: Option<&str>,
        submission_url: Option<&str>,
    ) -> Result<RawVerdict, GraderError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a strict grader. Respond with only a JSON object: \
                              {\"score\": <0-100 integer>, \"feedback\": <string>}."
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(assignment, submission_text, submission_url),
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GraderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraderError::ApiStatus(status.as_u16()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GraderError::Network(e.to_string()))?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or(GraderError::MalformedVerdict)?;

        parse_verdict(content).ok_or(GraderError::MalformedVerdict)
    }
}

fn build_prompt(
    assignment: &Assignment,
    submission_text: Option<&str>,
    submission_url: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Assignment: {}\nDescription: {}\nMax score: {}\n",
        assignment.title, assignment.description, assignment.max_score
    );
    if let Some(text) = submission_text {
        prompt.push_str("Submission text:\n");
        prompt.push_str(text);
        prompt.push('\n');
    }
    if let Some(url) = submission_url {
        prompt.push_str("Submission URL: ");
        prompt.push_str(url);
        prompt.push('\n');
    }
    prompt.push_str("Grade the submission from 0 to 100.");
    prompt
}

/// Models wrap the JSON in prose or code fences often enough that we scan
/// for the outermost braces instead of parsing the content verbatim.
fn parse_verdict(content: &str) -> Option<RawVerdict> {
    if let Ok(v) = serde_json::from_str::<RawVerdict>(content) {
        return Some(v);
    }
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}
