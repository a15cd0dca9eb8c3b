//! Composing and sending a service request to one selected vet.
//!
//! ```text
//! Idle -> CandidateSelected -> Composing -> Submitting -> Succeeded
//!                                  ^             |
//!                                  +-- failure --+
//! ```
//!
//! A failed send lands back in `Composing` with the draft untouched and the
//! failure message attached. Cancelling from any state returns to `Idle`.
//! Every send is stamped with an [`Attempt`]; a completion whose attempt is
//! not the one currently in flight is dropped.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::candidate::CandidateId;
use crate::capabilities::{HttpError, HttpMethod, HttpRequest, HttpResult};
use crate::config::DiscoveryConfig;
use crate::error::{detail_message, AppError, ErrorKind};
use crate::{MAX_MESSAGE_CHARS, MAX_SIGNS_CHARS};

pub const SUBMISSION_PATH: &str = "vet_requests";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attempt(pub u64);

/// Reference to an image picked by the shell. The core never sees the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDraft {
    pub candidate_id: CandidateId,
    pub message: String,
    pub signs: String,
    pub attachment: Option<AttachmentRef>,
}

impl RequestDraft {
    #[must_use]
    pub fn new(candidate_id: CandidateId) -> Self {
        Self {
            candidate_id,
            message: String::new(),
            signs: String::new(),
            attachment: None,
        }
    }

    pub fn validate(&self) -> Result<(), SubmissionError> {
        let message = self.message.trim();
        if message.is_empty() {
            return Err(SubmissionError::Validation(
                "Please describe what's wrong before sending.".to_string(),
            ));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(SubmissionError::Validation(format!(
                "Message is too long (max {MAX_MESSAGE_CHARS} characters)."
            )));
        }
        if self.signs.trim().chars().count() > MAX_SIGNS_CHARS {
            return Err(SubmissionError::Validation(format!(
                "Signs are too long (max {MAX_SIGNS_CHARS} characters)."
            )));
        }
        Ok(())
    }
}

/// Why the composer is showing a message next to the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftIssue {
    /// The draft failed local checks. Nothing was sent.
    Invalid { message: String },
    /// The last send failed. This is the `Failed` step of the flow.
    SendFailed { message: String, retryable: bool },
}

impl DraftIssue {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Invalid { message } | Self::SendFailed { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    #[default]
    Idle,
    CandidateSelected {
        candidate_id: CandidateId,
    },
    Composing {
        draft: RequestDraft,
        issue: Option<DraftIssue>,
    },
    Submitting {
        draft: RequestDraft,
        attempt: Attempt,
    },
    Succeeded {
        candidate_id: CandidateId,
    },
}

impl SubmissionState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CandidateSelected { .. } => "candidate_selected",
            Self::Composing { .. } => "composing",
            Self::Submitting { .. } => "submitting",
            Self::Succeeded { .. } => "succeeded",
        }
    }

    #[must_use]
    pub fn candidate_id(&self) -> Option<&CandidateId> {
        match self {
            Self::Idle => None,
            Self::CandidateSelected { candidate_id } | Self::Succeeded { candidate_id } => {
                Some(candidate_id)
            }
            Self::Composing { draft, .. } | Self::Submitting { draft, .. } => {
                Some(&draft.candidate_id)
            }
        }
    }

    #[must_use]
    pub fn draft(&self) -> Option<&RequestDraft> {
        match self {
            Self::Composing { draft, .. } | Self::Submitting { draft, .. } => Some(draft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Validation(String),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("request rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(HttpError),
    #[error("request could not be built: {0}")]
    Unsendable(String),
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Validation(message) => AppError::new(ErrorKind::Validation, message),
            SubmissionError::InvalidTransition { .. } | SubmissionError::Unsendable(_) => {
                AppError::new(ErrorKind::Internal, e.to_string())
            }
            SubmissionError::Rejected { status, message } => {
                AppError::from_http_status(ErrorKind::Submission, status, message)
            }
            SubmissionError::Transport(err) => AppError::new(
                ErrorKind::Submission,
                "Could not send your request. Check your connection and try again.",
            )
            .with_internal(err.to_string()),
        }
    }
}

/// What happened to a completion handed to [`SubmissionFlow::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Succeeded { candidate_id: CandidateId },
    Failed { error: SubmissionError },
    Discarded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFlow {
    state: SubmissionState,
    attempts: u64,
}

impl SubmissionFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    #[must_use]
    pub fn selected(&self) -> Option<&CandidateId> {
        self.state.candidate_id()
    }

    fn reject(&self, action: &'static str) -> SubmissionError {
        SubmissionError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Selecting a different vet while composing abandons the draft.
    pub fn select(&mut self, candidate_id: CandidateId) -> Result<(), SubmissionError> {
        if matches!(self.state, SubmissionState::Submitting { .. }) {
            return Err(self.reject("select a vet"));
        }
        if let SubmissionState::Composing { draft, .. } = &self.state {
            if draft.candidate_id == candidate_id {
                return Ok(());
            }
            debug!(candidate_id = %draft.candidate_id, "Abandoning draft for new selection");
        }
        self.state = SubmissionState::CandidateSelected { candidate_id };
        Ok(())
    }

    pub fn open_composer(&mut self) -> Result<(), SubmissionError> {
        match &self.state {
            SubmissionState::CandidateSelected { candidate_id } => {
                self.state = SubmissionState::Composing {
                    draft: RequestDraft::new(candidate_id.clone()),
                    issue: None,
                };
                Ok(())
            }
            SubmissionState::Composing { .. } => Ok(()),
            _ => Err(self.reject("open the composer")),
        }
    }

    /// Any edit clears the issue shown for the previous version of the draft.
    fn draft_mut(&mut self, action: &'static str) -> Result<&mut RequestDraft, SubmissionError> {
        let state = self.state.name();
        match &mut self.state {
            SubmissionState::Composing { draft, issue } => {
                *issue = None;
                Ok(draft)
            }
            _ => Err(SubmissionError::InvalidTransition { action, state }),
        }
    }

    pub fn set_message(&mut self, message: String) -> Result<(), SubmissionError> {
        self.draft_mut("edit the message")?.message = message;
        Ok(())
    }

    pub fn set_signs(&mut self, signs: String) -> Result<(), SubmissionError> {
        self.draft_mut("edit the signs")?.signs = signs;
        Ok(())
    }

    pub fn set_attachment(&mut self, attachment: Option<AttachmentRef>) -> Result<(), SubmissionError> {
        self.draft_mut("change the attachment")?.attachment = attachment;
        Ok(())
    }

    /// Validates the draft and moves to `Submitting`. On a validation
    /// failure the state stays `Composing` with the message attached.
    pub fn submit(&mut self) -> Result<(RequestDraft, Attempt), SubmissionError> {
        let state = self.state.name();
        let SubmissionState::Composing { draft, issue } = &mut self.state else {
            return Err(SubmissionError::InvalidTransition {
                action: "submit",
                state,
            });
        };

        if let Err(e) = draft.validate() {
            *issue = Some(DraftIssue::Invalid {
                message: e.to_string(),
            });
            return Err(e);
        }

        self.attempts += 1;
        let attempt = Attempt(self.attempts);
        let draft = draft.clone();
        self.state = SubmissionState::Submitting {
            draft: draft.clone(),
            attempt,
        };
        Ok((draft, attempt))
    }

    pub fn complete(&mut self, attempt: Attempt, outcome: Result<(), SubmissionError>) -> Completion {
        let SubmissionState::Submitting {
            draft,
            attempt: current,
        } = &self.state
        else {
            debug!(attempt = attempt.0, state = self.state.name(), "Discarding submission result, nothing in flight");
            return Completion::Discarded;
        };

        if *current != attempt {
            debug!(attempt = attempt.0, current = current.0, "Discarding superseded submission result");
            return Completion::Discarded;
        }

        match outcome {
            Ok(()) => {
                let candidate_id = draft.candidate_id.clone();
                info!(candidate_id = %candidate_id, attempt = attempt.0, "Vet request submitted");
                self.state = SubmissionState::Succeeded {
                    candidate_id: candidate_id.clone(),
                };
                Completion::Succeeded { candidate_id }
            }
            Err(error) => {
                warn!(candidate_id = %draft.candidate_id, attempt = attempt.0, error = %error, "Vet request failed");
                let app_error = AppError::from(error.clone());
                self.state = SubmissionState::Composing {
                    draft: draft.clone(),
                    issue: Some(DraftIssue::SendFailed {
                        message: app_error.user_facing_message(),
                        retryable: app_error.is_retryable(),
                    }),
                };
                Completion::Failed { error }
            }
        }
    }

    pub fn cancel(&mut self) {
        if let SubmissionState::Submitting { attempt, .. } = &self.state {
            debug!(attempt = attempt.0, "Cancelling in-flight submission");
        }
        self.state = SubmissionState::Idle;
    }

    pub fn acknowledge(&mut self) -> Result<(), SubmissionError> {
        match self.state {
            SubmissionState::Succeeded { .. } => {
                self.state = SubmissionState::Idle;
                Ok(())
            }
            _ => Err(self.reject("acknowledge success")),
        }
    }
}

#[derive(Serialize)]
struct SubmissionBody<'a> {
    message: &'a str,
    signs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<&'a AttachmentRef>,
}

pub fn build_submission_request(
    config: &DiscoveryConfig,
    draft: &RequestDraft,
    token: Option<&SecretString>,
) -> Result<HttpRequest, AppError> {
    let url = config
        .base_url()?
        .with_segments(&[SUBMISSION_PATH, draft.candidate_id.as_str()])?;

    let mut request = HttpRequest::new(HttpMethod::Post, url)
        .with_json(&SubmissionBody {
            message: draft.message.trim(),
            signs: draft.signs.trim(),
            attachment: draft.attachment.as_ref(),
        })?
        .with_timeout_ms(config.request_timeout_ms)?;

    match token {
        Some(token) => request = request.with_bearer_token(token.expose_secret())?,
        None => warn!(candidate_id = %draft.candidate_id, "No auth token available, submitting without Authorization"),
    }

    Ok(request)
}

pub fn interpret_submission_response(result: HttpResult) -> Result<(), SubmissionError> {
    let response = result.map_err(SubmissionError::Transport)?;
    if response.is_success() {
        return Ok(());
    }

    let message = detail_message(response.body())
        .unwrap_or_else(|| format!("Request failed with HTTP {}", response.status()));
    Err(SubmissionError::Rejected {
        status: response.status(),
        message,
    })
}
