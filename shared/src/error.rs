use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    LocationTimeout,
    SignalUnavailable,
    Network,
    Server,
    Parse,
    Validation,
    Submission,
    Authentication,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::LocationTimeout => "LOCATION_TIMEOUT",
            Self::SignalUnavailable => "SIGNAL_UNAVAILABLE",
            Self::Network => "NETWORK_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Parse => "PARSE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Submission => "SUBMISSION_ERROR",
            Self::Authentication => "AUTH_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::LocationTimeout
            | Self::SignalUnavailable
            | Self::Network
            | Self::Server
            | Self::Submission
            | Self::PermissionDenied => ErrorSeverity::Transient,

            Self::Parse | Self::Validation | Self::Authentication | Self::Internal => {
                ErrorSeverity::Permanent
            }
        }
    }

    /// Whether the user can usefully try again. Permission denial counts: the
    /// next refresh tick asks the platform again.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::PermissionDenied
                | Self::LocationTimeout
                | Self::SignalUnavailable
                | Self::Network
                | Self::Server
                | Self::Submission
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::PermissionDenied => {
                "Location access is required to find vets near you. Please enable location permissions in Settings."
                    .into()
            }
            ErrorKind::LocationTimeout => {
                "Finding your location took too long. We'll try again shortly.".into()
            }
            ErrorKind::SignalUnavailable => {
                "Unable to determine your location. Please check your GPS settings.".into()
            }
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Validation
            | ErrorKind::Submission
            | ErrorKind::Server
            | ErrorKind::Parse => {
                self.message.clone()
            }
            ErrorKind::Internal => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    /// Maps a non-2xx backend answer onto an error. 401 and 403 mean the
    /// session is gone whichever endpoint answered.
    #[must_use]
    pub fn from_http_status(fallback: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => ErrorKind::Authentication,
            _ => fallback,
        };

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Extracts the `detail` field from an error body. Django REST returns either
/// a string or a list of strings there.
#[must_use]
pub fn detail_message(body: &[u8]) -> Option<String> {
    let response = serde_json::from_slice::<ApiErrorResponse>(body).ok()?;
    match response.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(serde_json::Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        _ => None,
    }
}
