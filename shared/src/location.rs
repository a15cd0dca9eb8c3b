use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::LocationResponse;
use crate::coordinate::{self, Coordinate};
use crate::error::{AppError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location fix timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("location signal unavailable: {reason}")]
    SignalUnavailable { reason: String },
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        let kind = match e {
            LocationError::PermissionDenied => ErrorKind::PermissionDenied,
            LocationError::Timeout { .. } => ErrorKind::LocationTimeout,
            LocationError::SignalUnavailable { .. } => ErrorKind::SignalUnavailable,
        };
        AppError::new(kind, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    #[default]
    Unknown,
    Requesting,
    Granted,
    Denied,
}

impl PermissionState {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Reads the shell's answer to a permission prompt.
pub fn interpret_permission(response: &LocationResponse) -> Result<(), LocationError> {
    match response {
        LocationResponse::Permission { granted: true } => Ok(()),
        LocationResponse::Permission { granted: false } => Err(LocationError::PermissionDenied),
        other => {
            debug!(?other, "Unexpected answer to permission request");
            Err(LocationError::PermissionDenied)
        }
    }
}

/// Reads the shell's answer to a position request. A payload that does not
/// parse into a coordinate counts as no signal.
pub fn interpret_fix(response: LocationResponse, timeout_ms: u64) -> Result<Coordinate, LocationError> {
    match response {
        LocationResponse::Fix { payload } => coordinate::parse(&payload).map_err(|e| {
            LocationError::SignalUnavailable {
                reason: e.to_string(),
            }
        }),
        LocationResponse::TimedOut => Err(LocationError::Timeout { timeout_ms }),
        LocationResponse::Unavailable { reason } => Err(LocationError::SignalUnavailable { reason }),
        LocationResponse::Permission { granted: false } => Err(LocationError::PermissionDenied),
        LocationResponse::Permission { granted: true } => Err(LocationError::SignalUnavailable {
            reason: "shell answered a position request with a permission grant".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_permission_granted() {
        assert_eq!(
            interpret_permission(&LocationResponse::Permission { granted: true }),
            Ok(())
        );
    }

    #[test]
    fn test_permission_denied() {
        assert_eq!(
            interpret_permission(&LocationResponse::Permission { granted: false }),
            Err(LocationError::PermissionDenied)
        );
        assert_eq!(
            interpret_permission(&LocationResponse::TimedOut),
            Err(LocationError::PermissionDenied)
        );
    }

    #[test]
    fn test_fix_parses_platform_payload() {
        let payload = json!({
            "coords": {"latitude": -1.2921, "longitude": 36.8219, "accuracy": 12.0},
            "timestamp": 1_700_000_000_000_u64
        });
        let coordinate = interpret_fix(LocationResponse::Fix { payload }, 15_000).unwrap();
        assert_eq!(coordinate.as_tuple(), (-1.2921, 36.8219));
    }

    #[test]
    fn test_unparsable_fix_is_signal_unavailable() {
        let payload = json!({"coords": {"latitude": "abc", "longitude": 0}});
        assert!(matches!(
            interpret_fix(LocationResponse::Fix { payload }, 15_000),
            Err(LocationError::SignalUnavailable { .. })
        ));
    }

    #[test]
    fn test_timeout_carries_configured_value() {
        assert_eq!(
            interpret_fix(LocationResponse::TimedOut, 8_000),
            Err(LocationError::Timeout { timeout_ms: 8_000 })
        );
    }

    #[test]
    fn test_location_error_kinds() {
        let e: AppError = LocationError::PermissionDenied.into();
        assert_eq!(e.kind, ErrorKind::PermissionDenied);
        let e: AppError = LocationError::Timeout { timeout_ms: 1 }.into();
        assert_eq!(e.kind, ErrorKind::LocationTimeout);
        assert!(e.is_retryable());
        let e: AppError = LocationError::SignalUnavailable { reason: "gps off".into() }.into();
        assert_eq!(e.kind, ErrorKind::SignalUnavailable);
    }
}
