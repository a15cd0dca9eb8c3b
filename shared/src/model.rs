use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateId, RankedCandidate, RawCandidate};
use crate::config::DiscoveryConfig;
use crate::coordinate::Coordinate;
use crate::error::{AppError, ErrorSeverity};
use crate::location::PermissionState;
use crate::ranking::rank;
use crate::scheduler::{Generation, RefreshScheduler};
use crate::submission::SubmissionFlow;

/// Where the user was and who was near them, as of one completed cycle.
/// Replaced as a whole so the two never disagree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProximitySnapshot {
    center: Option<Coordinate>,
    source: Vec<RawCandidate>,
    ranked: Vec<RankedCandidate>,
    generation: Generation,
}

impl ProximitySnapshot {
    #[must_use]
    pub fn ranked(
        generation: Generation,
        center: Coordinate,
        source: Vec<RawCandidate>,
        radius_km: f64,
    ) -> Self {
        let ranked = rank(center, &source, radius_km);
        Self {
            center: Some(center),
            source,
            ranked,
            generation,
        }
    }

    #[must_use]
    pub fn center(&self) -> Option<Coordinate> {
        self.center
    }

    #[must_use]
    pub fn candidates(&self) -> &[RankedCandidate] {
        &self.ranked
    }

    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn find(&self, id: &CandidateId) -> Option<&RankedCandidate> {
        self.ranked.iter().find(|c| &c.id == id)
    }

    /// Same center and records, new radius.
    #[must_use]
    pub fn with_radius(&self, radius_km: f64) -> Self {
        match self.center {
            Some(center) => Self::ranked(self.generation, center, self.source.clone(), radius_km),
            None => self.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub retryable: bool,
    pub error_code: Option<String>,
}

impl Notification {
    #[must_use]
    pub fn new(id: u64, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            id,
            message: message.into(),
            kind,
            retryable: false,
            error_code: None,
        }
    }

    #[must_use]
    pub fn from_error(id: u64, error: &AppError) -> Self {
        let kind = match error.severity {
            ErrorSeverity::Transient => NotificationKind::Warning,
            ErrorSeverity::Permanent => NotificationKind::Error,
        };
        Self {
            id,
            message: error.user_facing_message(),
            kind,
            retryable: error.is_retryable(),
            error_code: Some(error.code().to_string()),
        }
    }
}

/// Ask the shell to move a live map to `coordinate`. `sequence` grows with
/// every fix so a repeated position still reads as a new request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecenterSignal {
    pub coordinate: Coordinate,
    pub sequence: u64,
}

/// Everything the discovery screen shows, owned by the core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub snapshot: ProximitySnapshot,
    pub submission: SubmissionFlow,
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: DiscoveryConfig,
    pub auth_token: Option<SecretString>,
    pub permission: PermissionState,
    pub scheduler: RefreshScheduler,
    pub session: SessionState,
    pub notification: Option<Notification>,
    pub recenter: Option<RecenterSignal>,
    notifications_issued: u64,
}

impl Model {
    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.notifications_issued += 1;
        self.notification = Some(Notification::new(self.notifications_issued, message, kind));
    }

    pub fn notify_error(&mut self, error: &AppError) {
        self.notifications_issued += 1;
        self.notification = Some(Notification::from_error(self.notifications_issued, error));
    }

    pub fn set_recenter(&mut self, coordinate: Coordinate) {
        let sequence = self.recenter.map_or(1, |r| r.sequence + 1);
        self.recenter = Some(RecenterSignal {
            coordinate,
            sequence,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn source() -> Vec<RawCandidate> {
        vec![
            RawCandidate::from_value(json!({"id": 1, "lat": 0, "lon": 0.05})).unwrap(),
            RawCandidate::from_value(json!({"id": 2, "lat": 0, "lon": 0.2})).unwrap(),
        ]
    }

    #[test]
    fn test_snapshot_ranks_on_construction() {
        let center = Coordinate::new(0.0, 0.0).unwrap();
        let snapshot = ProximitySnapshot::ranked(Generation(3), center, source(), 10.0);
        assert_eq!(snapshot.center(), Some(center));
        assert_eq!(snapshot.candidates().len(), 1);
        assert_eq!(snapshot.generation(), Generation(3));
        assert!(snapshot.find(&CandidateId::new("1")).is_some());
    }

    #[test]
    fn test_snapshot_rerank_with_radius() {
        let center = Coordinate::new(0.0, 0.0).unwrap();
        let snapshot = ProximitySnapshot::ranked(Generation(1), center, source(), 10.0);
        let wider = snapshot.with_radius(30.0);
        assert_eq!(wider.candidates().len(), 2);
        assert_eq!(wider.center(), Some(center));

        let empty = ProximitySnapshot::default().with_radius(30.0);
        assert!(empty.candidates().is_empty());
    }

    #[test]
    fn test_notifications_get_fresh_ids() {
        let mut model = Model::default();
        model.notify("one", NotificationKind::Info);
        let first = model.notification.clone().unwrap();
        model.notify_error(&AppError::new(ErrorKind::Network, "down"));
        let second = model.notification.clone().unwrap();

        assert!(second.id > first.id);
        assert_eq!(second.kind, NotificationKind::Warning);
        assert!(second.retryable);
        assert_eq!(second.error_code.as_deref(), Some("NETWORK_ERROR"));
    }

    #[test]
    fn test_recenter_sequence_grows() {
        let mut model = Model::default();
        let here = Coordinate::new(1.0, 1.0).unwrap();
        model.set_recenter(here);
        model.set_recenter(here);
        assert_eq!(model.recenter.map(|r| r.sequence), Some(2));
    }
}
