use serde::{Deserialize, Serialize};

use crate::candidate::RankedCandidate;
use crate::coordinate::Coordinate;
use crate::distance::format_distance_km;
use crate::location::PermissionState;
use crate::model::{Model, Notification, RecenterSignal};
use crate::scheduler::SchedulerState;
use crate::submission::{DraftIssue, SubmissionState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateView {
    pub id: String,
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub distance_label: String,
    pub selected: bool,
}

impl CandidateView {
    fn new(candidate: &RankedCandidate, selected: bool) -> Self {
        let (latitude, longitude) = candidate.coordinate.as_tuple();
        Self {
            id: candidate.id.to_string(),
            display_name: candidate
                .display_name
                .clone()
                .unwrap_or_else(|| format!("Vet #{}", candidate.id)),
            latitude,
            longitude,
            distance_km: candidate.distance_km,
            distance_label: format_distance_km(candidate.distance_km),
            selected,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    CandidateSelected,
    Composing,
    Submitting,
    Succeeded,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionView {
    pub status: SubmissionStatus,
    pub candidate_id: Option<String>,
    pub candidate_name: Option<String>,
    pub message: String,
    pub signs: String,
    pub attachment_uri: Option<String>,
    pub error: Option<String>,
    /// The last send failed, as opposed to the draft failing validation.
    pub send_failed: bool,
    pub retryable: bool,
    pub can_submit: bool,
}

impl SubmissionView {
    fn new(state: &SubmissionState, candidate_name: Option<String>) -> Self {
        let status = match state {
            SubmissionState::Idle => SubmissionStatus::Idle,
            SubmissionState::CandidateSelected { .. } => SubmissionStatus::CandidateSelected,
            SubmissionState::Composing { .. } => SubmissionStatus::Composing,
            SubmissionState::Submitting { .. } => SubmissionStatus::Submitting,
            SubmissionState::Succeeded { .. } => SubmissionStatus::Succeeded,
        };

        let draft = state.draft();
        let issue = match state {
            SubmissionState::Composing { issue, .. } => issue.as_ref(),
            _ => None,
        };
        let (send_failed, retryable) = match issue {
            Some(DraftIssue::SendFailed { retryable, .. }) => (true, *retryable),
            _ => (false, false),
        };

        Self {
            status,
            candidate_id: state.candidate_id().map(ToString::to_string),
            candidate_name,
            message: draft.map(|d| d.message.clone()).unwrap_or_default(),
            signs: draft.map(|d| d.signs.clone()).unwrap_or_default(),
            attachment_uri: draft
                .and_then(|d| d.attachment.as_ref())
                .map(|a| a.uri.clone()),
            error: issue.map(|i| i.message().to_string()),
            send_failed,
            retryable,
            can_submit: matches!(state, SubmissionState::Composing { draft, .. } if draft.validate().is_ok()),
        }
    }
}

/// The only data the presentation layer reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub coordinate: Option<Coordinate>,
    pub candidates: Vec<CandidateView>,
    pub loading: bool,
    pub selected_candidate_id: Option<String>,
    pub submission: SubmissionView,
    pub notification: Option<Notification>,
    pub recenter: Option<RecenterSignal>,
    pub radius_km: f64,
    pub refresh: SchedulerState,
    pub permission: PermissionState,
}

#[must_use]
pub fn view(model: &Model) -> ViewModel {
    let snapshot = &model.session.snapshot;
    let state = model.session.submission.state();
    let selected = state.candidate_id();

    let candidates = snapshot
        .candidates()
        .iter()
        .map(|c| CandidateView::new(c, selected == Some(&c.id)))
        .collect();

    let candidate_name = selected
        .and_then(|id| snapshot.find(id))
        .and_then(|c| c.display_name.clone());

    ViewModel {
        coordinate: snapshot.center(),
        candidates,
        loading: model.scheduler.is_loading(),
        selected_candidate_id: selected.map(ToString::to_string),
        submission: SubmissionView::new(state, candidate_name),
        notification: model.notification.clone(),
        recenter: model.recenter,
        radius_km: model.config.radius_km,
        refresh: model.scheduler.state(),
        permission: model.permission,
    }
}
