use serde::{Deserialize, Serialize};

use crate::candidate::CandidateId;
use crate::capabilities::{HttpResult, LocationResponse, TimerOutput};
use crate::config::DiscoveryConfig;
use crate::coordinate::Coordinate;
use crate::scheduler::Generation;
use crate::submission::{AttachmentRef, Attempt};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Event {
    #[default]
    Noop,

    Configure(DiscoveryConfig),
    AuthTokenChanged {
        token: Option<String>,
    },

    StartRefresh,
    StopRefresh,
    RefreshNow,
    RadiusChanged {
        radius_km: f64,
    },

    CandidateSelected {
        candidate_id: CandidateId,
    },
    SelectionCleared,
    ComposeOpened,
    DraftMessageChanged {
        message: String,
    },
    DraftSignsChanged {
        signs: String,
    },
    DraftAttachmentChanged {
        attachment: Option<AttachmentRef>,
    },
    SubmitRequested,
    CompositionCancelled,
    SuccessAcknowledged,

    DismissNotification,

    #[serde(skip)]
    TimerTicked(TimerOutput),
    #[serde(skip)]
    PermissionResolved {
        generation: Generation,
        response: LocationResponse,
    },
    #[serde(skip)]
    PositionResolved {
        generation: Generation,
        response: LocationResponse,
    },
    #[serde(skip)]
    CandidatesFetched {
        generation: Generation,
        center: Coordinate,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    SubmissionCompleted {
        attempt: Attempt,
        result: Box<HttpResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "Noop",
            Self::Configure(_) => "Configure",
            Self::AuthTokenChanged { .. } => "AuthTokenChanged",
            Self::StartRefresh => "StartRefresh",
            Self::StopRefresh => "StopRefresh",
            Self::RefreshNow => "RefreshNow",
            Self::RadiusChanged { .. } => "RadiusChanged",
            Self::CandidateSelected { .. } => "CandidateSelected",
            Self::SelectionCleared => "SelectionCleared",
            Self::ComposeOpened => "ComposeOpened",
            Self::DraftMessageChanged { .. } => "DraftMessageChanged",
            Self::DraftSignsChanged { .. } => "DraftSignsChanged",
            Self::DraftAttachmentChanged { .. } => "DraftAttachmentChanged",
            Self::SubmitRequested => "SubmitRequested",
            Self::CompositionCancelled => "CompositionCancelled",
            Self::SuccessAcknowledged => "SuccessAcknowledged",
            Self::DismissNotification => "DismissNotification",
            Self::TimerTicked(_) => "TimerTicked",
            Self::PermissionResolved { .. } => "PermissionResolved",
            Self::PositionResolved { .. } => "PositionResolved",
            Self::CandidatesFetched { .. } => "CandidatesFetched",
            Self::SubmissionCompleted { .. } => "SubmissionCompleted",
        }
    }
}
