#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]

pub mod app;
pub mod candidate;
pub mod capabilities;
pub mod config;
pub mod coordinate;
pub mod distance;
pub mod error;
pub mod event;
pub mod fetcher;
pub mod location;
pub mod model;
pub mod ranking;
pub mod scheduler;
pub mod submission;
pub mod view;

pub use app::App;
pub use candidate::{CandidateId, RankedCandidate, RawCandidate};
pub use capabilities::{Capabilities, Effect};
pub use config::DiscoveryConfig;
pub use coordinate::{Coordinate, CoordinateError, CoordinateSource, ParseFailure};
pub use crux_core::App as CruxApp;
pub use error::{AppError, ErrorKind, ErrorSeverity};
pub use event::Event;
pub use model::{Model, Notification, NotificationKind, ProximitySnapshot, SessionState};
pub use ranking::rank;
pub use scheduler::{Generation, RefreshScheduler, SchedulerState};
pub use submission::{DraftIssue, RequestDraft, SubmissionFlow, SubmissionState};
pub use view::ViewModel;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_RADIUS_KM: f64 = 15.0;
pub const MIN_RADIUS_KM: f64 = 0.5;
pub const MAX_RADIUS_KM: f64 = 200.0;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 10_000;
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_API_BASE_URL: &str = "https://api.vetfinder.app/api";
pub const MAX_MESSAGE_CHARS: usize = 2_000;
pub const MAX_SIGNS_CHARS: usize = 1_000;
