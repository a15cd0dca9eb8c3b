use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::candidate::CandidateId;
use crate::capabilities::{Capabilities, HttpResult, LocationResponse, TimerId, TimerOutput};
use crate::config::DiscoveryConfig;
use crate::coordinate::Coordinate;
use crate::error::AppError;
use crate::event::Event;
use crate::fetcher::{build_discovery_request, parse_discovery_response};
use crate::location::{interpret_fix, interpret_permission, LocationError, PermissionState};
use crate::model::{Model, NotificationKind, ProximitySnapshot};
use crate::scheduler::Generation;
use crate::submission::{
    build_submission_request, interpret_submission_response, Attempt, Completion, SubmissionError,
};
use crate::view::{view, ViewModel};
use crate::{MAX_RADIUS_KM, MIN_RADIUS_KM};

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "Handling event");

        let changed = match event {
            Event::Noop => false,

            Event::Configure(config) => configure(model, config),
            Event::AuthTokenChanged { token } => {
                model.auth_token = token
                    .filter(|t| !t.trim().is_empty())
                    .map(SecretString::new);
                debug!(present = model.auth_token.is_some(), "Auth token updated");
                false
            }

            Event::StartRefresh => start_refresh(model, caps),
            Event::StopRefresh => stop_refresh(model, caps),
            Event::RefreshNow => {
                if model.scheduler.is_running() {
                    run_cycle(model, caps);
                    true
                } else {
                    debug!(state = ?model.scheduler.state(), "Ignoring refresh request, scheduler not running");
                    false
                }
            }
            Event::RadiusChanged { radius_km } => change_radius(model, radius_km),

            Event::TimerTicked(output) => timer_ticked(model, caps, output),
            Event::PermissionResolved {
                generation,
                response,
            } => permission_resolved(model, caps, generation, &response),
            Event::PositionResolved {
                generation,
                response,
            } => position_resolved(model, caps, generation, response),
            Event::CandidatesFetched {
                generation,
                center,
                result,
            } => candidates_fetched(model, generation, center, *result),

            Event::CandidateSelected { candidate_id } => select_candidate(model, candidate_id),
            Event::SelectionCleared | Event::CompositionCancelled => {
                model.session.submission.cancel();
                true
            }
            Event::ComposeOpened => {
                accept_transition(model.session.submission.open_composer(), "ComposeOpened")
            }
            Event::DraftMessageChanged { message } => accept_transition(
                model.session.submission.set_message(message),
                "DraftMessageChanged",
            ),
            Event::DraftSignsChanged { signs } => accept_transition(
                model.session.submission.set_signs(signs),
                "DraftSignsChanged",
            ),
            Event::DraftAttachmentChanged { attachment } => accept_transition(
                model.session.submission.set_attachment(attachment),
                "DraftAttachmentChanged",
            ),
            Event::SubmitRequested => submit(model, caps),
            Event::SubmissionCompleted { attempt, result } => {
                submission_completed(model, attempt, *result)
            }
            Event::SuccessAcknowledged => accept_transition(
                model.session.submission.acknowledge(),
                "SuccessAcknowledged",
            ),

            Event::DismissNotification => model.notification.take().is_some(),
        };

        if changed {
            caps.render.render();
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        view(model)
    }
}

fn configure(model: &mut Model, config: DiscoveryConfig) -> bool {
    if let Err(e) = config.validate() {
        warn!(error = %e, "Rejected configuration");
        model.notify_error(&AppError::from(e));
        return true;
    }

    let radius_changed = (config.radius_km - model.config.radius_km).abs() > f64::EPSILON;
    model.config = config;
    if radius_changed {
        model.session.snapshot = model.session.snapshot.with_radius(model.config.radius_km);
    }

    info!(
        base_url = %model.config.api_base_url,
        radius_km = model.config.radius_km,
        refresh_interval_ms = model.config.refresh_interval_ms,
        "Discovery configured"
    );
    true
}

fn change_radius(model: &mut Model, radius_km: f64) -> bool {
    if !radius_km.is_finite() {
        debug!(radius_km, "Ignoring non-finite radius");
        return false;
    }
    let radius_km = radius_km.clamp(MIN_RADIUS_KM, MAX_RADIUS_KM);
    model.config.radius_km = radius_km;
    model.session.snapshot = model.session.snapshot.with_radius(radius_km);
    true
}

fn start_refresh(model: &mut Model, caps: &Capabilities) -> bool {
    let Some(timer) = model.scheduler.start() else {
        return false;
    };

    info!(
        timer = %timer,
        interval_ms = model.config.refresh_interval_ms,
        "Starting vet refresh"
    );
    arm_timer(model, caps, timer);
    run_cycle(model, caps);
    true
}

fn stop_refresh(model: &mut Model, caps: &Capabilities) -> bool {
    if let Some(timer) = model.scheduler.stop() {
        caps.timer.cancel(timer);
    }
    info!(generation = model.scheduler.latest().0, "Stopped vet refresh");
    true
}

fn arm_timer(model: &Model, caps: &Capabilities, id: TimerId) {
    caps.timer
        .start(id, model.config.refresh_interval_ms, Event::TimerTicked);
}

fn timer_ticked(model: &mut Model, caps: &Capabilities, output: TimerOutput) -> bool {
    match output {
        TimerOutput::Fired { id } => {
            if !model.scheduler.owns_timer(id) {
                debug!(timer = %id, "Ignoring tick from unknown timer");
                return false;
            }
            arm_timer(model, caps, id);
            run_cycle(model, caps);
            true
        }
        TimerOutput::Cancelled { id } => {
            debug!(timer = %id, "Timer cancelled");
            false
        }
    }
}

fn run_cycle(model: &mut Model, caps: &Capabilities) {
    let Some(generation) = model.scheduler.begin_cycle() else {
        return;
    };
    debug!(generation = generation.0, "Starting refresh cycle");

    if model.permission.is_granted() {
        request_position(model, caps, generation);
    } else {
        model.permission = PermissionState::Requesting;
        caps.location
            .request_permission(move |response| Event::PermissionResolved {
                generation,
                response,
            });
    }
}

fn request_position(model: &Model, caps: &Capabilities, generation: Generation) {
    caps.location.current_position(
        model.config.location_timeout_ms,
        true,
        move |response| Event::PositionResolved {
            generation,
            response,
        },
    );
}

fn permission_resolved(
    model: &mut Model,
    caps: &Capabilities,
    generation: Generation,
    response: &LocationResponse,
) -> bool {
    if !model.scheduler.accepts(generation) {
        debug!(generation = generation.0, "Discarding stale permission answer");
        return false;
    }

    match interpret_permission(response) {
        Ok(()) => {
            model.permission = PermissionState::Granted;
            request_position(model, caps, generation);
            true
        }
        Err(e) => {
            model.permission = PermissionState::Denied;
            fail_cycle(model, generation, &AppError::from(e))
        }
    }
}

fn position_resolved(
    model: &mut Model,
    caps: &Capabilities,
    generation: Generation,
    response: LocationResponse,
) -> bool {
    if !model.scheduler.accepts(generation) {
        debug!(generation = generation.0, "Discarding stale position fix");
        return false;
    }

    let center = match interpret_fix(response, model.config.location_timeout_ms) {
        Ok(center) => center,
        Err(e) => {
            if e == LocationError::PermissionDenied {
                model.permission = PermissionState::Denied;
            }
            return fail_cycle(model, generation, &AppError::from(e));
        }
    };

    model.set_recenter(center);

    match build_discovery_request(&model.config, center, model.auth_token.as_ref()) {
        Ok(request) => {
            debug!(generation = generation.0, %center, "Fetching nearby vets");
            caps.http.send(request, move |result| Event::CandidatesFetched {
                generation,
                center,
                result: Box::new(result),
            });
            true
        }
        Err(e) => fail_cycle(model, generation, &e),
    }
}

fn candidates_fetched(
    model: &mut Model,
    generation: Generation,
    center: Coordinate,
    result: HttpResult,
) -> bool {
    if !model.scheduler.finish_cycle(generation) {
        return false;
    }

    let radius_km = model.config.radius_km;
    match parse_discovery_response(result) {
        Ok(source) => {
            let received = source.len();
            model.session.snapshot =
                ProximitySnapshot::ranked(generation, center, source, radius_km);
            info!(
                generation = generation.0,
                received,
                nearby = model.session.snapshot.candidates().len(),
                "Refresh cycle complete"
            );
        }
        Err(e) => {
            if e.clears_candidates() {
                model.session.snapshot =
                    ProximitySnapshot::ranked(generation, center, Vec::new(), radius_km);
            }
            let error = AppError::from(e);
            warn!(generation = generation.0, code = error.code(), error = %error, "Discovery request failed");
            model.notify_error(&error);
        }
    }
    true
}

/// Ends the cycle with a notification. Stale cycles end silently.
fn fail_cycle(model: &mut Model, generation: Generation, error: &AppError) -> bool {
    if !model.scheduler.finish_cycle(generation) {
        return false;
    }
    warn!(generation = generation.0, code = error.code(), error = %error, "Refresh cycle failed");
    model.notify_error(error);
    true
}

fn select_candidate(model: &mut Model, candidate_id: CandidateId) -> bool {
    if model.session.snapshot.find(&candidate_id).is_none() {
        debug!(candidate_id = %candidate_id, "Selected vet is not in the current list");
    }
    accept_transition(
        model.session.submission.select(candidate_id),
        "CandidateSelected",
    )
}

fn accept_transition(result: Result<(), SubmissionError>, event: &'static str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!(event, error = %e, "Ignoring event in current submission state");
            false
        }
    }
}

fn submit(model: &mut Model, caps: &Capabilities) -> bool {
    let (draft, attempt) = match model.session.submission.submit() {
        Ok(submission) => submission,
        Err(SubmissionError::Validation(message)) => {
            debug!(%message, "Draft failed validation");
            return true;
        }
        Err(e) => {
            debug!(error = %e, "Ignoring submit in current submission state");
            return false;
        }
    };

    match build_submission_request(&model.config, &draft, model.auth_token.as_ref()) {
        Ok(request) => {
            info!(candidate_id = %draft.candidate_id, attempt = attempt.0, "Submitting vet request");
            caps.http.send(request, move |result| Event::SubmissionCompleted {
                attempt,
                result: Box::new(result),
            });
        }
        Err(e) => {
            model
                .session
                .submission
                .complete(attempt, Err(SubmissionError::Unsendable(e.to_string())));
            model.notify_error(&e);
        }
    }
    true
}

fn submission_completed(model: &mut Model, attempt: Attempt, result: HttpResult) -> bool {
    let outcome = interpret_submission_response(result);
    match model.session.submission.complete(attempt, outcome) {
        Completion::Succeeded { candidate_id } => {
            let name = model
                .session
                .snapshot
                .find(&candidate_id)
                .and_then(|c| c.display_name.clone())
                .unwrap_or_else(|| "the vet".to_string());
            model.notify(format!("Request sent to {name}"), NotificationKind::Success);
            true
        }
        Completion::Failed { error } => {
            model.notify_error(&AppError::from(error));
            true
        }
        Completion::Discarded => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Effect, HttpResponse, LocationOperation};
    use crate::scheduler::SchedulerState;
    use crux_core::testing::AppTester;
    use serde_json::json;

    type Tester = AppTester<App, Effect>;

    #[test]
    fn test_start_requests_permission_and_arms_timer() {
        let app = Tester::default();
        let mut model = Model::default();

        let update = app.update(Event::StartRefresh, &mut model);

        assert_eq!(model.scheduler.state(), SchedulerState::Running);
        assert!(model.scheduler.is_loading());
        assert_eq!(model.permission, PermissionState::Requesting);

        let mut saw_timer = false;
        let mut saw_permission = false;
        for effect in update.effects {
            match effect {
                Effect::Timer(_) => saw_timer = true,
                Effect::Location(request) => {
                    assert_eq!(request.operation, LocationOperation::RequestPermission);
                    saw_permission = true;
                }
                _ => {}
            }
        }
        assert!(saw_timer);
        assert!(saw_permission);
    }

    #[test]
    fn test_second_start_is_ignored() {
        let app = Tester::default();
        let mut model = Model::default();
        app.update(Event::StartRefresh, &mut model);
        let generation = model.scheduler.latest();

        let update = app.update(Event::StartRefresh, &mut model);
        assert!(update.effects.is_empty());
        assert_eq!(model.scheduler.latest(), generation);
    }

    #[test]
    fn test_stale_fetch_discarded() {
        let app = Tester::default();
        let mut model = Model::default();
        model.permission = PermissionState::Granted;
        app.update(Event::StartRefresh, &mut model);
        let stale = model.scheduler.latest();
        app.update(Event::RefreshNow, &mut model);

        let center = Coordinate::new(0.0, 0.0).unwrap();
        let body = json!([{"id": 1, "lat": 0, "lon": 0.01}]);
        let update = app.update(
            Event::CandidatesFetched {
                generation: stale,
                center,
                result: Box::new(Ok(HttpResponse::json(200, &body))),
            },
            &mut model,
        );

        assert!(update.effects.is_empty());
        assert!(model.session.snapshot.candidates().is_empty());
        assert!(model.scheduler.is_loading());
    }

    #[test]
    fn test_unknown_timer_tick_ignored() {
        let app = Tester::default();
        let mut model = Model::default();
        app.update(Event::StartRefresh, &mut model);
        let generation = model.scheduler.latest();

        let update = app.update(
            Event::TimerTicked(TimerOutput::Fired { id: TimerId(999) }),
            &mut model,
        );
        assert!(update.effects.is_empty());
        assert_eq!(model.scheduler.latest(), generation);
    }

    #[test]
    fn test_radius_change_reranks_and_clamps() {
        let app = Tester::default();
        let mut model = Model::default();
        let center = Coordinate::new(0.0, 0.0).unwrap();
        let source = vec![crate::candidate::RawCandidate::from_value(
            json!({"id": 1, "lat": 0, "lon": 0.3}),
        )
        .unwrap()];
        model.session.snapshot = ProximitySnapshot::ranked(Generation(1), center, source, 15.0);
        assert!(model.session.snapshot.candidates().is_empty());

        app.update(Event::RadiusChanged { radius_km: 40.0 }, &mut model);
        assert_eq!(model.session.snapshot.candidates().len(), 1);

        app.update(Event::RadiusChanged { radius_km: 1.0e9 }, &mut model);
        assert_eq!(model.config.radius_km, MAX_RADIUS_KM);

        let update = app.update(Event::RadiusChanged { radius_km: f64::NAN }, &mut model);
        assert!(update.effects.is_empty());
        assert_eq!(model.config.radius_km, MAX_RADIUS_KM);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let app = Tester::default();
        let mut model = Model::default();
        let bad = DiscoveryConfig {
            api_base_url: "nope".into(),
            ..DiscoveryConfig::default()
        };

        app.update(Event::Configure(bad), &mut model);
        assert_eq!(model.config, DiscoveryConfig::default());
        assert!(model.notification.is_some());
    }

    #[test]
    fn test_blank_token_is_cleared() {
        let app = Tester::default();
        let mut model = Model::default();
        app.update(
            Event::AuthTokenChanged {
                token: Some("abc".into()),
            },
            &mut model,
        );
        assert!(model.auth_token.is_some());

        app.update(
            Event::AuthTokenChanged {
                token: Some("  ".into()),
            },
            &mut model,
        );
        assert!(model.auth_token.is_none());
    }

    #[test]
    fn test_dismiss_notification() {
        let app = Tester::default();
        let mut model = Model::default();
        model.notify("hello", NotificationKind::Info);

        let update = app.update(Event::DismissNotification, &mut model);
        assert!(model.notification.is_none());
        assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));

        let update = app.update(Event::DismissNotification, &mut model);
        assert!(update.effects.is_empty());
    }
}
