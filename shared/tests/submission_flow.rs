mod common;

use serde_json::json;

use common::{answer, fix, http_request, ok_json, send, Tester};
use vetfinder_shared::capabilities::{HttpError, HttpMethod, HttpResponse};
use vetfinder_shared::location::PermissionState;
use vetfinder_shared::submission::AttachmentRef;
use vetfinder_shared::view::SubmissionStatus;
use vetfinder_shared::{CandidateId, Event, Model, NotificationKind, SubmissionState};

/// A model with one ranked vet (id 42, "Dr. Amani") and a signed-in user.
fn model_with_vet(app: &Tester) -> Model {
    let mut model = Model::default();
    model.permission = PermissionState::Granted;
    app.update(
        Event::AuthTokenChanged {
            token: Some("jwt-abc".into()),
        },
        &mut model,
    );

    let mut position = send(app, &mut model, Event::StartRefresh).only_location();
    let mut fetch = answer(app, &mut model, &mut position, fix(-1.2921, 36.8219)).only_http();
    answer(
        app,
        &mut model,
        &mut fetch,
        ok_json(json!({"results": [
            {"id": 42, "display_name": "Dr. Amani", "latitude": -1.29, "longitude": 36.82}
        ]})),
    );
    assert_eq!(model.session.snapshot.candidates().len(), 1);
    model
}

fn compose(app: &Tester, model: &mut Model, message: &str) {
    send(
        app,
        model,
        Event::CandidateSelected {
            candidate_id: CandidateId::new("42"),
        },
    );
    send(app, model, Event::ComposeOpened);
    send(
        app,
        model,
        Event::DraftMessageChanged {
            message: message.into(),
        },
    );
}

#[test]
fn test_request_is_sent_and_acknowledged() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);

    compose(&app, &mut model, "  My dog is limping  ");
    send(
        &app,
        &mut model,
        Event::DraftSignsChanged {
            signs: "swollen paw".into(),
        },
    );
    send(
        &app,
        &mut model,
        Event::DraftAttachmentChanged {
            attachment: Some(AttachmentRef {
                uri: "file:///photos/paw.jpg".into(),
                mime_type: Some("image/jpeg".into()),
            }),
        },
    );
    let view = app.view(&model);
    assert!(view.submission.can_submit);
    assert_eq!(view.submission.candidate_name.as_deref(), Some("Dr. Amani"));

    let mut post = send(&app, &mut model, Event::SubmitRequested).only_http();
    assert_eq!(app.view(&model).submission.status, SubmissionStatus::Submitting);

    let request = http_request(&post);
    assert_eq!(request.method(), HttpMethod::Post);
    assert!(request.url().as_str().ends_with("/vet_requests/42/"));
    assert_eq!(request.headers().get("Authorization"), Some("Bearer jwt-abc"));
    assert_eq!(
        request.body_json(),
        Some(json!({
            "message": "My dog is limping",
            "signs": "swollen paw",
            "attachment": {"uri": "file:///photos/paw.jpg", "mime_type": "image/jpeg"}
        }))
    );

    answer(&app, &mut model, &mut post, Ok(HttpResponse::json(201, &json!({"id": 9}))));
    assert_eq!(
        model.session.submission.state(),
        &SubmissionState::Succeeded {
            candidate_id: CandidateId::new("42")
        }
    );
    let notification = model.notification.clone().expect("notification shown");
    assert_eq!(notification.kind, NotificationKind::Success);
    assert_eq!(notification.message, "Request sent to Dr. Amani");

    send(&app, &mut model, Event::SuccessAcknowledged);
    assert_eq!(model.session.submission.state(), &SubmissionState::Idle);
}

#[test]
fn test_blank_message_is_never_sent() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);
    compose(&app, &mut model, "   ");

    let effects = send(&app, &mut model, Event::SubmitRequested);
    assert!(effects.http.is_empty());

    let view = app.view(&model);
    assert_eq!(view.submission.status, SubmissionStatus::Composing);
    assert!(!view.submission.can_submit);
    assert!(view.submission.error.is_some());
    assert!(!view.submission.send_failed);
    assert!(model.notification.is_none());

    send(
        &app,
        &mut model,
        Event::DraftMessageChanged {
            message: "Limping on the left leg".into(),
        },
    );
    let view = app.view(&model);
    assert!(view.submission.error.is_none());
    assert!(view.submission.can_submit);
}

#[test]
fn test_failed_submission_keeps_draft_for_retry() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);
    compose(&app, &mut model, "Vomiting since morning");

    let mut post = send(&app, &mut model, Event::SubmitRequested).only_http();
    answer(
        &app,
        &mut model,
        &mut post,
        Ok(HttpResponse::json(400, &json!({"detail": "Vet is no longer available"}))),
    );

    let view = app.view(&model);
    assert_eq!(view.submission.status, SubmissionStatus::Composing);
    assert_eq!(view.submission.message, "Vomiting since morning");
    assert_eq!(view.submission.error.as_deref(), Some("Vet is no longer available"));
    assert!(view.submission.send_failed);
    assert!(view.submission.retryable);
    let notification = view.notification.expect("notification shown");
    assert_eq!(notification.error_code.as_deref(), Some("SUBMISSION_ERROR"));

    let mut retry = send(&app, &mut model, Event::SubmitRequested).only_http();
    answer(&app, &mut model, &mut retry, Ok(HttpResponse::new(204, "")));
    assert!(matches!(
        model.session.submission.state(),
        SubmissionState::Succeeded { .. }
    ));
}

#[test]
fn test_transport_failure_returns_to_composing() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);
    compose(&app, &mut model, "Not eating");

    let mut post = send(&app, &mut model, Event::SubmitRequested).only_http();
    answer(
        &app,
        &mut model,
        &mut post,
        Err(HttpError::Timeout { timeout_ms: 30_000 }),
    );

    let view = app.view(&model);
    assert_eq!(view.submission.status, SubmissionStatus::Composing);
    assert!(view.submission.can_submit);
    assert!(view.submission.send_failed);
    assert!(view.submission.retryable);
    assert!(view.notification.is_some_and(|n| n.retryable));
}

#[test]
fn test_expired_session_reported_as_auth_error() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);
    compose(&app, &mut model, "Coughing");

    let mut post = send(&app, &mut model, Event::SubmitRequested).only_http();
    answer(&app, &mut model, &mut post, Ok(HttpResponse::new(401, "")));

    let notification = model.notification.clone().expect("notification shown");
    assert_eq!(notification.error_code.as_deref(), Some("AUTH_ERROR"));
    assert!(!notification.retryable);
}

#[test]
fn test_cancel_discards_late_result() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);
    compose(&app, &mut model, "Itchy skin");

    let mut post = send(&app, &mut model, Event::SubmitRequested).only_http();
    send(&app, &mut model, Event::CompositionCancelled);
    assert_eq!(model.session.submission.state(), &SubmissionState::Idle);

    let effects = answer(&app, &mut model, &mut post, Ok(HttpResponse::new(201, "{}")));
    assert!(effects.is_empty());
    assert_eq!(model.session.submission.state(), &SubmissionState::Idle);
    assert!(model.notification.is_none());
}

#[test]
fn test_selection_locked_while_submitting() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);
    compose(&app, &mut model, "Limping");

    let _post = send(&app, &mut model, Event::SubmitRequested).only_http();
    let effects = send(
        &app,
        &mut model,
        Event::CandidateSelected {
            candidate_id: CandidateId::new("7"),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(app.view(&model).selected_candidate_id.as_deref(), Some("42"));

    let effects = send(&app, &mut model, Event::SubmitRequested);
    assert!(effects.http.is_empty());
}

#[test]
fn test_switching_vet_abandons_draft() {
    let app = Tester::default();
    let mut model = model_with_vet(&app);
    compose(&app, &mut model, "Draft for 42");

    send(
        &app,
        &mut model,
        Event::CandidateSelected {
            candidate_id: CandidateId::new("42"),
        },
    );
    assert_eq!(app.view(&model).submission.message, "Draft for 42");

    send(
        &app,
        &mut model,
        Event::CandidateSelected {
            candidate_id: CandidateId::new("7"),
        },
    );
    let view = app.view(&model);
    assert_eq!(view.submission.status, SubmissionStatus::CandidateSelected);
    assert!(view.submission.message.is_empty());
    assert_eq!(view.selected_candidate_id.as_deref(), Some("7"));
}
