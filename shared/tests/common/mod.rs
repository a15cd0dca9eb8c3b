#![allow(dead_code)]

use crux_core::capability::Operation;
use crux_core::testing::AppTester;
use crux_core::Request;
use serde_json::{json, Value};

use vetfinder_shared::capabilities::{
    HttpOperation, HttpRequest, HttpResponse, LocationOperation, LocationResponse, TimerId,
    TimerOperation, TimerOutput,
};
use vetfinder_shared::{App, Effect, Model};

pub type Tester = AppTester<App, Effect>;

#[derive(Default)]
pub struct Effects {
    pub http: Vec<Request<HttpOperation>>,
    pub location: Vec<Request<LocationOperation>>,
    pub timer: Vec<Request<TimerOperation>>,
    pub renders: usize,
}

impl Effects {
    pub fn split(effects: Vec<Effect>) -> Self {
        let mut split = Self::default();
        for effect in effects {
            match effect {
                Effect::Http(request) => split.http.push(request),
                Effect::Location(request) => split.location.push(request),
                Effect::Timer(request) => split.timer.push(request),
                Effect::Render(_) => split.renders += 1,
            }
        }
        split
    }

    pub fn is_empty(&self) -> bool {
        self.http.is_empty() && self.location.is_empty() && self.timer.is_empty() && self.renders == 0
    }

    pub fn only_http(mut self) -> Request<HttpOperation> {
        assert_eq!(self.http.len(), 1, "expected exactly one HTTP request");
        self.http.remove(0)
    }

    pub fn only_location(mut self) -> Request<LocationOperation> {
        assert_eq!(self.location.len(), 1, "expected exactly one location request");
        self.location.remove(0)
    }

    pub fn timer_started(&self) -> Option<TimerId> {
        self.timer.iter().find_map(|r| match r.operation {
            TimerOperation::Start { id, .. } => Some(id),
            TimerOperation::Cancel { .. } => None,
        })
    }

    pub fn timer_cancelled(&self) -> Option<TimerId> {
        self.timer.iter().find_map(|r| match r.operation {
            TimerOperation::Cancel { id } => Some(id),
            TimerOperation::Start { .. } => None,
        })
    }
}

pub fn send(app: &Tester, model: &mut Model, event: vetfinder_shared::Event) -> Effects {
    Effects::split(app.update(event, model).effects)
}

/// Answers a shell request and feeds every resulting event back into the app.
pub fn answer<Op: Operation>(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<Op>,
    output: Op::Output,
) -> Effects {
    let update = app.resolve(request, output).expect("request should resolve");
    let mut effects = update.effects;
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    Effects::split(effects)
}

pub fn http_request(request: &Request<HttpOperation>) -> &HttpRequest {
    let HttpOperation::Execute(inner) = &request.operation;
    inner
}

pub fn granted() -> LocationResponse {
    LocationResponse::Permission { granted: true }
}

pub fn fix(latitude: f64, longitude: f64) -> LocationResponse {
    LocationResponse::Fix {
        payload: json!({"coords": {"latitude": latitude, "longitude": longitude, "accuracy": 8.0}}),
    }
}

pub fn ok_json(body: Value) -> Result<HttpResponse, vetfinder_shared::capabilities::HttpError> {
    Ok(HttpResponse::json(200, &body))
}

pub fn fired(id: TimerId) -> TimerOutput {
    TimerOutput::Fired { id }
}
