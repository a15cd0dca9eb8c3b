mod http;
mod location;
mod timer;

pub use self::http::{
    Http, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest, HttpResponse,
    HttpResult, ValidatedUrl, MAX_TIMEOUT_MS,
};
pub use self::location::{Location, LocationOperation, LocationResponse};
pub use self::timer::{Timer, TimerId, TimerOperation, TimerOutput};

// Render comes straight from crux_core.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub location: Location<Event>,
    pub timer: Timer<Event>,
    pub render: Render<Event>,
}
