use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::candidate::RawCandidate;
use crate::capabilities::{HttpError, HttpMethod, HttpRequest, HttpResult};
use crate::config::DiscoveryConfig;
use crate::coordinate::Coordinate;
use crate::error::{detail_message, AppError, ErrorKind};

pub const DISCOVERY_PATH: [&str; 3] = ["profiles", "vets", "available"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(HttpError),
    #[error("discovery request rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl FetchError {
    /// A rejected request replaces the candidate list with nothing; a
    /// network failure leaves the last good list in place.
    #[must_use]
    pub const fn clears_candidates(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Network(err) => {
                AppError::new(ErrorKind::Network, "Could not reach the vet directory")
                    .with_internal(err.to_string())
            }
            FetchError::Rejected { status, message } => {
                AppError::from_http_status(ErrorKind::Server, status, message)
            }
        }
    }
}

#[derive(Serialize)]
struct DiscoveryBody {
    latitude: f64,
    longitude: f64,
}

pub fn build_discovery_request(
    config: &DiscoveryConfig,
    center: Coordinate,
    token: Option<&SecretString>,
) -> Result<HttpRequest, AppError> {
    let url = config.base_url()?.with_segments(&DISCOVERY_PATH)?;

    let mut request = HttpRequest::new(HttpMethod::Post, url)
        .with_json(&DiscoveryBody {
            latitude: center.latitude(),
            longitude: center.longitude(),
        })?
        .with_timeout_ms(config.request_timeout_ms)?;

    match token {
        Some(token) => request = request.with_bearer_token(token.expose_secret())?,
        None => warn!("No auth token available, sending discovery request without Authorization"),
    }

    Ok(request)
}

/// Turns the shell's answer into raw candidate records.
///
/// Both a bare JSON array and a paginated `{"results": [...]}` object are
/// accepted. A 2xx answer whose body cannot be read as either yields an empty
/// list.
pub fn parse_discovery_response(result: HttpResult) -> Result<Vec<RawCandidate>, FetchError> {
    let response = result.map_err(FetchError::Network)?;

    if !response.is_success() {
        let message = detail_message(response.body())
            .unwrap_or_else(|| format!("Vet directory returned HTTP {}", response.status()));
        return Err(FetchError::Rejected {
            status: response.status(),
            message,
        });
    }

    if response.body().iter().all(u8::is_ascii_whitespace) {
        warn!(status = response.status(), "Discovery response body is empty");
        return Ok(Vec::new());
    }

    let items = match response.body_json::<Value>() {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut page)) => match page.remove("results") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Discovery response object has no results array");
                return Ok(Vec::new());
            }
        },
        Ok(other) => {
            warn!(kind = json_kind(&other), "Discovery response is not a list");
            return Ok(Vec::new());
        }
        Err(e) => {
            warn!(error = %e, "Discovery response is not valid JSON");
            return Ok(Vec::new());
        }
    };

    let total = items.len();
    let candidates: Vec<RawCandidate> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let kind = json_kind(&item);
            let candidate = RawCandidate::from_value(item);
            if candidate.is_none() {
                debug!(index, kind, "Dropping non-object discovery record");
            }
            candidate
        })
        .collect();

    debug!(total, kept = candidates.len(), "Parsed discovery response");
    Ok(candidates)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
