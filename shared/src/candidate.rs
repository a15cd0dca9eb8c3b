use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coordinate::{self, Coordinate, CoordinateSource, ParseFailure};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backends hand out both numeric and string ids. Empty strings, floats
    /// and every other type are not identifiers.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            Value::Number(n) if n.is_u64() || n.is_i64() => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A backend record exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate(Map<String, Value>);

const ID_KEYS: &[&str] = &["id", "pk", "user_id"];
const NAME_KEYS: &[&str] = &["display_name", "name", "full_name"];

impl RawCandidate {
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<CandidateId> {
        ID_KEYS
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(CandidateId::from_json)
    }

    /// Best human label for the record, falling back to `first_name last_name`
    /// and then `username`.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let text = |key: &str| {
            self.0
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        if let Some(name) = NAME_KEYS.iter().find_map(|key| text(*key)) {
            return Some(name.to_string());
        }

        let full: Vec<&str> = ["first_name", "last_name"]
            .iter()
            .filter_map(|key| text(*key))
            .collect();
        if !full.is_empty() {
            return Some(full.join(" "));
        }

        text("username").map(str::to_string)
    }
}

impl CoordinateSource for RawCandidate {
    fn coordinate(&self) -> Result<Coordinate, ParseFailure> {
        coordinate::parse_object(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub id: CandidateId,
    pub display_name: Option<String>,
    pub coordinate: Coordinate,
    pub distance_km: f64,
}
