//! Validated coordinates and the lenient parser that produces them.
//!
//! Backend records and platform location payloads do not agree on a shape.
//! Each axis is resolved independently, first match wins:
//!
//! | axis      | 1st        | 2nd            | 3rd                |
//! |-----------|------------|----------------|--------------------|
//! | latitude  | `latitude` | `lat`          | `coords.latitude`  |
//! | longitude | `longitude`| `lon`, `lng`   | `coords.longitude` |
//!
//! A JSON `null` counts as absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, ErrorKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude => f.write_str("latitude"),
            Self::Longitude => f.write_str("longitude"),
        }
    }
}

/// Why a payload did not yield a coordinate. Never fatal: callers drop the
/// record or promote the failure to a cycle-level error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("no {0} field found")]
    Missing(Axis),
    #[error("{axis} is not numeric: {found}")]
    NotNumeric { axis: Axis, found: String },
    #[error(transparent)]
    Invalid(#[from] CoordinateError),
}

impl From<ParseFailure> for AppError {
    fn from(e: ParseFailure) -> Self {
        AppError::new(ErrorKind::Parse, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub const fn as_tuple(self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        crate::distance::distance_km(self, other)
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = CoordinateError;

    fn try_from((latitude, longitude): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(latitude, longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Anything that can be asked for a coordinate.
pub trait CoordinateSource {
    fn coordinate(&self) -> Result<Coordinate, ParseFailure>;
}

impl CoordinateSource for Value {
    fn coordinate(&self) -> Result<Coordinate, ParseFailure> {
        parse(self)
    }
}

const LATITUDE_KEYS: &[&str] = &["latitude", "lat"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "lon", "lng"];
const NESTED_KEY: &str = "coords";

pub fn parse(raw: &Value) -> Result<Coordinate, ParseFailure> {
    let object = raw.as_object().ok_or(ParseFailure::NotAnObject)?;
    parse_object(object)
}

pub fn parse_object(object: &Map<String, Value>) -> Result<Coordinate, ParseFailure> {
    let nested = object.get(NESTED_KEY).and_then(Value::as_object);

    let lookup = |axis: Axis, keys: &[&str], nested_key: &str| -> Result<f64, ParseFailure> {
        let value = keys
            .iter()
            .filter_map(|key| object.get(*key))
            .chain(nested.and_then(|n| n.get(nested_key)))
            .find(|v| !v.is_null())
            .ok_or(ParseFailure::Missing(axis))?;
        numeric(axis, value)
    };

    let latitude = lookup(Axis::Latitude, LATITUDE_KEYS, "latitude")?;
    let longitude = lookup(Axis::Longitude, LONGITUDE_KEYS, "longitude")?;

    Ok(Coordinate::new(latitude, longitude)?)
}

fn numeric(axis: Axis, value: &Value) -> Result<f64, ParseFailure> {
    let not_numeric = || ParseFailure::NotNumeric {
        axis,
        found: value.to_string(),
    };

    match value {
        Value::Number(n) => n.as_f64().ok_or_else(not_numeric),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| not_numeric()),
        _ => Err(not_numeric()),
    }
}
