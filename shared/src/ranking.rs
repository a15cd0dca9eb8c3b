use tracing::debug;

use crate::candidate::{RankedCandidate, RawCandidate};
use crate::coordinate::{Coordinate, CoordinateSource};

/// Ranks `raw` by distance from `center`, keeping only records within
/// `radius_km` (inclusive). Records without a usable coordinate or id are
/// dropped. Equal distances keep their input order. An infinite radius keeps
/// every usable record; a NaN or negative one keeps none.
#[must_use]
pub fn rank(center: Coordinate, raw: &[RawCandidate], radius_km: f64) -> Vec<RankedCandidate> {
    if radius_km.is_nan() || radius_km < 0.0 {
        debug!(radius_km, "Refusing to rank with invalid radius");
        return Vec::new();
    }

    let mut ranked: Vec<RankedCandidate> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let Some(id) = candidate.id() else {
                debug!(index, "Dropping candidate without id");
                return None;
            };
            let coordinate = match candidate.coordinate() {
                Ok(c) => c,
                Err(e) => {
                    debug!(candidate_id = %id, error = %e, "Dropping candidate with unusable coordinate");
                    return None;
                }
            };
            Some(RankedCandidate {
                display_name: candidate.display_name(),
                distance_km: center.distance_to(coordinate),
                id,
                coordinate,
            })
        })
        .filter(|c| c.distance_km <= radius_km)
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}
