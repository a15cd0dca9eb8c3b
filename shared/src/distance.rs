use crate::coordinate::Coordinate;
use crate::EARTH_RADIUS_KM;

/// Great-circle distance in kilometres (haversine).
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat_a, lon_a) = a.as_tuple();
    let (lat_b, lon_b) = b.as_tuple();

    let delta_lat = (lat_b - lat_a).to_radians();
    let delta_lon = (lon_b - lon_a).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.to_radians().cos() * lat_b.to_radians().cos() * (delta_lon / 2.0).sin().powi(2);

    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[must_use]
pub fn format_distance_km(km: f64) -> String {
    if !km.is_finite() || km < 0.0 {
        return "Unknown".to_string();
    }

    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else if km < 10.0 {
        format!("{km:.1} km")
    } else {
        format!("{km:.0} km")
    }
}
