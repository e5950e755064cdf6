//! Great-circle distance and speed over recorded coordinates.

use chrono::{DateTime, Utc};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two lat/lon pairs (degrees).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sum of pairwise haversine distances over `(lat, lon)` pairs in input
/// order. 0 for fewer than two points.
pub fn cumulative_distance_km(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0].0, pair[0].1, pair[1].0, pair[1].1))
        .sum()
}

/// Km/h over the elapsed interval. 0 when `end <= start`, so a zero-duration
/// path never divides by zero.
pub fn average_speed_kmh(distance_km: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    if end <= start {
        return 0.0;
    }

    let elapsed_hours = (end - start).num_milliseconds() as f64 / 3_600_000.0;
    distance_km / elapsed_hours
}

#[test]
fn one_degree_of_longitude_at_equator() {
    let distance = haversine_km(0.0, 0.0, 0.0, 1.0);
    assert!((distance - 111.19).abs() < 0.5, "got {distance}");
}

#[test]
fn cumulative_distance_of_short_sequences_is_zero() {
    assert_eq!(cumulative_distance_km(&[]), 0.0);
    assert_eq!(cumulative_distance_km(&[(56.0, 10.0)]), 0.0);
}

#[test]
fn cumulative_distance_sums_pairwise_legs() {
    let points = [(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)];
    let total = cumulative_distance_km(&points);
    let legs = haversine_km(0.0, 0.0, 0.0, 1.0) + haversine_km(0.0, 1.0, 0.0, 2.0);
    assert!((total - legs).abs() < 1e-9);
    assert!(total >= 0.0);
}

#[test]
fn zero_elapsed_time_yields_zero_speed() {
    let t = DateTime::from_timestamp(1000, 0).unwrap();
    assert_eq!(average_speed_kmh(5.0, t, t), 0.0);

    let earlier = DateTime::from_timestamp(500, 0).unwrap();
    assert_eq!(average_speed_kmh(5.0, t, earlier), 0.0);
}

#[test]
fn average_speed_over_one_hour() {
    let start = DateTime::from_timestamp(0, 0).unwrap();
    let end = DateTime::from_timestamp(3600, 0).unwrap();
    assert!((average_speed_kmh(5.0, start, end) - 5.0).abs() < 1e-9);
}
