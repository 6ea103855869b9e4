//! Travel-time estimation. A pluggable route-provider port with a
//! haversine fallback — this crate never computes real-world routing,
//! only a conservative estimate.

use crate::model::GeoPoint;

const EARTH_RADIUS_MILES: f64 = 3958.8;
const DEFAULT_MINUTES_PER_MILE: f64 = 2.0;
const MIN_TRAVEL_MINUTES: f64 = 15.0;
const CONSTANT_FALLBACK_MINUTES: f64 = 30.0;

/// Great-circle distance between two points, in miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_MILES * c
}

/// A pluggable route provider; production implementations may call out to
/// a mapping service. `None` from this port means "use the haversine
/// fallback", not an error — routing is explicitly out of scope.
pub trait RouteProviderPort: Send + Sync {
    fn estimate_minutes(&self, from: GeoPoint, to: GeoPoint) -> Option<f64>;
}

pub struct HaversineFallback {
    pub minutes_per_mile: f64,
}

impl Default for HaversineFallback {
    fn default() -> Self {
        Self {
            minutes_per_mile: DEFAULT_MINUTES_PER_MILE,
        }
    }
}

impl RouteProviderPort for HaversineFallback {
    fn estimate_minutes(&self, from: GeoPoint, to: GeoPoint) -> Option<f64> {
        let miles = haversine_miles(from, to);
        Some((miles * self.minutes_per_mile).max(MIN_TRAVEL_MINUTES))
    }
}

/// Estimates travel time between two venues for the travel-time conflict
/// check: haversine when both geo-points exist, otherwise a
/// constant 30 minutes.
pub fn estimate_travel_minutes(
    route_provider: &dyn RouteProviderPort,
    from: Option<GeoPoint>,
    to: Option<GeoPoint>,
) -> f64 {
    match (from, to) {
        (Some(a), Some(b)) => route_provider
            .estimate_minutes(a, b)
            .unwrap_or(CONSTANT_FALLBACK_MINUTES),
        _ => CONSTANT_FALLBACK_MINUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_distance_for_identical_points() {
        let p = GeoPoint {
            latitude: 33.4484,
            longitude: -112.0740,
        };
        assert!(haversine_miles(p, p) < 1e-9);
    }

    #[test]
    fn haversine_roughly_matches_known_phoenix_tucson_distance() {
        let phoenix = GeoPoint {
            latitude: 33.4484,
            longitude: -112.0740,
        };
        let tucson = GeoPoint {
            latitude: 32.2226,
            longitude: -110.9747,
        };
        let miles = haversine_miles(phoenix, tucson);
        assert!((100.0..130.0).contains(&miles), "got {miles}");
    }

    #[test]
    fn estimate_floors_at_minimum_travel_minutes() {
        let fallback = HaversineFallback::default();
        let p = GeoPoint {
            latitude: 33.4484,
            longitude: -112.0740,
        };
        let nearby = GeoPoint {
            latitude: 33.4490,
            longitude: -112.0745,
        };
        let minutes = estimate_travel_minutes(&fallback, Some(p), Some(nearby));
        assert_eq!(minutes, MIN_TRAVEL_MINUTES);
    }

    #[test]
    fn missing_geo_points_use_constant_fallback() {
        let fallback = HaversineFallback::default();
        let minutes = estimate_travel_minutes(&fallback, None, None);
        assert_eq!(minutes, CONSTANT_FALLBACK_MINUTES);
    }
}
