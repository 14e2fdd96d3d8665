// SPDX-License-Identifier: MIT

//! Coordinate and distance utilities.
//!
//! The nearby-station query uses a coarse bounding box (one degree of
//! latitude approximated as 69 miles) for the store-side filter and the
//! exact great-circle distance for the client-side refinement pass.

use geo::{Distance, Haversine, Point};

/// One degree of latitude in miles. The same delta is applied to longitude,
/// which over-includes at high latitudes; results are refined by exact
/// distance afterwards.
pub const MILES_PER_DEGREE: f64 = 69.0;

const METERS_PER_MILE: f64 = 1609.344;

/// Independent min/max latitude and longitude bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: Point<f64>) -> bool {
        point.y() >= self.lat_min
            && point.y() <= self.lat_max
            && point.x() >= self.lng_min
            && point.x() <= self.lng_max
    }
}

/// Compute the bounding box for a search radius around a center point.
pub fn bounding_box(center: Point<f64>, radius_miles: f64) -> BoundingBox {
    let delta = radius_miles / MILES_PER_DEGREE;
    BoundingBox {
        lat_min: center.y() - delta,
        lat_max: center.y() + delta,
        lng_min: center.x() - delta,
        lng_max: center.x() + delta,
    }
}

/// Great-circle distance between two points, in miles.
pub fn distance_miles(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b) / METERS_PER_MILE
}
