// SPDX-License-Identifier: MIT

//! Station model for storage and API.

use geo::Point;
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Convert to a geo point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Kind of place hosting the refill point; determines display icon/color.
///
/// Unrecognized wire strings decode as `Other` so that old clients keep
/// working when new types are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    WaterFountain,
    Cafe,
    Restaurant,
    Shop,
    Pub,
    PublicSpace,
    Other,
}

impl LocationType {
    pub const ALL: [LocationType; 7] = [
        LocationType::WaterFountain,
        LocationType::Cafe,
        LocationType::Restaurant,
        LocationType::Shop,
        LocationType::Pub,
        LocationType::PublicSpace,
        LocationType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::WaterFountain => "water-fountain",
            LocationType::Cafe => "cafe",
            LocationType::Restaurant => "restaurant",
            LocationType::Shop => "shop",
            LocationType::Pub => "pub",
            LocationType::PublicSpace => "public-space",
            LocationType::Other => "other",
        }
    }

    /// Decode a wire string, falling back to `Other` for unknown values.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "water-fountain" => LocationType::WaterFountain,
            "cafe" => LocationType::Cafe,
            "restaurant" => LocationType::Restaurant,
            "shop" => LocationType::Shop,
            "pub" => LocationType::Pub,
            "public-space" => LocationType::PublicSpace,
            _ => LocationType::Other,
        }
    }
}

/// Whether refilling costs anything at this station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cost {
    Free,
    PurchaseRequired,
    Paid,
}

impl Cost {
    pub const ALL: [Cost; 3] = [Cost::Free, Cost::PurchaseRequired, Cost::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cost::Free => "free",
            Cost::PurchaseRequired => "purchase-required",
            Cost::Paid => "paid",
        }
    }

    /// Decode a wire string, falling back to `Free` for unknown values.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "free" => Cost::Free,
            "purchase-required" => Cost::PurchaseRequired,
            "paid" => Cost::Paid,
            _ => Cost::Free,
        }
    }
}

/// User-added point vs. business-submitted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingType {
    User,
    Business,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::User => "user",
            ListingType::Business => "business",
        }
    }

    pub fn from_wire(s: &str) -> Self {
        match s {
            "business" => ListingType::Business,
            _ => ListingType::User,
        }
    }
}

/// A point of interest where a user can refill a water bottle.
///
/// The id is assigned client-side at creation time and stays stable for the
/// station's lifetime. `is_draft` is true only while the station lives in
/// the local draft store; server-side documents are never drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    /// Required for a submitted station; may be absent while in draft state
    pub coordinate: Option<Coordinate>,
    pub name: String,
    pub description: String,
    pub limitations: String,
    pub location_type: LocationType,
    pub cost: Cost,
    pub listing_type: ListingType,
    /// Ordered opaque storage paths; empty until photos are uploaded
    pub photo_refs: Vec<String>,
    /// Creation timestamp, immutable after creation
    pub date_added: chrono::DateTime<chrono::Utc>,
    /// Contributing account id; empty only in anonymous/preview contexts
    pub added_by: String,
    /// Server-computed aggregate; `None` when no reviews exist
    pub average_rating: Option<f64>,
    pub ratings_count: u32,
    /// Tri-state: unknown / true / false
    pub is_car_accessible: Option<bool>,
    pub is_draft: bool,
    /// Free-text address when the contributor is not physically present
    pub manual_address: Option<String>,
    pub manual_description: Option<String>,
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_type_round_trips_through_wire() {
        for lt in LocationType::ALL {
            assert_eq!(LocationType::from_wire(lt.as_str()), lt);
        }
    }

    #[test]
    fn test_unknown_location_type_falls_back_to_other() {
        assert_eq!(LocationType::from_wire("vending-machine"), LocationType::Other);
    }

    #[test]
    fn test_unknown_cost_falls_back_to_free() {
        assert_eq!(Cost::from_wire("donation"), Cost::Free);
    }

    #[test]
    fn test_unknown_listing_type_falls_back_to_user() {
        assert_eq!(ListingType::from_wire("partner"), ListingType::User);
    }
}
