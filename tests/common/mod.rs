// SPDX-License-Identifier: MIT

//! Shared test fixtures.

use chrono::{DateTime, Utc};
use refill_finder::models::{Coordinate, Cost, ListingType, LocationType, Station};

/// Fixed timestamp so round-trip comparisons are exact.
pub fn fixed_date() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-14T09:26:53Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// A fully populated non-draft station at the given coordinate.
pub fn station_at(id: &str, latitude: f64, longitude: f64) -> Station {
    Station {
        id: id.to_string(),
        coordinate: Some(Coordinate::new(latitude, longitude)),
        name: format!("Station {}", id),
        description: "Cold tap by the door".to_string(),
        limitations: "Opening hours only".to_string(),
        location_type: LocationType::Cafe,
        cost: Cost::Free,
        listing_type: ListingType::User,
        photo_refs: vec![format!("stations/{}/photo.jpg", id)],
        date_added: fixed_date(),
        added_by: "user-1".to_string(),
        average_rating: None,
        ratings_count: 0,
        is_car_accessible: None,
        is_draft: false,
        manual_address: None,
        manual_description: None,
        verified: false,
    }
}
