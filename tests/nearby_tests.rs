// SPDX-License-Identifier: MIT

//! Nearby-station query pipeline tests against the mock store.
//!
//! The store-side filter is a latitude band, so these tests seed documents
//! that fall inside the band but outside the box or the exact radius, and
//! verify the client-side refinement discards them.

mod common;

use common::station_at;
use refill_finder::codec::encode_station;
use refill_finder::db::{collections, FirestoreDb};
use refill_finder::error::AppError;
use refill_finder::geo::distance_miles;
use refill_finder::models::Coordinate;
use refill_finder::services::NearbyService;

const LONDON: Coordinate = Coordinate {
    latitude: 51.5074,
    longitude: -0.1278,
};

fn seed_station(db: &FirestoreDb, id: &str, latitude: f64, longitude: f64) {
    let station = station_at(id, latitude, longitude);
    db.mock_seed(collections::STATIONS, id, encode_station(&station));
}

#[tokio::test]
async fn test_station_at_center_is_always_included() {
    let db = FirestoreDb::new_mock();
    seed_station(&db, "center", LONDON.latitude, LONDON.longitude);

    let service = NearbyService::new(db);
    let stations = service.find_nearby(LONDON, 0.0).await.unwrap();

    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].id, "center");
}

#[tokio::test]
async fn test_results_satisfy_exact_radius_postcondition() {
    let db = FirestoreDb::new_mock();
    seed_station(&db, "near", 51.51, -0.125);
    seed_station(&db, "edge", 51.52, -0.14);
    seed_station(&db, "far", 51.53, -0.05);

    let radius = 1.0;
    let service = NearbyService::new(db);
    let stations = service.find_nearby(LONDON, radius).await.unwrap();

    assert!(!stations.is_empty());
    for station in &stations {
        let d = distance_miles(LONDON.point(), station.coordinate.unwrap().point());
        assert!(d <= radius, "station {} at {} miles exceeds radius", station.id, d);
    }
}

#[tokio::test]
async fn test_station_outside_longitude_bounds_is_discarded() {
    let db = FirestoreDb::new_mock();
    // Same latitude band as the center, but far to the east
    seed_station(&db, "east", LONDON.latitude, 1.0);

    let service = NearbyService::new(db);
    let stations = service.find_nearby(LONDON, 2.0).await.unwrap();
    assert!(stations.is_empty());
}

#[tokio::test]
async fn test_box_corner_outside_disk_is_discarded() {
    let db = FirestoreDb::new_mock();
    // Inside the 2-mile bounding box (delta = 2/69 degrees on both axes)
    // but further than 2 miles great-circle from the center
    let delta = 2.0 / 69.0;
    seed_station(
        &db,
        "corner",
        LONDON.latitude + delta * 0.99,
        LONDON.longitude + delta * 0.99,
    );

    let service = NearbyService::new(db);
    let stations = service.find_nearby(LONDON, 2.0).await.unwrap();
    assert!(stations.is_empty());
}

#[tokio::test]
async fn test_results_are_sorted_by_distance() {
    let db = FirestoreDb::new_mock();
    seed_station(&db, "farther", 51.515, -0.125);
    seed_station(&db, "nearer", 51.508, -0.128);

    let service = NearbyService::new(db);
    let stations = service.find_nearby(LONDON, 3.0).await.unwrap();

    let ids: Vec<_> = stations.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["nearer", "farther"]);
}

#[tokio::test]
async fn test_undecodable_document_is_skipped_not_fatal() {
    let db = FirestoreDb::new_mock();
    seed_station(&db, "good", 51.508, -0.128);
    // Missing `name`, so the decode fails for this document only
    db.mock_seed(
        collections::STATIONS,
        "broken",
        serde_json::json!({
            "id": "broken",
            "latitude": 51.509,
            "longitude": -0.127,
        }),
    );

    let service = NearbyService::new(db);
    let stations = service.find_nearby(LONDON, 2.0).await.unwrap();

    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].id, "good");
}

#[tokio::test]
async fn test_empty_result_is_not_an_error() {
    let db = FirestoreDb::new_mock();
    let service = NearbyService::new(db);
    let stations = service.find_nearby(LONDON, 1.0).await.unwrap();
    assert!(stations.is_empty());
}

#[tokio::test]
async fn test_store_failure_aborts_with_no_partial_results() {
    let db = FirestoreDb::new_mock();
    seed_station(&db, "near", 51.508, -0.128);
    db.mock_fail_queries(true);

    let service = NearbyService::new(db);
    let result = service.find_nearby(LONDON, 1.0).await;
    assert!(matches!(result, Err(AppError::Database(_))));
}

#[tokio::test]
async fn test_negative_radius_is_rejected() {
    let db = FirestoreDb::new_mock();
    let service = NearbyService::new(db);
    let result = service.find_nearby(LONDON, -1.0).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}
