// SPDX-License-Identifier: MIT

//! Station record codec tests.
//!
//! The codec is the forward-compatibility boundary: legacy documents and
//! unknown enum values must decode to sensible defaults, while documents
//! missing required fields must fail individually without poisoning the
//! rest of the batch.

mod common;

use common::{fixed_date, station_at};
use refill_finder::codec::{decode_station, encode_station, DecodeError};
use refill_finder::models::{Cost, ListingType, LocationType};
use serde_json::json;

fn sample_doc() -> serde_json::Value {
    json!({
        "id": "st-1",
        "latitude": 51.5074,
        "longitude": -0.1278,
        "name": "Borough Market Fountain",
        "description": "Public fountain near the entrance",
        "limitations": "",
        "location_type": "water-fountain",
        "cost": "free",
        "listing_type": "user",
        "photo_refs": ["stations/st-1/a.jpg"],
        "date_added": "2026-03-14T09:26:53Z",
        "added_by": "user-1",
        "average_rating": null,
        "ratings_count": 0,
        "is_car_accessible": null,
        "manual_address": null,
        "manual_description": null,
        "verified": false,
    })
}

#[test]
fn test_decode_complete_document() {
    let station = decode_station(&sample_doc()).expect("should decode");
    assert_eq!(station.id, "st-1");
    assert_eq!(station.name, "Borough Market Fountain");
    assert_eq!(station.location_type, LocationType::WaterFountain);
    assert_eq!(station.cost, Cost::Free);
    assert_eq!(station.listing_type, ListingType::User);
    assert_eq!(station.coordinate.unwrap().latitude, 51.5074);
    assert_eq!(station.date_added, fixed_date());
    assert!(!station.is_draft, "server documents are never drafts");
}

#[test]
fn test_round_trip_is_lossless() {
    let mut station = station_at("st-42", 48.8566, 2.3522);
    station.average_rating = Some(4.5);
    station.ratings_count = 12;
    station.is_car_accessible = Some(true);
    station.manual_address = Some("12 Rue de Rivoli".to_string());
    station.listing_type = ListingType::Business;
    station.cost = Cost::PurchaseRequired;
    station.verified = true;

    let decoded = decode_station(&encode_station(&station)).expect("should decode");
    assert_eq!(decoded, station);
}

#[test]
fn test_round_trip_of_minimal_station() {
    let station = station_at("st-7", 51.5, -0.12);
    let decoded = decode_station(&encode_station(&station)).expect("should decode");
    assert_eq!(decoded, station);
}

#[test]
fn test_missing_required_field_fails() {
    for field in [
        "id",
        "latitude",
        "longitude",
        "name",
        "description",
        "limitations",
        "location_type",
        "cost",
        "photo_refs",
        "date_added",
        "added_by",
    ] {
        let mut doc = sample_doc();
        doc.as_object_mut().unwrap().remove(field);
        let result = decode_station(&doc);
        assert!(result.is_err(), "document without `{}` should fail", field);
    }
}

#[test]
fn test_decode_failure_does_not_poison_the_batch() {
    let mut bad = sample_doc();
    bad.as_object_mut().unwrap().remove("name");
    let batch = vec![sample_doc(), bad, sample_doc()];

    let decoded: Vec<_> = batch.iter().filter_map(|d| decode_station(d).ok()).collect();
    assert_eq!(decoded.len(), 2);
}

#[test]
fn test_unknown_location_type_falls_back_to_other() {
    let mut doc = sample_doc();
    doc["location_type"] = json!("vending-machine");
    let station = decode_station(&doc).expect("should decode");
    assert_eq!(station.location_type, LocationType::Other);
}

#[test]
fn test_unknown_cost_falls_back_to_free() {
    let mut doc = sample_doc();
    doc["cost"] = json!("donation");
    let station = decode_station(&doc).expect("should decode");
    assert_eq!(station.cost, Cost::Free);
}

#[test]
fn test_legacy_document_defaults_listing_type_to_user() {
    let mut doc = sample_doc();
    doc.as_object_mut().unwrap().remove("listing_type");
    let station = decode_station(&doc).expect("should decode");
    assert_eq!(station.listing_type, ListingType::User);
}

#[test]
fn test_average_rating_is_undefined_with_zero_ratings() {
    let mut doc = sample_doc();
    // A buggy writer left an average behind with no ratings
    doc["average_rating"] = json!(3.0);
    doc["ratings_count"] = json!(0);
    let station = decode_station(&doc).expect("should decode");
    assert_eq!(station.average_rating, None);
}

#[test]
fn test_non_numeric_average_rating_fails() {
    let mut doc = sample_doc();
    doc["average_rating"] = json!("4.5");
    doc["ratings_count"] = json!(3);
    assert!(matches!(
        decode_station(&doc),
        Err(DecodeError::InvalidField("average_rating"))
    ));
}

#[test]
fn test_wrong_field_type_fails() {
    let mut doc = sample_doc();
    doc["latitude"] = json!("51.5");
    assert!(matches!(
        decode_station(&doc),
        Err(DecodeError::InvalidField("latitude"))
    ));
}

#[test]
fn test_invalid_timestamp_fails() {
    let mut doc = sample_doc();
    doc["date_added"] = json!("yesterday");
    assert!(matches!(
        decode_station(&doc),
        Err(DecodeError::InvalidTimestamp("date_added", _))
    ));
}

#[test]
fn test_non_map_document_fails() {
    assert!(matches!(
        decode_station(&json!([1, 2, 3])),
        Err(DecodeError::NotAMap)
    ));
}

#[test]
fn test_encode_emits_all_fields() {
    let doc = encode_station(&station_at("st-9", 51.5, -0.12));
    let obj = doc.as_object().unwrap();
    for field in [
        "id",
        "latitude",
        "longitude",
        "name",
        "description",
        "limitations",
        "location_type",
        "cost",
        "listing_type",
        "photo_refs",
        "date_added",
        "added_by",
        "average_rating",
        "ratings_count",
        "is_car_accessible",
        "manual_address",
        "manual_description",
        "verified",
    ] {
        assert!(obj.contains_key(field), "encoded doc should carry `{}`", field);
    }
}
