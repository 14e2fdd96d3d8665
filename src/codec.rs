// SPDX-License-Identifier: MIT

//! Station record codec.
//!
//! Maps between the flat key-value document stored in Firestore and the
//! in-memory [`Station`]. Decoding tolerates legacy documents: unknown enum
//! strings fall back to a default variant and `listing_type` defaults to
//! `user` (documents predate the field). Missing required keys fail the
//! decode for that document only; the caller skips it and continues.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::models::{Coordinate, Cost, ListingType, LocationType, Station};

/// A single document failed to decode. Non-fatal: skip the record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("document is not a key-value map")]
    NotAMap,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has the wrong type")]
    InvalidField(&'static str),

    #[error("invalid timestamp in `{0}`: {1}")]
    InvalidTimestamp(&'static str, String),
}

fn required_str(doc: &serde_json::Map<String, Value>, key: &'static str) -> Result<String, DecodeError> {
    match doc.get(key) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::InvalidField(key)),
    }
}

fn required_f64(doc: &serde_json::Map<String, Value>, key: &'static str) -> Result<f64, DecodeError> {
    match doc.get(key) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(key)),
        Some(v) => v.as_f64().ok_or(DecodeError::InvalidField(key)),
    }
}

fn optional_str(doc: &serde_json::Map<String, Value>, key: &'static str) -> Result<Option<String>, DecodeError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::InvalidField(key)),
    }
}

/// Decode a raw station document.
///
/// Required keys: id, latitude, longitude, name, description, limitations,
/// location_type, cost, photo_refs, date_added, added_by.
pub fn decode_station(raw: &Value) -> Result<Station, DecodeError> {
    let doc = raw.as_object().ok_or(DecodeError::NotAMap)?;

    let latitude = required_f64(doc, "latitude")?;
    let longitude = required_f64(doc, "longitude")?;

    let photo_refs = match doc.get("photo_refs") {
        None | Some(Value::Null) => return Err(DecodeError::MissingField("photo_refs")),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or(DecodeError::InvalidField("photo_refs"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(DecodeError::InvalidField("photo_refs")),
    };

    let date_added_raw = required_str(doc, "date_added")?;
    let date_added = DateTime::parse_from_rfc3339(&date_added_raw)
        .map_err(|e| DecodeError::InvalidTimestamp("date_added", e.to_string()))?
        .with_timezone(&Utc);

    let ratings_count = match doc.get("ratings_count") {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_u64().ok_or(DecodeError::InvalidField("ratings_count"))? as u32,
    };

    // The average is undefined, not zero, when there are no ratings
    let average_rating = if ratings_count == 0 {
        None
    } else {
        match doc.get("average_rating") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_f64()
                    .ok_or(DecodeError::InvalidField("average_rating"))?,
            ),
        }
    };

    let is_car_accessible = match doc.get("is_car_accessible") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => return Err(DecodeError::InvalidField("is_car_accessible")),
    };

    Ok(Station {
        id: required_str(doc, "id")?,
        coordinate: Some(Coordinate::new(latitude, longitude)),
        name: required_str(doc, "name")?,
        description: required_str(doc, "description")?,
        limitations: required_str(doc, "limitations")?,
        location_type: LocationType::from_wire(&required_str(doc, "location_type")?),
        cost: Cost::from_wire(&required_str(doc, "cost")?),
        // Legacy documents predate listing_type
        listing_type: optional_str(doc, "listing_type")?
            .map(|s| ListingType::from_wire(&s))
            .unwrap_or(ListingType::User),
        photo_refs,
        date_added,
        added_by: required_str(doc, "added_by")?,
        average_rating,
        ratings_count,
        is_car_accessible,
        // Server-side documents are never drafts
        is_draft: false,
        manual_address: optional_str(doc, "manual_address")?,
        manual_description: optional_str(doc, "manual_description")?,
        verified: doc.get("verified").and_then(Value::as_bool).unwrap_or(false),
    })
}

/// Encode a station as a raw document.
///
/// Emits every field including defaults, so `decode(encode(s)) == s` for
/// every non-draft station.
pub fn encode_station(station: &Station) -> Value {
    let (latitude, longitude) = match &station.coordinate {
        Some(c) => (json!(c.latitude), json!(c.longitude)),
        None => (Value::Null, Value::Null),
    };

    json!({
        "id": station.id,
        "latitude": latitude,
        "longitude": longitude,
        "name": station.name,
        "description": station.description,
        "limitations": station.limitations,
        "location_type": station.location_type.as_str(),
        "cost": station.cost.as_str(),
        "listing_type": station.listing_type.as_str(),
        "photo_refs": station.photo_refs,
        "date_added": station.date_added.to_rfc3339(),
        "added_by": station.added_by,
        "average_rating": station.average_rating,
        "ratings_count": station.ratings_count,
        "is_car_accessible": station.is_car_accessible,
        "manual_address": station.manual_address,
        "manual_description": station.manual_description,
        "verified": station.verified,
    })
}
