// SPDX-License-Identifier: MIT

//! API routes.
//!
//! The HTTP surface is the UI boundary: each handler maps one screen-level
//! operation onto the services and reports failures through the single
//! error channel in `crate::error`.

use crate::error::{AppError, Result};
use crate::models::{Badge, Coordinate, Cost, LocationType, Review, Station};
use crate::services::{filter_stations, Settings, StationFilters, StationSubmission, Viewport};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stations/nearby", get(get_nearby_stations))
        .route("/api/stations", post(submit_station))
        .route("/api/stations/{id}/reviews", get(get_reviews).post(add_review))
        .route("/api/reviews/{id}", put(edit_review).delete(delete_review))
        .route("/api/reviews/{id}/helpful", post(mark_review_helpful))
        .route("/api/drafts", get(get_drafts).put(save_draft))
        .route("/api/drafts/{id}", delete(delete_draft))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/favorites", put(set_favorite))
        .route("/api/settings", get(get_settings).put(put_settings))
}

// ─── Nearby Stations ─────────────────────────────────────────

#[derive(Deserialize)]
struct NearbyQuery {
    lat: f64,
    lng: f64,
    radius_miles: Option<f64>,
    /// Session id for query coalescing; omit to bypass the gate
    session_id: Option<String>,
    /// Comma-separated location types; all types when absent
    types: Option<String>,
    /// Comma-separated costs; all costs when absent
    costs: Option<String>,
    #[serde(default)]
    car_accessible_only: bool,
}

#[derive(Serialize)]
struct NearbyResponse {
    stations: Vec<Station>,
    /// True when a newer viewport change made this query obsolete
    superseded: bool,
}

/// Find stations near a point, refined to an exact radius and narrowed by
/// the user's display filters.
async fn get_nearby_stations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>> {
    let center = Coordinate::new(query.lat, query.lng);
    let radius_miles = query
        .radius_miles
        .unwrap_or(state.config.default_search_radius_miles);

    let superseded = NearbyResponse {
        stations: vec![],
        superseded: true,
    };

    // With a session id the gate coalesces rapid viewport changes and
    // tags the query so stale completions are discarded.
    let seq = match &query.session_id {
        Some(session) => {
            let viewport = Viewport {
                center,
                radius_miles,
            };
            match state.gate.admit(session, viewport).await {
                Some(seq) => Some(seq),
                None => return Ok(Json(superseded)),
            }
        }
        None => None,
    };

    let stations = state.nearby.find_nearby(center, radius_miles).await?;

    if let Some(seq) = seq {
        if state.gate.is_stale(seq) {
            return Ok(Json(superseded));
        }
    }

    let filters = StationFilters {
        types: parse_selection(query.types.as_deref(), LocationType::from_wire, LocationType::ALL),
        costs: parse_selection(query.costs.as_deref(), Cost::from_wire, Cost::ALL),
        car_accessible_only: query.car_accessible_only,
    };

    Ok(Json(NearbyResponse {
        stations: filter_stations(&stations, &filters),
        superseded: false,
    }))
}

/// Parse a comma-separated selection, defaulting to the full set.
fn parse_selection<T, const N: usize>(
    raw: Option<&str>,
    parse: fn(&str) -> T,
    all: [T; N],
) -> HashSet<T>
where
    T: std::hash::Hash + Eq + Copy,
{
    match raw {
        None => all.into_iter().collect(),
        Some(csv) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse)
            .collect(),
    }
}

// ─── Station Submission ──────────────────────────────────────

#[derive(Deserialize)]
struct SubmitStationRequest {
    #[serde(flatten)]
    station: StationSubmission,
    /// Base64-encoded photos, order preserved
    #[serde(default)]
    photos: Vec<String>,
    contributor_id: String,
    /// Draft to remove locally once the submission succeeds
    draft_id: Option<String>,
}

#[derive(Serialize)]
struct SubmitStationResponse {
    station_id: String,
    photo_paths: Vec<String>,
}

async fn submit_station(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitStationRequest>,
) -> Result<Json<SubmitStationResponse>> {
    let photos = request
        .photos
        .iter()
        .map(|p| {
            STANDARD
                .decode(p)
                .map_err(|e| AppError::BadRequest(format!("Invalid photo encoding: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let receipt = state
        .submission
        .submit(request.station, photos, &request.contributor_id)
        .await?;

    // The draft is only discarded after a durable submission; on any
    // failure above it stays local for retry.
    if let Some(draft_id) = &request.draft_id {
        if let Err(e) = state.drafts.delete(draft_id) {
            tracing::warn!(draft_id, error = %e, "Failed to remove submitted draft");
        }
    }

    Ok(Json(SubmitStationResponse {
        station_id: receipt.station_id,
        photo_paths: receipt.photo_paths,
    }))
}

// ─── Drafts ──────────────────────────────────────────────────

#[derive(Serialize)]
struct DraftListResponse {
    drafts: Vec<Station>,
}

/// All local drafts, newest first.
async fn get_drafts(State(state): State<Arc<AppState>>) -> Result<Json<DraftListResponse>> {
    let mut drafts = state.drafts.load_all();
    drafts.sort_by(|a, b| b.date_added.cmp(&a.date_added));
    Ok(Json(DraftListResponse { drafts }))
}

#[derive(Serialize)]
struct AckResponse {
    success: bool,
}

async fn save_draft(
    State(state): State<Arc<AppState>>,
    Json(station): Json<Station>,
) -> Result<Json<AckResponse>> {
    state.drafts.save(&station)?;
    Ok(Json(AckResponse { success: true }))
}

async fn delete_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AckResponse>> {
    state.drafts.delete(&id)?;
    Ok(Json(AckResponse { success: true }))
}

// ─── Reviews ─────────────────────────────────────────────────

#[derive(Serialize)]
struct ReviewListResponse {
    reviews: Vec<Review>,
}

async fn get_reviews(
    State(state): State<Arc<AppState>>,
    Path(station_id): Path<String>,
) -> Result<Json<ReviewListResponse>> {
    let reviews = state.reviews.reviews_for_station(&station_id).await?;
    Ok(Json(ReviewListResponse { reviews }))
}

#[derive(Deserialize)]
struct ReviewRequest {
    author_id: String,
    rating: u8,
    comment: String,
}

async fn add_review(
    State(state): State<Arc<AppState>>,
    Path(station_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Review>> {
    let review = state
        .reviews
        .add_review(
            &station_id,
            &request.author_id,
            request.rating,
            request.comment,
        )
        .await?;
    Ok(Json(review))
}

async fn edit_review(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Review>> {
    let review = state
        .reviews
        .edit_review(
            &review_id,
            &request.author_id,
            request.rating,
            request.comment,
        )
        .await?;
    Ok(Json(review))
}

#[derive(Deserialize)]
struct DeleteReviewRequest {
    author_id: String,
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
    Json(request): Json<DeleteReviewRequest>,
) -> Result<Json<AckResponse>> {
    state
        .reviews
        .delete_review(&review_id, &request.author_id)
        .await?;
    Ok(Json(AckResponse { success: true }))
}

#[derive(Deserialize)]
struct MarkHelpfulRequest {
    user_id: String,
}

async fn mark_review_helpful(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<String>,
    Json(request): Json<MarkHelpfulRequest>,
) -> Result<Json<AckResponse>> {
    state
        .reviews
        .mark_helpful(&review_id, &request.user_id)
        .await?;
    Ok(Json(AckResponse { success: true }))
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Serialize)]
struct UserResponse {
    user_id: String,
    display_name: String,
    station_count: u32,
    contribution_count: u32,
    favorite_station_ids: Vec<String>,
    badge: Option<Badge>,
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(UserResponse {
        badge: profile.badge(),
        user_id: profile.user_id,
        display_name: profile.display_name,
        station_count: profile.station_count,
        contribution_count: profile.contribution_count,
        favorite_station_ids: profile.favorite_station_ids,
    }))
}

#[derive(Deserialize)]
struct FavoriteRequest {
    station_id: String,
    favorite: bool,
}

async fn set_favorite(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<AckResponse>> {
    state
        .db
        .set_favorite(&user_id, &request.station_id, request.favorite)
        .await?;
    Ok(Json(AckResponse { success: true }))
}

// ─── Settings ────────────────────────────────────────────────

async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>> {
    Ok(Json(state.settings.get()))
}

async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<AckResponse>> {
    state.settings.set(settings)?;
    Ok(Json(AckResponse { success: true }))
}
