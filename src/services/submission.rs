// SPDX-License-Identifier: MIT

//! Station submission service.
//!
//! Handles the submission pipeline:
//! 1. Upload each photo to object storage under the new document's path
//! 2. Write the station document referencing the uploaded paths
//! 3. Best-effort increment of the contributor's counters
//!
//! Any photo failure aborts the whole submission before the document is
//! written; already-uploaded blobs are left behind as accepted orphans. A
//! write failure after the uploads likewise orphans the photos. Counter
//! failures are logged and do not fail the submission.

use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use validator::Validate;

use crate::codec;
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Coordinate, Cost, ListingType, LocationType, Station};
use crate::services::storage::{StorageBucket, MAX_PHOTO_BYTES};

/// Photo uploads may overlap, but the document write waits for all of them.
const MAX_CONCURRENT_UPLOADS: usize = 4;

/// Fields collected by the creation form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StationSubmission {
    /// Client-generated station id; reused from the draft when one exists
    pub id: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub coordinate: Option<Coordinate>,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(length(max = 500))]
    pub limitations: String,
    pub location_type: LocationType,
    pub cost: Cost,
    pub listing_type: ListingType,
    pub is_car_accessible: Option<bool>,
    /// Used when the contributor is not physically present
    pub manual_address: Option<String>,
    pub manual_description: Option<String>,
}

/// Outcome of a successful submission.
#[derive(Debug)]
pub struct SubmissionReceipt {
    pub station_id: String,
    pub photo_paths: Vec<String>,
}

/// Orchestrates photo uploads, the station document write, and the
/// contributor counter update.
#[derive(Clone)]
pub struct SubmissionService {
    db: FirestoreDb,
    storage: StorageBucket,
}

impl SubmissionService {
    pub fn new(db: FirestoreDb, storage: StorageBucket) -> Self {
        Self { db, storage }
    }

    /// Submit a station with its photos on behalf of `contributor_id`.
    ///
    /// Photos are uploaded in order; the document write does not begin
    /// until every upload has completed.
    pub async fn submit(
        &self,
        submission: StationSubmission,
        photos: Vec<Vec<u8>>,
        contributor_id: &str,
    ) -> Result<SubmissionReceipt> {
        submission
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let Some(coordinate) = submission.coordinate else {
            return Err(AppError::BadRequest(
                "A submitted station requires a coordinate".to_string(),
            ));
        };

        if submission.listing_type == ListingType::User && photos.is_empty() {
            return Err(AppError::BadRequest(
                "A user-added station requires at least one photo".to_string(),
            ));
        }

        if let Some(oversized) = photos.iter().position(|p| p.len() > MAX_PHOTO_BYTES) {
            return Err(AppError::BadRequest(format!(
                "Photo {} exceeds the maximum size of {} bytes",
                oversized + 1,
                MAX_PHOTO_BYTES
            )));
        }

        let station_id = submission
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        tracing::info!(
            station_id = %station_id,
            photos = photos.len(),
            listing_type = submission.listing_type.as_str(),
            "Submitting station"
        );

        // 1. Upload photos, preserving order in the collected paths. Any
        //    failure aborts the submission before the document write; blobs
        //    already uploaded stay behind as orphans.
        let upload_result: Result<Vec<String>> = stream::iter(photos)
            .map(|photo| {
                let storage = self.storage.clone();
                let path = format!(
                    "stations/{}/{}.jpg",
                    station_id,
                    uuid::Uuid::new_v4().simple()
                );
                async move { storage.upload(&path, photo, "image/jpeg").await }
            })
            .buffered(MAX_CONCURRENT_UPLOADS)
            .try_collect()
            .await;

        let photo_paths = match upload_result {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!(
                    station_id = %station_id,
                    error = %e,
                    "Photo upload failed, aborting submission"
                );
                return Err(e);
            }
        };

        // 2. Write the station document. No rating exists yet, so the
        //    average is absent rather than zero.
        let station = Station {
            id: station_id.clone(),
            coordinate: Some(coordinate),
            name: submission.name,
            description: submission.description,
            limitations: submission.limitations,
            location_type: submission.location_type,
            cost: submission.cost,
            listing_type: submission.listing_type,
            photo_refs: photo_paths.clone(),
            date_added: chrono::Utc::now(),
            added_by: contributor_id.to_string(),
            average_rating: None,
            ratings_count: 0,
            is_car_accessible: submission.is_car_accessible,
            is_draft: false,
            manual_address: submission.manual_address,
            manual_description: submission.manual_description,
            verified: false,
        };

        let doc = codec::encode_station(&station);
        if let Err(e) = self.db.set_station_doc(&station_id, &doc).await {
            tracing::error!(
                station_id = %station_id,
                orphaned_photos = photo_paths.len(),
                "Station write failed after photo uploads"
            );
            return Err(e);
        }

        // 3. Counters are best-effort: a failure here never rolls back the
        //    already-written station.
        if contributor_id.is_empty() {
            tracing::debug!(station_id = %station_id, "Anonymous submission, skipping counters");
        } else if let Err(e) = self
            .db
            .increment_contribution_counters(contributor_id)
            .await
        {
            tracing::warn!(
                station_id = %station_id,
                contributor_id,
                error = %e,
                "Failed to update contributor counters"
            );
        }

        tracing::info!(
            station_id = %station_id,
            photos = photo_paths.len(),
            "Station submitted"
        );

        Ok(SubmissionReceipt {
            station_id,
            photo_paths,
        })
    }
}
