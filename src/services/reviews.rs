// SPDX-License-Identifier: MIT

//! Review service.
//!
//! Reviews are stored per-document; the station's rating aggregate is
//! recomputed from the full review set whenever a review is added, edited,
//! or removed, then written back to the station document.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{aggregate_ratings, Review};

#[derive(Clone)]
pub struct ReviewService {
    db: FirestoreDb,
}

impl ReviewService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Add a review to a station and refresh the station's aggregate.
    pub async fn add_review(
        &self,
        station_id: &str,
        author_id: &str,
        rating: u8,
        comment: String,
    ) -> Result<Review> {
        validate_rating(rating)?;

        if self.db.get_station_doc(station_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Station {} not found",
                station_id
            )));
        }

        let review = Review {
            id: uuid::Uuid::new_v4().simple().to_string(),
            station_id: station_id.to_string(),
            author_id: author_id.to_string(),
            rating,
            comment,
            date_added: chrono::Utc::now(),
            date_updated: None,
            is_edited: false,
            helpful_count: 0,
            report_count: 0,
            helpful_user_ids: vec![],
        };

        self.db.set_review(&review).await?;
        self.recompute_station_rating(station_id).await?;

        tracing::info!(station_id, review_id = %review.id, rating, "Review added");
        Ok(review)
    }

    /// Edit an existing review. Only the author may edit.
    pub async fn edit_review(
        &self,
        review_id: &str,
        author_id: &str,
        rating: u8,
        comment: String,
    ) -> Result<Review> {
        validate_rating(rating)?;

        let mut review = self
            .db
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;

        if review.author_id != author_id {
            return Err(AppError::Forbidden(
                "Only the author can edit a review".to_string(),
            ));
        }

        review.rating = rating;
        review.comment = comment;
        review.is_edited = true;
        review.date_updated = Some(chrono::Utc::now());

        self.db.set_review(&review).await?;
        self.recompute_station_rating(&review.station_id).await?;

        tracing::info!(review_id, rating, "Review edited");
        Ok(review)
    }

    /// Delete a review. Only the author may delete.
    pub async fn delete_review(&self, review_id: &str, author_id: &str) -> Result<()> {
        let review = self
            .db
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;

        if review.author_id != author_id {
            return Err(AppError::Forbidden(
                "Only the author can delete a review".to_string(),
            ));
        }

        self.db.delete_review(review_id).await?;
        self.recompute_station_rating(&review.station_id).await?;

        tracing::info!(review_id, "Review deleted");
        Ok(())
    }

    /// Mark a review helpful. Each user may mark a review at most once and
    /// never their own.
    pub async fn mark_helpful(&self, review_id: &str, user_id: &str) -> Result<()> {
        let review = self
            .db
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;

        if review.author_id == user_id {
            return Err(AppError::Forbidden(
                "You cannot mark your own review as helpful".to_string(),
            ));
        }
        if !review.can_mark_helpful(user_id) {
            return Err(AppError::BadRequest(
                "Review already marked as helpful".to_string(),
            ));
        }

        self.db.mark_review_helpful(review_id, user_id).await
    }

    /// All reviews for a station, newest first.
    pub async fn reviews_for_station(&self, station_id: &str) -> Result<Vec<Review>> {
        self.db.get_reviews_for_station(station_id).await
    }

    /// Recompute the station's rating aggregate from its full review set.
    async fn recompute_station_rating(&self, station_id: &str) -> Result<()> {
        let reviews = self.db.get_reviews_for_station(station_id).await?;
        let aggregate = aggregate_ratings(&reviews);
        self.db
            .update_station_rating(station_id, aggregate.average, aggregate.count)
            .await
    }
}

fn validate_rating(rating: u8) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Rating must be between 1 and 5, got {}",
            rating
        )))
    }
}
