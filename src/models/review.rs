// SPDX-License-Identifier: MIT

//! Review model and rating aggregation.

use serde::{Deserialize, Serialize};

/// A rating plus comment, attached to exactly one station and one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Review ID (also used as document ID)
    pub id: String,
    pub station_id: String,
    pub author_id: String,
    /// 1-5 integer rating
    pub rating: u8,
    pub comment: String,
    pub date_added: chrono::DateTime<chrono::Utc>,
    /// Set on first edit, updated on subsequent edits
    pub date_updated: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub helpful_count: u32,
    #[serde(default)]
    pub report_count: u32,
    /// Users who marked this review helpful (at most once each)
    #[serde(default)]
    pub helpful_user_ids: Vec<String>,
}

impl Review {
    /// Whether `user_id` may mark this review helpful.
    ///
    /// A user marks helpful at most once and never on their own review.
    pub fn can_mark_helpful(&self, user_id: &str) -> bool {
        user_id != self.author_id && !self.helpful_user_ids.iter().any(|id| id == user_id)
    }
}

/// Station-level rating aggregate, recomputed whenever a review is
/// added, edited, or removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    /// Undefined (not zero) when no reviews exist
    pub average: Option<f64>,
    pub count: u32,
}

/// Compute the rating aggregate from the full review set of a station.
pub fn aggregate_ratings(reviews: &[Review]) -> RatingAggregate {
    if reviews.is_empty() {
        return RatingAggregate {
            average: None,
            count: 0,
        };
    }
    let sum: u32 = reviews.iter().map(|r| r.rating as u32).sum();
    RatingAggregate {
        average: Some(sum as f64 / reviews.len() as f64),
        count: reviews.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, author: &str, rating: u8) -> Review {
        Review {
            id: id.to_string(),
            station_id: "s1".to_string(),
            author_id: author.to_string(),
            rating,
            comment: String::new(),
            date_added: chrono::Utc::now(),
            date_updated: None,
            is_edited: false,
            helpful_count: 0,
            report_count: 0,
            helpful_user_ids: vec![],
        }
    }

    #[test]
    fn test_aggregate_of_no_reviews_is_undefined() {
        let agg = aggregate_ratings(&[]);
        assert_eq!(agg.average, None);
        assert_eq!(agg.count, 0);
    }

    #[test]
    fn test_aggregate_averages_ratings() {
        let reviews = vec![review("r1", "a", 5), review("r2", "b", 2)];
        let agg = aggregate_ratings(&reviews);
        assert_eq!(agg.average, Some(3.5));
        assert_eq!(agg.count, 2);
    }

    #[test]
    fn test_author_cannot_mark_own_review_helpful() {
        let r = review("r1", "alice", 4);
        assert!(!r.can_mark_helpful("alice"));
        assert!(r.can_mark_helpful("bob"));
    }

    #[test]
    fn test_helpful_mark_is_once_per_user() {
        let mut r = review("r1", "alice", 4);
        r.helpful_user_ids.push("bob".to_string());
        assert!(!r.can_mark_helpful("bob"));
        assert!(r.can_mark_helpful("carol"));
    }
}
