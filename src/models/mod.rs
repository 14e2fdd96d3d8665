// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod review;
pub mod station;
pub mod user;

pub use review::{aggregate_ratings, RatingAggregate, Review};
pub use station::{Coordinate, Cost, ListingType, LocationType, Station};
pub use user::{Badge, UserProfile};
