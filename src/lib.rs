// SPDX-License-Identifier: MIT

//! Refill-Finder: discover and contribute water-refill station locations.
//!
//! This crate provides the backend for the nearby-station retrieval and
//! draft-submission pipeline: geo queries against Firestore, photo uploads
//! to object storage, local draft persistence, and review aggregates.

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{
    DraftStore, NearbyService, QueryGate, ReviewService, SettingsStore, SubmissionService,
};

/// Shared application state.
///
/// All services are explicitly constructed at startup and injected here;
/// nothing is reached through ambient globals.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub drafts: DraftStore,
    pub settings: SettingsStore,
    pub nearby: NearbyService,
    pub gate: QueryGate,
    pub submission: SubmissionService,
    pub reviews: ReviewService,
}
