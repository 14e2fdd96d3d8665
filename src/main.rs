// SPDX-License-Identifier: MIT

//! Refill-Finder API Server
//!
//! Serves the nearby-station retrieval and draft-submission pipeline for
//! the refill-station app: geo queries, photo uploads, drafts, reviews.

use refill_finder::{
    config::Config,
    db::FirestoreDb,
    services::{
        DraftStore, NearbyService, QueryGate, ReviewService, SettingsStore, StorageBucket,
        SubmissionService,
    },
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Quiet period for coalescing map-driven nearby queries.
const NEARBY_QUIET_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Refill-Finder API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize object storage for station photos
    let storage = StorageBucket::new(&config.photo_bucket);
    tracing::info!(bucket = %config.photo_bucket, "Photo storage initialized");

    // Open on-device stores
    let drafts = DraftStore::open(config.data_dir.join("drafts.json"))
        .expect("Failed to open draft store");
    let settings = SettingsStore::open(config.data_dir.join("settings.json"))
        .expect("Failed to open settings store");
    tracing::info!(
        drafts = drafts.load_all().len(),
        data_dir = %config.data_dir.display(),
        "Local stores opened"
    );

    // Build services
    let nearby = NearbyService::new(db.clone());
    let gate = QueryGate::new(NEARBY_QUIET_PERIOD);
    let submission = SubmissionService::new(db.clone(), storage);
    let reviews = ReviewService::new(db.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        drafts,
        settings,
        nearby,
        gate,
        submission,
        reviews,
    });

    // Build router
    let app = refill_finder::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("refill_finder=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
