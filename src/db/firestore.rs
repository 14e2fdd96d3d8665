// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Stations (raw documents; decoding is the codec's job)
//! - Reviews (typed, with rating aggregate updates)
//! - Users (profiles, contribution counters, favorites)
//!
//! Station queries return raw `serde_json::Value` documents so that a single
//! undecodable document can be skipped without failing the whole batch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Review, UserProfile};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Live(firestore::FirestoreDb),
    /// In-memory store for tests: seeded documents, recorded writes.
    Mock(Arc<Mutex<MockStore>>),
}

#[derive(Default)]
struct MockStore {
    /// collection -> document id -> fields
    docs: HashMap<String, HashMap<String, Value>>,
    /// "collection/id" per write operation, in order
    writes: Vec<String>,
    fail_writes: bool,
    fail_queries: bool,
    fail_counter_updates: bool,
}

impl MockStore {
    fn record_write(&mut self, collection: &str, id: &str) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::Database("mock write failure".to_string()));
        }
        self.writes.push(format!("{}/{}", collection, id));
        Ok(())
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Live(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Live(client),
        })
    }

    /// Create an in-memory mock client for testing (offline mode).
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Mock(Arc::new(Mutex::new(MockStore::default()))),
        }
    }

    fn mock(&self) -> &Arc<Mutex<MockStore>> {
        match &self.backend {
            Backend::Mock(store) => store,
            Backend::Live(_) => panic!("mock accessors are only valid on a mock client"),
        }
    }

    /// Seed a raw document into the mock store.
    pub fn mock_seed(&self, collection: &str, id: &str, doc: Value) {
        let mut store = self.mock().lock().unwrap();
        store
            .docs
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
    }

    /// Number of write operations the mock store has received.
    pub fn mock_write_count(&self) -> usize {
        self.mock().lock().unwrap().writes.len()
    }

    pub fn mock_fail_writes(&self, fail: bool) {
        self.mock().lock().unwrap().fail_writes = fail;
    }

    pub fn mock_fail_queries(&self, fail: bool) {
        self.mock().lock().unwrap().fail_queries = fail;
    }

    pub fn mock_fail_counter_updates(&self, fail: bool) {
        self.mock().lock().unwrap().fail_counter_updates = fail;
    }

    // ─── Station Operations ──────────────────────────────────────

    /// Query raw station documents whose latitude falls inside a band.
    ///
    /// Only one field may carry inequality filters per query, so the
    /// store-side filter is the latitude range; longitude and exact radius
    /// are refined client-side.
    pub async fn query_stations_in_lat_band(
        &self,
        lat_min: f64,
        lat_max: f64,
    ) -> Result<Vec<Value>, AppError> {
        match &self.backend {
            Backend::Live(client) => client
                .fluent()
                .select()
                .from(collections::STATIONS)
                .filter(|q| {
                    q.for_all([
                        q.field("latitude").greater_than_or_equal(lat_min),
                        q.field("latitude").less_than_or_equal(lat_max),
                    ])
                })
                .obj::<Value>()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Mock(store) => {
                let store = store.lock().unwrap();
                if store.fail_queries {
                    return Err(AppError::Database("mock query failure".to_string()));
                }
                let docs = store
                    .docs
                    .get(collections::STATIONS)
                    .map(|col| {
                        col.values()
                            .filter(|doc| {
                                doc.get("latitude")
                                    .and_then(Value::as_f64)
                                    .is_some_and(|lat| lat >= lat_min && lat <= lat_max)
                            })
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(docs)
            }
        }
    }

    /// Get a raw station document by id.
    pub async fn get_station_doc(&self, station_id: &str) -> Result<Option<Value>, AppError> {
        match &self.backend {
            Backend::Live(client) => client
                .fluent()
                .select()
                .by_id_in(collections::STATIONS)
                .obj()
                .one(station_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Mock(store) => Ok(store
                .lock()
                .unwrap()
                .docs
                .get(collections::STATIONS)
                .and_then(|col| col.get(station_id))
                .cloned()),
        }
    }

    /// Write a station document.
    pub async fn set_station_doc(&self, station_id: &str, doc: &Value) -> Result<(), AppError> {
        match &self.backend {
            Backend::Live(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::STATIONS)
                    .document_id(station_id)
                    .object(doc)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                store.record_write(collections::STATIONS, station_id)?;
                store
                    .docs
                    .entry(collections::STATIONS.to_string())
                    .or_default()
                    .insert(station_id.to_string(), doc.clone());
                Ok(())
            }
        }
    }

    /// Update only the rating aggregate fields of a station document.
    pub async fn update_station_rating(
        &self,
        station_id: &str,
        average: Option<f64>,
        count: u32,
    ) -> Result<(), AppError> {
        let patch = serde_json::json!({
            "average_rating": average,
            "ratings_count": count,
        });
        match &self.backend {
            Backend::Live(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .fields(["average_rating", "ratings_count"])
                    .in_col(collections::STATIONS)
                    .document_id(station_id)
                    .object(&patch)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                store.record_write(collections::STATIONS, station_id)?;
                if let Some(doc) = store
                    .docs
                    .entry(collections::STATIONS.to_string())
                    .or_default()
                    .get_mut(station_id)
                    .and_then(Value::as_object_mut)
                {
                    doc.insert("average_rating".to_string(), serde_json::json!(average));
                    doc.insert("ratings_count".to_string(), serde_json::json!(count));
                }
                Ok(())
            }
        }
    }

    // ─── Review Operations ───────────────────────────────────────

    /// Get a review by id.
    pub async fn get_review(&self, review_id: &str) -> Result<Option<Review>, AppError> {
        match &self.backend {
            Backend::Live(client) => client
                .fluent()
                .select()
                .by_id_in(collections::REVIEWS)
                .obj()
                .one(review_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Mock(store) => {
                let store = store.lock().unwrap();
                let doc = store
                    .docs
                    .get(collections::REVIEWS)
                    .and_then(|col| col.get(review_id));
                match doc {
                    None => Ok(None),
                    Some(doc) => serde_json::from_value(doc.clone())
                        .map(Some)
                        .map_err(|e| AppError::Database(e.to_string())),
                }
            }
        }
    }

    /// Create or update a review.
    pub async fn set_review(&self, review: &Review) -> Result<(), AppError> {
        match &self.backend {
            Backend::Live(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::REVIEWS)
                    .document_id(&review.id)
                    .object(review)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                store.record_write(collections::REVIEWS, &review.id)?;
                let doc = serde_json::to_value(review)
                    .map_err(|e| AppError::Database(e.to_string()))?;
                store
                    .docs
                    .entry(collections::REVIEWS.to_string())
                    .or_default()
                    .insert(review.id.clone(), doc);
                Ok(())
            }
        }
    }

    /// Delete a review.
    pub async fn delete_review(&self, review_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Live(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::REVIEWS)
                    .document_id(review_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                store.record_write(collections::REVIEWS, review_id)?;
                if let Some(col) = store.docs.get_mut(collections::REVIEWS) {
                    col.remove(review_id);
                }
                Ok(())
            }
        }
    }

    /// Get all reviews for a station, newest first.
    pub async fn get_reviews_for_station(
        &self,
        station_id: &str,
    ) -> Result<Vec<Review>, AppError> {
        match &self.backend {
            Backend::Live(client) => {
                let station_id = station_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::REVIEWS)
                    .filter(move |q| q.field("station_id").eq(station_id.clone()))
                    .order_by([(
                        "date_added",
                        firestore::FirestoreQueryDirection::Descending,
                    )])
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Mock(store) => {
                let store = store.lock().unwrap();
                let mut reviews: Vec<Review> = store
                    .docs
                    .get(collections::REVIEWS)
                    .map(|col| {
                        col.values()
                            .filter_map(|doc| serde_json::from_value::<Review>(doc.clone()).ok())
                            .filter(|r| r.station_id == station_id)
                            .collect()
                    })
                    .unwrap_or_default();
                reviews.sort_by(|a, b| b.date_added.cmp(&a.date_added));
                Ok(reviews)
            }
        }
    }

    /// Record a helpful mark: increment the counter and union the user id
    /// into the marker set. The caller has already enforced the marking
    /// rules against a fresh read of the review.
    pub async fn mark_review_helpful(
        &self,
        review_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Live(client) => {
                let mut transaction = client
                    .begin_transaction()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                client
                    .fluent()
                    .update()
                    .in_col(collections::REVIEWS)
                    .document_id(review_id)
                    .transforms(|t| {
                        t.fields([
                            t.field("helpful_count").increment(1),
                            t.field("helpful_user_ids")
                                .append_missing_elements([user_id.to_string()]),
                        ])
                    })
                    .only_transform()
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| AppError::Database(e.to_string()))?;
                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                store.record_write(collections::REVIEWS, review_id)?;
                if let Some(doc) = store
                    .docs
                    .entry(collections::REVIEWS.to_string())
                    .or_default()
                    .get_mut(review_id)
                    .and_then(Value::as_object_mut)
                {
                    let count = doc
                        .get("helpful_count")
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    doc.insert("helpful_count".to_string(), serde_json::json!(count + 1));
                    if let Some(ids) = doc
                        .entry("helpful_user_ids".to_string())
                        .or_insert_with(|| serde_json::json!([]))
                        .as_array_mut()
                    {
                        if !ids.iter().any(|v| v.as_str() == Some(user_id)) {
                            ids.push(serde_json::json!(user_id));
                        }
                    }
                }
                Ok(())
            }
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        match &self.backend {
            Backend::Live(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Mock(store) => {
                let store = store.lock().unwrap();
                let doc = store
                    .docs
                    .get(collections::USERS)
                    .and_then(|col| col.get(user_id));
                match doc {
                    None => Ok(None),
                    Some(doc) => serde_json::from_value(doc.clone())
                        .map(Some)
                        .map_err(|e| AppError::Database(e.to_string())),
                }
            }
        }
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user: &UserProfile) -> Result<(), AppError> {
        match &self.backend {
            Backend::Live(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&user.user_id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                store.record_write(collections::USERS, &user.user_id)?;
                let doc =
                    serde_json::to_value(user).map_err(|e| AppError::Database(e.to_string()))?;
                store
                    .docs
                    .entry(collections::USERS.to_string())
                    .or_default()
                    .insert(user.user_id.clone(), doc);
                Ok(())
            }
        }
    }

    /// Atomically increment the contributor's station and contribution
    /// counters.
    pub async fn increment_contribution_counters(&self, user_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Live(client) => {
                let mut transaction = client
                    .begin_transaction()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(user_id)
                    .transforms(|t| {
                        t.fields([
                            t.field("station_count").increment(1),
                            t.field("contribution_count").increment(1),
                        ])
                    })
                    .only_transform()
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| AppError::Database(e.to_string()))?;
                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                if store.fail_counter_updates {
                    return Err(AppError::Database("mock counter update failure".to_string()));
                }
                store.record_write(collections::USERS, user_id)?;
                if let Some(doc) = store
                    .docs
                    .entry(collections::USERS.to_string())
                    .or_default()
                    .get_mut(user_id)
                    .and_then(Value::as_object_mut)
                {
                    for key in ["station_count", "contribution_count"] {
                        let n = doc.get(key).and_then(Value::as_u64).unwrap_or(0);
                        doc.insert(key.to_string(), serde_json::json!(n + 1));
                    }
                }
                Ok(())
            }
        }
    }

    /// Add or remove a station from the user's favorites via atomic
    /// array-union / array-remove.
    pub async fn set_favorite(
        &self,
        user_id: &str,
        station_id: &str,
        favorite: bool,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Live(client) => {
                let mut transaction = client
                    .begin_transaction()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(user_id)
                    .transforms(|t| {
                        t.fields([if favorite {
                            t.field("favorite_station_ids")
                                .append_missing_elements([station_id.to_string()])
                        } else {
                            t.field("favorite_station_ids")
                                .remove_all_from_array([station_id.to_string()])
                        }])
                    })
                    .only_transform()
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| AppError::Database(e.to_string()))?;
                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Mock(store) => {
                let mut store = store.lock().unwrap();
                store.record_write(collections::USERS, user_id)?;
                if let Some(doc) = store
                    .docs
                    .entry(collections::USERS.to_string())
                    .or_default()
                    .get_mut(user_id)
                    .and_then(Value::as_object_mut)
                {
                    let ids = doc
                        .entry("favorite_station_ids".to_string())
                        .or_insert_with(|| serde_json::json!([]));
                    if let Some(ids) = ids.as_array_mut() {
                        ids.retain(|v| v.as_str() != Some(station_id));
                        if favorite {
                            ids.push(serde_json::json!(station_id));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
