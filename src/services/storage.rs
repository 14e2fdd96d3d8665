// SPDX-License-Identifier: MIT

//! Object storage client for station photos.
//!
//! Blobs are addressed by opaque storage paths, not URLs, so read access can
//! be brokered at display time. Uploads go through the GCS JSON API; for
//! local development set STORAGE_EMULATOR_HOST.

use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::error::AppError;

/// Upper bound for a single encoded photo. The client compresses before
/// submitting; anything larger is rejected instead of recompressed here.
pub const MAX_PHOTO_BYTES: usize = 4 * 1024 * 1024;

const GCS_BASE_URL: &str = "https://storage.googleapis.com";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Object storage bucket client.
#[derive(Clone)]
pub struct StorageBucket {
    backend: StorageBackend,
}

#[derive(Clone)]
enum StorageBackend {
    Live {
        http: reqwest::Client,
        bucket: String,
        base_url: String,
        /// Emulator connections skip authentication
        emulator: bool,
    },
    Mock(Arc<Mutex<MockBucket>>),
}

#[derive(Default)]
struct MockBucket {
    uploads: Vec<String>,
    fail_after: Option<usize>,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl StorageBucket {
    /// Create a client for the given bucket.
    pub fn new(bucket: &str) -> Self {
        let (base_url, emulator) = match std::env::var("STORAGE_EMULATOR_HOST") {
            Ok(host) => (host, true),
            Err(_) => (GCS_BASE_URL.to_string(), false),
        };
        if emulator {
            tracing::info!(bucket, base_url = %base_url, "Using storage emulator");
        }
        Self {
            backend: StorageBackend::Live {
                http: reqwest::Client::new(),
                bucket: bucket.to_string(),
                base_url,
                emulator,
            },
        }
    }

    /// Create an in-memory mock bucket for testing.
    pub fn new_mock() -> Self {
        Self {
            backend: StorageBackend::Mock(Arc::new(Mutex::new(MockBucket::default()))),
        }
    }

    fn mock(&self) -> &Arc<Mutex<MockBucket>> {
        match &self.backend {
            StorageBackend::Mock(bucket) => bucket,
            StorageBackend::Live { .. } => {
                panic!("mock accessors are only valid on a mock bucket")
            }
        }
    }

    /// Make the mock fail every upload after the first `n` have succeeded.
    pub fn mock_fail_after(&self, n: usize) {
        self.mock().lock().unwrap().fail_after = Some(n);
    }

    pub fn mock_upload_count(&self) -> usize {
        self.mock().lock().unwrap().uploads.len()
    }

    pub fn mock_uploaded_paths(&self) -> Vec<String> {
        self.mock().lock().unwrap().uploads.clone()
    }

    /// Upload a blob under `path` and return the storage path.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        match &self.backend {
            StorageBackend::Live {
                http,
                bucket,
                base_url,
                emulator,
            } => {
                let url = format!(
                    "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
                    base_url,
                    bucket,
                    urlencoding::encode(path)
                );

                let mut request = http
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(bytes);

                if !emulator {
                    let token = self.fetch_access_token(http).await?;
                    request = request.bearer_auth(token);
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("Photo upload failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Storage(format!(
                        "Photo upload failed with status {}: {}",
                        status, body
                    )));
                }

                tracing::debug!(path, "Photo uploaded");
                Ok(path.to_string())
            }
            StorageBackend::Mock(bucket) => {
                let mut bucket = bucket.lock().unwrap();
                if let Some(limit) = bucket.fail_after {
                    if bucket.uploads.len() >= limit {
                        return Err(AppError::Storage("mock upload failure".to_string()));
                    }
                }
                bucket.uploads.push(path.to_string());
                Ok(path.to_string())
            }
        }
    }

    /// Fetch an access token for the service account.
    ///
    /// GOOGLE_ACCESS_TOKEN overrides for local development; otherwise the
    /// GCE/Cloud Run metadata server supplies it.
    async fn fetch_access_token(&self, http: &reqwest::Client) -> Result<String, AppError> {
        if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            return Ok(token.trim().to_string());
        }

        let token: MetadataToken = http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to fetch access token: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Invalid metadata token response: {}", e)))?;

        Ok(token.access_token)
    }
}
