// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod drafts;
pub mod filter;
pub mod nearby;
pub mod reviews;
pub mod storage;
pub mod submission;

pub use drafts::{DraftStore, Settings, SettingsStore};
pub use filter::{filter_stations, StationFilters};
pub use nearby::{NearbyService, QueryGate, Viewport};
pub use reviews::ReviewService;
pub use storage::StorageBucket;
pub use submission::{StationSubmission, SubmissionReceipt, SubmissionService};
