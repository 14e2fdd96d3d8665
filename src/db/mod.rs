//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const STATIONS: &str = "stations";
    pub const REVIEWS: &str = "reviews";
    pub const USERS: &str = "users";
}
