// SPDX-License-Identifier: MIT

//! Nearby-station query service.
//!
//! Handles the core retrieval workflow:
//! 1. Convert the search radius to a latitude/longitude bounding box
//! 2. Issue a latitude-band range query (the store allows inequality
//!    filters on only one field per query)
//! 3. Decode each returned document, skipping the undecodable ones
//! 4. Refine the box superset to an exact disk by great-circle distance
//!
//! A store failure aborts the whole call; an empty result after refinement
//! is a valid outcome ("no stations in range yet").

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::codec;
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::geo::{bounding_box, distance_miles};
use crate::models::{Coordinate, Station};

/// Service for finding stations within an exact radius of a center point.
#[derive(Clone)]
pub struct NearbyService {
    db: FirestoreDb,
}

impl NearbyService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Find all stations within `radius_miles` of `center`, sorted by
    /// distance ascending.
    pub async fn find_nearby(
        &self,
        center: Coordinate,
        radius_miles: f64,
    ) -> Result<Vec<Station>> {
        if !radius_miles.is_finite() || radius_miles < 0.0 {
            return Err(AppError::BadRequest(format!(
                "Invalid search radius: {}",
                radius_miles
            )));
        }

        let center_point = center.point();
        let bbox = bounding_box(center_point, radius_miles);

        let docs = self
            .db
            .query_stations_in_lat_band(bbox.lat_min, bbox.lat_max)
            .await?;
        let fetched = docs.len();

        let mut stations: Vec<(f64, Station)> = Vec::with_capacity(docs.len());
        for doc in &docs {
            let station = match codec::decode_station(doc) {
                Ok(station) => station,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable station document");
                    continue;
                }
            };
            // Non-draft stations always carry a coordinate, but a malformed
            // write must not take the whole batch down
            let Some(coordinate) = station.coordinate else {
                tracing::warn!(station_id = %station.id, "Station document has no coordinate");
                continue;
            };
            let point = coordinate.point();
            if !bbox.contains(point) {
                continue;
            }
            let distance = distance_miles(center_point, point);
            if distance <= radius_miles {
                stations.push((distance, station));
            }
        }

        stations.sort_by(|a, b| a.0.total_cmp(&b.0));

        tracing::debug!(
            fetched,
            returned = stations.len(),
            radius_miles,
            "Nearby query refined"
        );

        Ok(stations.into_iter().map(|(_, s)| s).collect())
    }
}

/// The viewport a nearby query was dispatched for.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub radius_miles: f64,
}

/// Session ids come from clients, so idle entries must not pile up forever.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(10 * 60);

struct SessionState {
    generation: u64,
    last_dispatched: Option<Viewport>,
    last_seen: Instant,
}

impl SessionState {
    fn new() -> Self {
        Self {
            generation: 0,
            last_dispatched: None,
            last_seen: Instant::now(),
        }
    }
}

/// Coalesces map-driven nearby queries to bound query volume.
///
/// Each viewport change waits out a fixed quiet period; a newer change for
/// the same session supersedes it. A change identical to the last dispatched
/// viewport is suppressed. Admitted queries receive a monotonic sequence
/// number so completions arriving out of order can be discarded instead of
/// overwriting newer results.
pub struct QueryGate {
    quiet_period: Duration,
    /// Sessions idle longer than this are evicted on the next admit
    session_ttl: Duration,
    sessions: DashMap<String, SessionState>,
    next_seq: AtomicU64,
    latest_dispatched: AtomicU64,
}

impl QueryGate {
    pub fn new(quiet_period: Duration) -> Self {
        Self::with_session_ttl(quiet_period, SESSION_IDLE_TTL)
    }

    /// The TTL must be much longer than the quiet period, or an in-flight
    /// admit can lose its own session entry mid-wait.
    pub fn with_session_ttl(quiet_period: Duration, session_ttl: Duration) -> Self {
        Self {
            quiet_period,
            session_ttl,
            sessions: DashMap::new(),
            next_seq: AtomicU64::new(0),
            latest_dispatched: AtomicU64::new(0),
        }
    }

    /// Wait out the quiet period and decide whether this viewport change
    /// should dispatch a query. Returns the sequence number to tag the
    /// query with, or `None` if the change was superseded or a duplicate.
    pub async fn admit(&self, session: &str, viewport: Viewport) -> Option<u64> {
        self.prune_idle();

        let generation = {
            let mut state = self
                .sessions
                .entry(session.to_string())
                .or_insert_with(SessionState::new);
            state.generation += 1;
            state.last_seen = Instant::now();
            state.generation
        };

        tokio::time::sleep(self.quiet_period).await;

        let mut state = self.sessions.get_mut(session)?;
        if state.generation != generation {
            // A newer viewport change arrived during the quiet period
            return None;
        }
        if state.last_dispatched.as_ref() == Some(&viewport) {
            tracing::debug!(session, "Suppressing duplicate nearby query");
            return None;
        }
        state.last_dispatched = Some(viewport);
        state.last_seen = Instant::now();

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest_dispatched.fetch_max(seq, Ordering::SeqCst);
        Some(seq)
    }

    /// Drop session entries that have not seen a viewport change within the
    /// TTL, so client-chosen session ids cannot grow the map without bound.
    fn prune_idle(&self) {
        self.sessions
            .retain(|_, state| state.last_seen.elapsed() < self.session_ttl);
    }

    /// Whether a completion with this sequence number has been overtaken by
    /// a newer dispatch and should be discarded.
    pub fn is_stale(&self, seq: u64) -> bool {
        seq < self.latest_dispatched.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(lat: f64, radius: f64) -> Viewport {
        Viewport {
            center: Coordinate::new(lat, -0.1278),
            radius_miles: radius,
        }
    }

    #[tokio::test]
    async fn test_single_trigger_is_admitted() {
        let gate = QueryGate::new(Duration::from_millis(10));
        let seq = gate.admit("s1", viewport(51.5, 1.0)).await;
        assert!(seq.is_some());
    }

    #[tokio::test]
    async fn test_rapid_changes_coalesce_to_the_newest() {
        let gate = std::sync::Arc::new(QueryGate::new(Duration::from_millis(50)));

        let older = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.admit("s1", viewport(51.5, 1.0)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let newer = gate.admit("s1", viewport(51.6, 1.0)).await;

        assert!(older.await.unwrap().is_none(), "older change should be superseded");
        assert!(newer.is_some(), "newest change should dispatch");
    }

    #[tokio::test]
    async fn test_duplicate_viewport_is_suppressed() {
        let gate = QueryGate::new(Duration::from_millis(5));
        let first = gate.admit("s1", viewport(51.5, 1.0)).await;
        let second = gate.admit("s1", viewport(51.5, 1.0)).await;
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let gate = QueryGate::new(Duration::from_millis(5));
        let a = gate.admit("a", viewport(51.5, 1.0)).await;
        let b = gate.admit("b", viewport(51.5, 1.0)).await;
        assert!(a.is_some());
        assert!(b.is_some());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let gate =
            QueryGate::with_session_ttl(Duration::from_millis(5), Duration::from_millis(20));

        gate.admit("old", viewport(51.5, 1.0)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        gate.admit("new", viewport(51.6, 1.0)).await;

        assert!(!gate.sessions.contains_key("old"), "idle session should be evicted");
        assert_eq!(gate.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_active_sessions_survive_pruning() {
        let gate =
            QueryGate::with_session_ttl(Duration::from_millis(5), Duration::from_secs(60));

        gate.admit("s1", viewport(51.5, 1.0)).await;
        gate.admit("s2", viewport(51.6, 1.0)).await;

        assert!(gate.sessions.contains_key("s1"));
        assert!(gate.sessions.contains_key("s2"));
    }

    #[tokio::test]
    async fn test_older_sequence_numbers_become_stale() {
        let gate = QueryGate::new(Duration::from_millis(5));
        let first = gate.admit("s1", viewport(51.5, 1.0)).await.unwrap();
        let second = gate.admit("s1", viewport(51.6, 1.0)).await.unwrap();
        assert!(gate.is_stale(first));
        assert!(!gate.is_stale(second));
    }
}
