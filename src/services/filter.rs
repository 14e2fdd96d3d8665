// SPDX-License-Identifier: MIT

//! In-memory filter/projection layer for the loaded station set.

use std::collections::HashSet;

use crate::models::{Cost, LocationType, Station};

/// User-selected display filters.
///
/// The UI keeps at least one type and one cost selected; the filter itself
/// simply returns an empty list for empty selections rather than panicking.
#[derive(Debug, Clone)]
pub struct StationFilters {
    pub types: HashSet<LocationType>,
    pub costs: HashSet<Cost>,
    pub car_accessible_only: bool,
}

impl Default for StationFilters {
    fn default() -> Self {
        Self {
            types: LocationType::ALL.into_iter().collect(),
            costs: Cost::ALL.into_iter().collect(),
            car_accessible_only: false,
        }
    }
}

/// Narrow the loaded station set for display. Drafts never pass.
pub fn filter_stations(stations: &[Station], filters: &StationFilters) -> Vec<Station> {
    stations
        .iter()
        .filter(|s| {
            !s.is_draft
                && filters.types.contains(&s.location_type)
                && filters.costs.contains(&s.cost)
                && (!filters.car_accessible_only || s.is_car_accessible == Some(true))
        })
        .cloned()
        .collect()
}
