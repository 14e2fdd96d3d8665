//! User profile model and contribution badges.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore, keyed by the auth provider's opaque id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    /// May be None if not shared
    pub email: Option<String>,
    /// Number of stations this user has submitted
    #[serde(default)]
    pub station_count: u32,
    /// Stations plus reviews and other contributions
    #[serde(default)]
    pub contribution_count: u32,
    #[serde(default)]
    pub favorite_station_ids: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UserProfile {
    pub fn badge(&self) -> Option<Badge> {
        Badge::for_contributions(self.contribution_count)
    }
}

/// Contribution badge tiers, derived purely from the contribution count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    Droplet,
    Stream,
    River,
    Ocean,
}

impl Badge {
    pub fn for_contributions(count: u32) -> Option<Badge> {
        match count {
            0 => None,
            1..=9 => Some(Badge::Droplet),
            10..=24 => Some(Badge::Stream),
            25..=99 => Some(Badge::River),
            _ => Some(Badge::Ocean),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_tiers() {
        assert_eq!(Badge::for_contributions(0), None);
        assert_eq!(Badge::for_contributions(1), Some(Badge::Droplet));
        assert_eq!(Badge::for_contributions(10), Some(Badge::Stream));
        assert_eq!(Badge::for_contributions(25), Some(Badge::River));
        assert_eq!(Badge::for_contributions(100), Some(Badge::Ocean));
    }
}
