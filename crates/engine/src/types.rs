//! Types shared by the ranked store, the backends and the leaderboard service

use serde::{Deserialize, Serialize};

/// Member identity, unique within one board
pub type MemberId = u64;

/// Scores span the full i64 range; none are rejected
pub type Score = i64;

/// 1-based position in descending-score order
pub type Rank = u64;

/// A detached snapshot of one member at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub score: Score,
    pub rank: Rank,
}

impl Member {
    pub fn new(id: MemberId, score: Score, rank: Rank) -> Self {
        Self { id, score, rank }
    }
}

/// Per-leaderboard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Board name; the namespace inside the backend
    pub name: String,
    /// Entries per page (must be positive)
    pub page_size: u64,
}

impl LeaderboardConfig {
    pub fn new(name: impl Into<String>, page_size: u64) -> Self {
        Self {
            name: name.into(),
            page_size,
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            name: "global".to_string(),
            page_size: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_json_shape() {
        let json = serde_json::to_value(Member::new(7, -3, 2)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 7, "score": -3, "rank": 2 }));
    }

    #[test]
    fn test_config_from_json() {
        let config: LeaderboardConfig =
            serde_json::from_str(r#"{ "name": "weekly", "page_size": 10 }"#).unwrap();
        assert_eq!(config, LeaderboardConfig::new("weekly", 10));
        assert_eq!(LeaderboardConfig::default().page_size, 25);
    }
}
