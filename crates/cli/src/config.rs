//! Runtime settings for the rankboard CLI.
//!
//! Resolved in order: CLI flag, environment variable (a `.env` file is loaded
//! first), built-in default.

use anyhow::{bail, Context, Result};
use engine::{DatabaseSettings, LeaderboardConfig};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "RANKBOARD_DB_PATH";
pub const BOARD_VAR: &str = "RANKBOARD_BOARD";
pub const PAGE_SIZE_VAR: &str = "RANKBOARD_PAGE_SIZE";

const DEFAULT_DB_PATH: &str = "data/rankboard.db";
const DEFAULT_BOARD: &str = "global";
const DEFAULT_PAGE_SIZE: u64 = 25;

/// Flag values; `None` falls back to the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub board: Option<String>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub board: String,
    pub page_size: u64,
}

impl Settings {
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// `lookup` stands in for the process environment
    pub fn resolve_with(
        overrides: Overrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let db_path = overrides
            .db_path
            .or_else(|| lookup(DB_PATH_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let board = overrides
            .board
            .or_else(|| lookup(BOARD_VAR))
            .unwrap_or_else(|| DEFAULT_BOARD.to_string());

        let page_size = match overrides.page_size {
            Some(size) => size,
            None => match lookup(PAGE_SIZE_VAR) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{PAGE_SIZE_VAR} is not a number: {raw:?}"))?,
                None => DEFAULT_PAGE_SIZE,
            },
        };
        if page_size == 0 {
            bail!("page size must be positive");
        }

        Ok(Self {
            db_path,
            board,
            page_size,
        })
    }

    pub fn database(&self) -> DatabaseSettings {
        DatabaseSettings::new(&self.db_path)
    }

    pub fn leaderboard(&self) -> LeaderboardConfig {
        LeaderboardConfig::new(&self.board, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve_with(Overrides::default(), env(&[])).unwrap();
        assert_eq!(settings.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(settings.board, "global");
        assert_eq!(settings.page_size, 25);
    }

    #[test]
    fn test_flags_beat_env() {
        let lookup = env(&[(BOARD_VAR, "weekly"), (PAGE_SIZE_VAR, "10")]);
        let overrides = Overrides {
            page_size: Some(3),
            ..Overrides::default()
        };
        let settings = Settings::resolve_with(overrides, lookup).unwrap();
        assert_eq!(settings.board, "weekly");
        assert_eq!(settings.page_size, 3);
        assert_eq!(settings.leaderboard(), LeaderboardConfig::new("weekly", 3));
    }

    #[test]
    fn test_bad_page_size() {
        for raw in ["ten", "0"] {
            let lookup = env(&[(PAGE_SIZE_VAR, raw)]);
            assert!(Settings::resolve_with(Overrides::default(), lookup).is_err());
        }
    }
}
