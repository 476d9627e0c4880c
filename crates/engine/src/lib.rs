//! Rankboard Engine — ranked member store and leaderboard service
//!
//! Provides:
//! - An order-statistic treap (`tree`) and the thread-safe `RankedStore` on top of it
//! - Page / window arithmetic shared by every backend (`pagination`)
//! - The `RankBackend` adapter trait with in-memory and SQLite implementations
//! - The `Leaderboard` service: pages, "around me", lookup by rank, mutations

pub mod backend;
pub mod error;
pub mod leaderboard;
pub mod pagination;
pub mod store;
pub mod tree;
pub mod types;

// Re-exports for convenience
pub use backend::{MemoryBackend, RankBackend, SqliteBackend};
pub use error::{BackendError, BackendResult, LeaderboardError, LeaderboardResult};
pub use leaderboard::Leaderboard;
pub use persistence::DatabaseSettings;
pub use store::{RankedStore, StoreSnapshot};
pub use types::*;
