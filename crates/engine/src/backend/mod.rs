//! Backend adapters — where the ordered sets actually live
//!
//! The leaderboard service talks to storage only through [`RankBackend`].
//! Every method is namespaced by board name. Methods that combine more than
//! one derived value (`member`, `leaders_page`, `around`, `remove`) must be
//! answered from one consistent state of the board.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::types::{Member, MemberId, Rank, Score};

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

#[async_trait]
pub trait RankBackend: Send + Sync {
    /// Insert or update a member's score; returns its rank after the write.
    async fn upsert(&self, board: &str, id: MemberId, score: Score) -> BackendResult<Rank>;

    /// Remove a member atomically, returning the snapshot it had just before.
    async fn remove(&self, board: &str, id: MemberId) -> BackendResult<Option<Member>>;

    async fn rank_of(&self, board: &str, id: MemberId) -> BackendResult<Option<Rank>>;

    async fn score_of(&self, board: &str, id: MemberId) -> BackendResult<Option<Score>>;

    /// Score and rank from a single snapshot
    async fn member(&self, board: &str, id: MemberId) -> BackendResult<Option<Member>>;

    async fn count(&self, board: &str) -> BackendResult<u64>;

    /// Inclusive, 1-based, clamped to the board; descending-score order.
    async fn range_by_rank(&self, board: &str, start: Rank, end: Rank)
        -> BackendResult<Vec<Member>>;

    /// One page of leaders: count, page clamp and range from a single snapshot.
    /// See [`crate::pagination::leaders_window`].
    async fn leaders_page(&self, board: &str, page: u64, page_size: u64)
        -> BackendResult<Vec<Member>>;

    /// Window around a member: rank and range from a single snapshot.
    /// `None` when the member is not on the board.
    /// See [`crate::pagination::around_window`].
    async fn around(&self, board: &str, id: MemberId, page_size: u64)
        -> BackendResult<Option<Vec<Member>>>;

    /// Empty one board
    async fn clear(&self, board: &str) -> BackendResult<()>;

    /// Empty every board held by this backend
    async fn clear_all(&self) -> BackendResult<()>;
}
