//! SQLite backend over the `persistence` crate
//!
//! SQLite holds the durable (member, score) rows. Ranks come from one
//! [`RankedStore`] per board, loaded from the database on first access and
//! kept in step by write-through: every write commits to SQLite first and is
//! then applied to the store while the board's writer lock is still held, so
//! the store sees writes in commit order.
//!
//! The backend assumes it is the only writer to its database file.

use async_trait::async_trait;
use persistence::repository::MemberRepository;
use persistence::{Database, DatabaseSettings};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::RankBackend;
use crate::error::{BackendError, BackendResult};
use crate::store::RankedStore;
use crate::types::{Member, MemberId, Rank, Score};

/// Cached ranks for one board
#[derive(Default)]
struct Board {
    store: RankedStore,
    loaded: AtomicBool,
    /// Serializes writes and loads of this board
    writer: Mutex<()>,
}

impl Board {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Release);
    }
}

/// Boards persisted in a SQLite database
pub struct SqliteBackend {
    db: Database,
    boards: StdRwLock<HashMap<String, Arc<Board>>>,
    /// Shared by single-board writes, exclusive for `clear_all`
    epoch: RwLock<()>,
}

impl SqliteBackend {
    /// Open (or create) the database described by `settings`
    pub async fn connect(settings: &DatabaseSettings) -> BackendResult<Self> {
        let db = Database::connect(settings)
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(Self::with_database(db))
    }

    /// Private in-memory database (for testing)
    pub async fn in_memory() -> BackendResult<Self> {
        let db = Database::in_memory()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(Self::with_database(db))
    }

    fn with_database(db: Database) -> Self {
        Self {
            db,
            boards: StdRwLock::new(HashMap::new()),
            epoch: RwLock::new(()),
        }
    }

    fn repo(&self) -> MemberRepository<'_> {
        MemberRepository::new(self.db.pool())
    }

    /// Close the underlying pool; later calls fail with `BackendError`
    pub async fn close(&self) {
        self.db.close().await;
        info!("SQLite backend closed");
    }

    fn ensure_open(&self) -> BackendResult<()> {
        if self.db.pool().is_closed() {
            return Err(BackendError::Unavailable("database is closed".to_string()));
        }
        Ok(())
    }

    /// Cache entry for `name`, created empty and unloaded
    fn board(&self, name: &str) -> Arc<Board> {
        if let Some(board) = self
            .boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return board.clone();
        }
        self.boards
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Replace the cached store with what SQLite holds. Caller holds `writer`.
    async fn load(&self, name: &str, board: &Board) -> BackendResult<()> {
        board.set_loaded(false);
        let rows = self.repo().load(name).await.inspect_err(|e| {
            warn!(board = name, error = %e, "Board load failed");
        })?;
        let members = rows.len();
        board
            .store
            .reset(rows.into_iter().map(|row| (row.member_id, row.score)));
        board.set_loaded(true);
        debug!(board = name, members, "Board loaded");
        Ok(())
    }

    /// Board ready to answer reads from its cache
    async fn readable(&self, name: &str) -> BackendResult<Arc<Board>> {
        self.ensure_open()?;
        let board = self.board(name);
        if !board.is_loaded() {
            let _writer = board.writer.lock().await;
            if !board.is_loaded() {
                self.load(name, &board).await?;
            }
        }
        Ok(board)
    }
}

#[async_trait]
impl RankBackend for SqliteBackend {
    async fn upsert(&self, name: &str, id: MemberId, score: Score) -> BackendResult<Rank> {
        self.ensure_open()?;
        let _epoch = self.epoch.read().await;
        let board = self.board(name);
        let _writer = board.writer.lock().await;
        if !board.is_loaded() {
            self.load(name, &board).await?;
        }

        self.repo()
            .upsert(name, id, score)
            .await
            .inspect_err(|e| warn!(board = name, id, error = %e, "Upsert failed"))?;
        let rank = board.store.upsert(id, score);
        debug!(board = name, id, score, rank, "Member ranked");
        Ok(rank)
    }

    async fn remove(&self, name: &str, id: MemberId) -> BackendResult<Option<Member>> {
        self.ensure_open()?;
        let _epoch = self.epoch.read().await;
        let board = self.board(name);
        let _writer = board.writer.lock().await;
        if !board.is_loaded() {
            self.load(name, &board).await?;
        }

        let stored = self
            .repo()
            .remove(name, id)
            .await
            .inspect_err(|e| warn!(board = name, id, error = %e, "Remove failed"))?;
        let cached = board.store.remove(id);

        match (stored, cached) {
            (None, None) => Ok(None),
            (Some(score), Some(member)) if member.score == score => {
                debug!(board = name, id, rank = member.rank, "Member removed");
                Ok(Some(member))
            }
            (stored, cached) => {
                warn!(
                    board = name,
                    id,
                    ?stored,
                    cached = ?cached.map(|m| m.score),
                    "Cached board disagreed with storage, reloading"
                );
                self.load(name, &board).await?;
                Err(BackendError::Unconfirmed(format!(
                    "cached rank for member {id} disagreed with storage"
                )))
            }
        }
    }

    async fn rank_of(&self, name: &str, id: MemberId) -> BackendResult<Option<Rank>> {
        Ok(self.readable(name).await?.store.rank_of(id))
    }

    async fn score_of(&self, name: &str, id: MemberId) -> BackendResult<Option<Score>> {
        Ok(self.readable(name).await?.store.score_of(id))
    }

    async fn member(&self, name: &str, id: MemberId) -> BackendResult<Option<Member>> {
        Ok(self.readable(name).await?.store.member(id))
    }

    async fn count(&self, name: &str) -> BackendResult<u64> {
        Ok(self.readable(name).await?.store.count())
    }

    async fn range_by_rank(
        &self,
        name: &str,
        start: Rank,
        end: Rank,
    ) -> BackendResult<Vec<Member>> {
        Ok(self.readable(name).await?.store.range_by_rank(start, end))
    }

    async fn leaders_page(
        &self,
        name: &str,
        page: u64,
        page_size: u64,
    ) -> BackendResult<Vec<Member>> {
        Ok(self.readable(name).await?.store.leaders_page(page, page_size))
    }

    async fn around(
        &self,
        name: &str,
        id: MemberId,
        page_size: u64,
    ) -> BackendResult<Option<Vec<Member>>> {
        Ok(self.readable(name).await?.store.around(id, page_size))
    }

    async fn clear(&self, name: &str) -> BackendResult<()> {
        self.ensure_open()?;
        let _epoch = self.epoch.read().await;
        let board = self.board(name);
        let _writer = board.writer.lock().await;

        let removed = self.repo().clear(name).await?;
        board.store.clear();
        board.set_loaded(true);
        info!(board = name, removed, "Board cleared");
        Ok(())
    }

    async fn clear_all(&self) -> BackendResult<()> {
        self.ensure_open()?;
        let _epoch = self.epoch.write().await;

        let removed = self.repo().clear_all().await?;
        // Listed after the delete: boards created later load an empty table
        let boards: Vec<Arc<Board>> = self
            .boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for board in boards {
            let _writer = board.writer.lock().await;
            board.store.clear();
            board.set_loaded(true);
        }
        info!(removed, "All boards cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeaderboardError;
    use crate::leaderboard::Leaderboard;
    use crate::types::LeaderboardConfig;

    /// Cached board contents against what SQLite holds
    async fn assert_cache_matches_storage(backend: &SqliteBackend, name: &str) {
        let cached: Vec<(MemberId, Score)> = backend
            .range_by_rank(name, 1, u64::MAX)
            .await
            .unwrap()
            .iter()
            .map(|m| (m.id, m.score))
            .collect();
        let stored: Vec<(MemberId, Score)> = backend
            .repo()
            .load(name)
            .await
            .unwrap()
            .iter()
            .map(|row| (row.member_id, row.score))
            .collect();
        assert_eq!(cached, stored);
    }

    #[tokio::test]
    async fn test_composite_reads() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        for id in 1..=5u64 {
            backend.upsert("b", id, id as Score * 10).await.unwrap();
        }

        let leaders = backend.leaders_page("b", 1, 2).await.unwrap();
        assert_eq!(leaders, vec![Member::new(5, 50, 1), Member::new(4, 40, 2)]);

        let window = backend.around("b", 1, 3).await.unwrap().unwrap();
        let ranks: Vec<Rank> = window.iter().map(|m| m.rank).collect();
        assert_eq!(ranks, vec![4, 5]);

        assert!(backend.around("b", 99, 3).await.unwrap().is_none());
        assert!(backend.leaders_page("empty", 1, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings::new(dir.path().join("boards.db"));

        let backend = SqliteBackend::connect(&settings).await.unwrap();
        backend.upsert("season", u64::MAX, -5).await.unwrap();
        backend.upsert("season", 0, -5).await.unwrap();
        backend.upsert("season", 7, 3).await.unwrap();
        backend.remove("season", 7).await.unwrap();
        backend.close().await;

        // Fresh process view: ranks are rebuilt from the stored rows
        let backend = SqliteBackend::connect(&settings).await.unwrap();
        assert_eq!(
            backend.member("season", u64::MAX).await.unwrap(),
            Some(Member::new(u64::MAX, -5, 2))
        );
        assert_eq!(backend.rank_of("season", 0).await.unwrap(), Some(1));
        assert_eq!(backend.count("season").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cache_tracks_writes() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        for id in 0..30u64 {
            backend.upsert("b", id, (id % 7) as Score).await.unwrap();
        }
        for id in (0..30u64).step_by(4) {
            let removed = backend.remove("b", id).await.unwrap().unwrap();
            assert_eq!(removed.score, (id % 7) as Score);
        }
        backend.upsert("b", 3, 100).await.unwrap();
        backend.upsert("other", 3, 1).await.unwrap();

        assert_eq!(backend.rank_of("b", 3).await.unwrap(), Some(1));
        assert_cache_matches_storage(&backend, "b").await;
        assert_cache_matches_storage(&backend, "other").await;

        backend.clear("other").await.unwrap();
        assert_cache_matches_storage(&backend, "other").await;
        backend.clear_all().await.unwrap();
        assert_eq!(backend.count("b").await.unwrap(), 0);
        assert_cache_matches_storage(&backend, "b").await;
    }

    #[tokio::test]
    async fn test_remove_reloads_a_drifted_cache() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        backend.upsert("b", 1, 10).await.unwrap();

        // Row written behind the cache's back
        backend.repo().upsert("b", 2, 20).await.unwrap();
        assert_eq!(backend.count("b").await.unwrap(), 1);

        let err = backend.remove("b", 2).await.unwrap_err();
        assert!(matches!(err, BackendError::Unconfirmed(_)));

        // Reloaded from storage: member 2 is gone everywhere
        assert_eq!(backend.count("b").await.unwrap(), 1);
        assert_eq!(backend.rank_of("b", 1).await.unwrap(), Some(1));
        assert_cache_matches_storage(&backend, "b").await;
    }

    #[tokio::test]
    async fn test_closed_pool_is_an_error() {
        let backend = SqliteBackend::in_memory().await.unwrap();
        backend.upsert("b", 1, 1).await.unwrap();
        backend.close().await;

        assert!(backend.count("b").await.is_err());
        assert!(backend.count("unloaded").await.is_err());
        assert!(backend.upsert("b", 2, 2).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings::new(dir.path().join("busy.db"));
        let backend: Arc<dyn RankBackend> =
            Arc::new(SqliteBackend::connect(&settings).await.unwrap());
        let lb = Arc::new(
            Leaderboard::new(backend.clone(), LeaderboardConfig::new("arena", 5)).unwrap(),
        );
        for id in 0..40u64 {
            lb.rank_member(id, id as Score).await.unwrap();
        }

        let mut handles = Vec::new();
        for worker in 0..3u64 {
            let lb = lb.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..120u64 {
                    let id = (worker * 11 + i) % 50;
                    if i % 4 == 0 {
                        lb.remove_member(id).await.unwrap();
                    } else {
                        lb.rank_member(id, ((i * 13) % 30) as Score).await.unwrap();
                    }
                }
            }));
        }
        for reader in 0..2u64 {
            let lb = lb.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..200u64 {
                    let position = (i + reader) % 40 + 1;
                    if let Some(member) = lb.get_member_by_rank(position).await.unwrap() {
                        assert_eq!(member.rank, position);
                    }

                    let id = (i * 7 + reader) % 50;
                    match lb.get_around_me(id).await {
                        Ok(window) => {
                            assert!(window.iter().any(|m| m.id == id));
                            for pair in window.windows(2) {
                                assert_eq!(pair[1].rank, pair[0].rank + 1);
                            }
                        }
                        Err(LeaderboardError::NotFound(missing)) => assert_eq!(missing, id),
                        Err(e) => panic!("around failed: {e}"),
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let all = lb.members_in_range(1, u64::MAX).await.unwrap();
        assert_eq!(all.len() as u64, lb.total_members().await.unwrap());
        for (i, member) in all.iter().enumerate() {
            assert_eq!(member.rank, i as Rank + 1);
        }
        drop(lb);
        drop(backend);

        // Everything the cache answered was committed
        let reopened = SqliteBackend::connect(&settings).await.unwrap();
        assert_eq!(reopened.range_by_rank("arena", 1, u64::MAX).await.unwrap(), all);
    }
}
