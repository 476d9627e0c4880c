//! In-process backend: one [`RankedStore`] per board

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::RankBackend;
use crate::error::BackendResult;
use crate::store::RankedStore;
use crate::types::{Member, MemberId, Rank, Score};

/// Boards held in memory for the lifetime of the backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    boards: RwLock<HashMap<String, Arc<RankedStore>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing store for `board`, if any member was ever written to it
    fn existing(&self, board: &str) -> Option<Arc<RankedStore>> {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(board)
            .cloned()
    }

    /// Store for `board`, created on first write
    fn store(&self, board: &str) -> Arc<RankedStore> {
        if let Some(store) = self.existing(board) {
            return store;
        }
        let mut boards = self.boards.write().unwrap_or_else(PoisonError::into_inner);
        boards
            .entry(board.to_string())
            .or_insert_with(|| {
                debug!(board, "Creating board");
                Arc::new(RankedStore::new())
            })
            .clone()
    }

    /// Names of boards created so far
    #[cfg(test)]
    fn boards(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl RankBackend for MemoryBackend {
    async fn upsert(&self, board: &str, id: MemberId, score: Score) -> BackendResult<Rank> {
        let rank = self.store(board).upsert(id, score);
        debug!(board, id, score, rank, "Member ranked");
        Ok(rank)
    }

    async fn remove(&self, board: &str, id: MemberId) -> BackendResult<Option<Member>> {
        let removed = self.existing(board).and_then(|store| store.remove(id));
        debug!(board, id, found = removed.is_some(), "Member removed");
        Ok(removed)
    }

    async fn rank_of(&self, board: &str, id: MemberId) -> BackendResult<Option<Rank>> {
        Ok(self.existing(board).and_then(|store| store.rank_of(id)))
    }

    async fn score_of(&self, board: &str, id: MemberId) -> BackendResult<Option<Score>> {
        Ok(self.existing(board).and_then(|store| store.score_of(id)))
    }

    async fn member(&self, board: &str, id: MemberId) -> BackendResult<Option<Member>> {
        Ok(self.existing(board).and_then(|store| store.member(id)))
    }

    async fn count(&self, board: &str) -> BackendResult<u64> {
        Ok(self.existing(board).map_or(0, |store| store.count()))
    }

    async fn range_by_rank(
        &self,
        board: &str,
        start: Rank,
        end: Rank,
    ) -> BackendResult<Vec<Member>> {
        Ok(self
            .existing(board)
            .map(|store| store.range_by_rank(start, end))
            .unwrap_or_default())
    }

    async fn leaders_page(
        &self,
        board: &str,
        page: u64,
        page_size: u64,
    ) -> BackendResult<Vec<Member>> {
        Ok(self
            .existing(board)
            .map(|store| store.leaders_page(page, page_size))
            .unwrap_or_default())
    }

    async fn around(
        &self,
        board: &str,
        id: MemberId,
        page_size: u64,
    ) -> BackendResult<Option<Vec<Member>>> {
        Ok(self
            .existing(board)
            .and_then(|store| store.around(id, page_size)))
    }

    async fn clear(&self, board: &str) -> BackendResult<()> {
        if let Some(store) = self.existing(board) {
            store.clear();
        }
        Ok(())
    }

    async fn clear_all(&self) -> BackendResult<()> {
        // Clear in place: a caller may still hold a board's store mid-write
        let stores: Vec<Arc<RankedStore>> = self
            .boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for store in stores {
            store.clear();
        }
        Ok(())
    }
}
