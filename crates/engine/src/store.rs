//! RankedStore — the in-memory order-statistics member store
//!
//! One `RwLock` guards the treap and the id → score index together, so every
//! mutation is serialized and every read (including composite reads through
//! [`RankedStore::snapshot`]) observes a single mutation-free state.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::pagination::{around_window, leaders_window};
use crate::tree::{OrderStatTree, SortKey};
use crate::types::{Member, MemberId, Rank, Score};

#[derive(Debug, Default)]
struct StoreInner {
    tree: OrderStatTree,
    scores: HashMap<MemberId, Score>,
}

impl StoreInner {
    fn count(&self) -> u64 {
        self.scores.len() as u64
    }

    fn rank_of(&self, id: MemberId) -> Option<Rank> {
        let score = *self.scores.get(&id)?;
        self.tree
            .rank(&SortKey::new(id, score))
            .map(|position| position as Rank + 1)
    }

    fn member(&self, id: MemberId) -> Option<Member> {
        let score = *self.scores.get(&id)?;
        let rank = self.rank_of(id)?;
        Some(Member::new(id, score, rank))
    }

    fn member_at(&self, rank: Rank) -> Option<Member> {
        if rank == 0 || rank > self.count() {
            return None;
        }
        let key = self.tree.select((rank - 1) as usize)?;
        Some(Member::new(key.id(), key.score(), rank))
    }

    fn range_by_rank(&self, start: Rank, end: Rank) -> Vec<Member> {
        let start = start.max(1);
        let end = end.min(self.count());
        if start > end {
            return Vec::new();
        }
        // Both bounds are now within [1, count], which fits in usize
        let len = (end - start + 1) as usize;
        self.tree
            .iter_from((start - 1) as usize)
            .take(len)
            .zip(start..)
            .map(|(key, rank)| Member::new(key.id(), key.score(), rank))
            .collect()
    }
}

/// Thread-safe ranked member store
#[derive(Debug, Default)]
pub struct RankedStore {
    inner: RwLock<StoreInner>,
}

impl RankedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with deterministic treap priorities
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                tree: OrderStatTree::with_seed(seed),
                scores: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or move a member; returns its rank after the write.
    pub fn upsert(&self, id: MemberId, score: Score) -> Rank {
        let mut inner = self.write();
        let key = SortKey::new(id, score);
        if let Some(previous) = inner.scores.insert(id, score) {
            if previous != score {
                inner.tree.remove(&SortKey::new(id, previous));
            }
        }
        inner.tree.insert(key);
        // The key was inserted under this same guard
        inner
            .tree
            .rank(&key)
            .map_or(inner.count(), |position| position as Rank + 1)
    }

    /// Remove a member, returning the score and rank it held just before removal.
    pub fn remove(&self, id: MemberId) -> Option<Member> {
        let mut inner = self.write();
        let removed = inner.member(id)?;
        inner.scores.remove(&id);
        inner.tree.remove(&SortKey::new(id, removed.score));
        Some(removed)
    }

    pub fn rank_of(&self, id: MemberId) -> Option<Rank> {
        self.read().rank_of(id)
    }

    pub fn score_of(&self, id: MemberId) -> Option<Score> {
        self.read().scores.get(&id).copied()
    }

    /// Rank and score read under one lock
    pub fn member(&self, id: MemberId) -> Option<Member> {
        self.read().member(id)
    }

    pub fn count(&self) -> u64 {
        self.read().count()
    }

    /// Members ranked `start..=end`, clamped to `[1, count]`
    pub fn range_by_rank(&self, start: Rank, end: Rank) -> Vec<Member> {
        self.read().range_by_rank(start, end)
    }

    pub fn clear(&self) {
        let mut inner = self.write();
        inner.tree.clear();
        inner.scores.clear();
    }

    /// Replace the whole contents in one step; readers see the old set or
    /// the new one, never a mix. Later duplicates of an id win.
    pub fn reset(&self, members: impl IntoIterator<Item = (MemberId, Score)>) {
        let mut fresh = StoreInner::default();
        for (id, score) in members {
            if let Some(previous) = fresh.scores.insert(id, score) {
                fresh.tree.remove(&SortKey::new(id, previous));
            }
            fresh.tree.insert(SortKey::new(id, score));
        }
        *self.write() = fresh;
    }

    /// One page of leaders, count and range read together.
    /// See [`leaders_window`].
    pub fn leaders_page(&self, page: u64, page_size: u64) -> Vec<Member> {
        let snapshot = self.snapshot();
        leaders_window(snapshot.count(), page, page_size)
            .map(|window| snapshot.range_by_rank(window.start, window.end))
            .unwrap_or_default()
    }

    /// Window around `id`, rank and range read together; `None` if absent.
    /// See [`around_window`].
    pub fn around(&self, id: MemberId, page_size: u64) -> Option<Vec<Member>> {
        let snapshot = self.snapshot();
        let rank = snapshot.rank_of(id)?;
        let window = around_window(rank, page_size);
        Some(snapshot.range_by_rank(window.start, window.end))
    }

    /// Hold the read lock for a composite query.
    ///
    /// Mutations block until the snapshot is dropped; keep it short and
    /// never hold it across an `.await`.
    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot { inner: self.read() }
    }
}

/// A consistent read view of a [`RankedStore`]
pub struct StoreSnapshot<'a> {
    inner: RwLockReadGuard<'a, StoreInner>,
}

impl StoreSnapshot<'_> {
    pub fn count(&self) -> u64 {
        self.inner.count()
    }

    pub fn rank_of(&self, id: MemberId) -> Option<Rank> {
        self.inner.rank_of(id)
    }

    pub fn score_of(&self, id: MemberId) -> Option<Score> {
        self.inner.scores.get(&id).copied()
    }

    pub fn member(&self, id: MemberId) -> Option<Member> {
        self.inner.member(id)
    }

    /// Member holding absolute position `rank`
    pub fn member_at(&self, rank: Rank) -> Option<Member> {
        self.inner.member_at(rank)
    }

    pub fn range_by_rank(&self, start: Rank, end: Rank) -> Vec<Member> {
        self.inner.range_by_rank(start, end)
    }
}
