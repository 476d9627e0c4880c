//! Leaderboard service — pagination, windows and member records over a backend
//!
//! A `Leaderboard` is one named board plus a fixed page size. It holds an
//! explicitly owned handle to a [`RankBackend`]; several leaderboards may
//! share one backend under different names.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::RankBackend;
use crate::error::{BackendError, LeaderboardError, LeaderboardResult};
use crate::pagination::{page_position, total_pages};
use crate::types::{LeaderboardConfig, Member, MemberId, Rank, Score};

pub struct Leaderboard {
    name: String,
    page_size: u64,
    backend: Arc<dyn RankBackend>,
}

impl std::fmt::Debug for Leaderboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Leaderboard")
            .field("name", &self.name)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl Leaderboard {
    /// Bind a board to a backend. Fails on an empty name or a zero page size.
    pub fn new(
        backend: Arc<dyn RankBackend>,
        config: LeaderboardConfig,
    ) -> LeaderboardResult<Self> {
        if config.page_size == 0 {
            return Err(LeaderboardError::InvalidArgument(
                "page size must be positive".to_string(),
            ));
        }
        if config.name.trim().is_empty() {
            return Err(LeaderboardError::InvalidArgument(
                "leaderboard name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name: config.name,
            page_size: config.page_size,
            backend,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Set a member's score and report where it landed.
    ///
    /// `LeaderboardError::Unconfirmed` means the score was written but the
    /// resulting rank could not be read back.
    pub async fn rank_member(&self, id: MemberId, score: Score) -> LeaderboardResult<Member> {
        match self.backend.upsert(&self.name, id, score).await {
            Ok(rank) => Ok(Member::new(id, score, rank)),
            Err(BackendError::Unconfirmed(reason)) => {
                warn!(board = %self.name, id, score, %reason, "Score written, rank unconfirmed");
                Err(LeaderboardError::Unconfirmed { id, reason })
            }
            Err(e) => {
                warn!(board = %self.name, id, score, error = %e, "Failed to rank member");
                Err(e.into())
            }
        }
    }

    pub async fn total_members(&self) -> LeaderboardResult<u64> {
        Ok(self.backend.count(&self.name).await?)
    }

    /// Remove a member, returning the score and rank it held just before.
    ///
    /// `LeaderboardError::Unconfirmed` means the member is gone but the rank
    /// it held could not be determined.
    pub async fn remove_member(&self, id: MemberId) -> LeaderboardResult<Option<Member>> {
        match self.backend.remove(&self.name, id).await {
            Ok(removed) => Ok(removed),
            Err(BackendError::Unconfirmed(reason)) => {
                warn!(board = %self.name, id, %reason, "Member removed, rank unconfirmed");
                Err(LeaderboardError::Unconfirmed { id, reason })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `ceil(total_members / page_size)`; an empty board has zero pages
    pub async fn total_pages(&self) -> LeaderboardResult<u64> {
        let count = self.total_members().await?;
        Ok(total_pages(count, self.page_size))
    }

    pub async fn get_member(&self, id: MemberId) -> LeaderboardResult<Option<Member>> {
        Ok(self.backend.member(&self.name, id).await?)
    }

    pub async fn get_rank(&self, id: MemberId) -> LeaderboardResult<Option<Rank>> {
        Ok(self.backend.rank_of(&self.name, id).await?)
    }

    pub async fn get_score(&self, id: MemberId) -> LeaderboardResult<Option<Score>> {
        Ok(self.backend.score_of(&self.name, id).await?)
    }

    /// One page of leaders. `page` is clamped into `[1, total_pages]`; an
    /// empty board returns an empty page for any `page`.
    pub async fn get_leaders(&self, page: u64) -> LeaderboardResult<Vec<Member>> {
        Ok(self
            .backend
            .leaders_page(&self.name, page, self.page_size)
            .await?)
    }

    /// Up to `page_size` members with `id` roughly in the middle.
    ///
    /// The window starts at `max(1, rank - page_size / 2)`; it is never
    /// shifted up at the bottom of the board, so it can come back short there.
    pub async fn get_around_me(&self, id: MemberId) -> LeaderboardResult<Vec<Member>> {
        self.backend
            .around(&self.name, id, self.page_size)
            .await?
            .ok_or(LeaderboardError::NotFound(id))
    }

    /// Member at absolute rank `position`.
    ///
    /// Resolved through the page that holds `position`; if the board changed
    /// between the count and the page fetch so that the entry no longer has
    /// that exact rank, the result is `None` rather than a neighbour.
    pub async fn get_member_by_rank(&self, position: Rank) -> LeaderboardResult<Option<Member>> {
        if position < 1 || position > self.total_members().await? {
            return Ok(None);
        }

        let (page, offset) = page_position(position, self.page_size);
        let leaders = self.get_leaders(page).await?;

        match leaders.get(offset) {
            Some(member) if member.rank == position => Ok(Some(*member)),
            other => {
                debug!(
                    board = %self.name,
                    position,
                    found_rank = ?other.map(|m| m.rank),
                    "Board changed during rank lookup"
                );
                Ok(None)
            }
        }
    }

    /// Members ranked `start..=end`, clamped to the board
    pub async fn members_in_range(
        &self,
        start: Rank,
        end: Rank,
    ) -> LeaderboardResult<Vec<Member>> {
        Ok(self.backend.range_by_rank(&self.name, start, end).await?)
    }

    /// Empty this board; the `Leaderboard` stays usable
    pub async fn clear(&self) -> LeaderboardResult<()> {
        Ok(self.backend.clear(&self.name).await?)
    }

    /// Empty every board on `backend`
    pub async fn clear_all(backend: &dyn RankBackend) -> LeaderboardResult<()> {
        Ok(backend.clear_all().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
