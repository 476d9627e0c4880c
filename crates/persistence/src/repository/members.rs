//! Member repository — durable ordered-set storage behind each leaderboard board
//!
//! Rank is never stored. Callers load a board once with [`MemberRepository::load`]
//! and keep ranks in memory; this layer only records scores.

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

const SIGN_BIT: u64 = 1 << 63;

const UPSERT_SQL: &str = r#"
    INSERT INTO leaderboard_members (board, member_id, score, updated_at)
    VALUES (?1, ?2, ?3, strftime('%s', 'now'))
    ON CONFLICT(board, member_id) DO UPDATE SET
        score = excluded.score,
        updated_at = excluded.updated_at
"#;

const LOAD_SQL: &str = r#"
    SELECT member_id, score FROM leaderboard_members
    WHERE board = ?1
    ORDER BY score DESC, member_id ASC
"#;

/// A stored (member, score) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMember {
    pub member_id: u64,
    pub score: i64,
}

/// Map a u64 member id onto SQLite's signed INTEGER, preserving order.
pub fn encode_member_id(id: u64) -> i64 {
    (id ^ SIGN_BIT) as i64
}

/// Inverse of [`encode_member_id`].
pub fn decode_member_id(raw: i64) -> u64 {
    (raw as u64) ^ SIGN_BIT
}

/// Repository for leaderboard members
pub struct MemberRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MemberRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a member's score
    pub async fn upsert(&self, board: &str, member_id: u64, score: i64) -> DbResult<()> {
        sqlx::query(UPSERT_SQL)
            .bind(board)
            .bind(encode_member_id(member_id))
            .bind(score)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Remove a member, returning the score it had
    pub async fn remove(&self, board: &str, member_id: u64) -> DbResult<Option<i64>> {
        let removed = sqlx::query_scalar(
            "DELETE FROM leaderboard_members WHERE board = ?1 AND member_id = ?2 RETURNING score",
        )
        .bind(board)
        .bind(encode_member_id(member_id))
        .fetch_optional(self.pool)
        .await?;
        Ok(removed)
    }

    /// Every member of one board, best first
    pub async fn load(&self, board: &str) -> DbResult<Vec<StoredMember>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(LOAD_SQL)
            .bind(board)
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(raw_id, score)| StoredMember {
                member_id: decode_member_id(raw_id),
                score,
            })
            .collect())
    }

    pub async fn count(&self, board: &str) -> DbResult<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM leaderboard_members WHERE board = ?1")
                .bind(board)
                .fetch_one(self.pool)
                .await?;
        Ok(total as u64)
    }

    /// Delete every member of one board, returning how many were removed
    pub async fn clear(&self, board: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM leaderboard_members WHERE board = ?1")
            .bind(board)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every member of every board
    pub async fn clear_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM leaderboard_members")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
