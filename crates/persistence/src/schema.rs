//! Database schema definitions

/// SQL to create all tables
/// NOTE: member ids are stored through `encode_member_id` so that INTEGER order matches u64 order
pub const CREATE_TABLES: &str = r#"
-- One row per (board, member), ranks live in the in-process cache
CREATE TABLE IF NOT EXISTS leaderboard_members (
    board TEXT NOT NULL,
    member_id INTEGER NOT NULL,
    score INTEGER NOT NULL,
    PRIMARY KEY (board, member_id)
);

-- ========== INDEXES ==========

-- Rank order: score descending, member id ascending
CREATE INDEX IF NOT EXISTS idx_members_rank ON leaderboard_members(board, score DESC, member_id ASC)
"#;

/// Additive migrations, run after CREATE_TABLES on every start.
/// "duplicate column name" failures are expected once a migration has been applied.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE leaderboard_members ADD COLUMN updated_at INTEGER",
];
