//! Error taxonomy for the ranking engine

use persistence::DbError;
use thiserror::Error;

use crate::types::MemberId;

/// Failures raised by a [`RankBackend`](crate::backend::RankBackend)
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The mutation was applied but its result could not be read back
    #[error("write applied but not confirmed: {0}")]
    Unconfirmed(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Failures returned by [`Leaderboard`](crate::leaderboard::Leaderboard).
///
/// A member that simply is not on the board is `Ok(None)` wherever the
/// operation can express it; `NotFound` is only used where a result cannot
/// exist without the member.
#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("member {0} not found")]
    NotFound(MemberId),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] BackendError),

    /// Partial failure: the write is durable, the rank was not confirmed
    #[error("member {id} was changed but its rank could not be confirmed: {reason}")]
    Unconfirmed { id: MemberId, reason: String },
}

impl From<BackendError> for LeaderboardError {
    fn from(err: BackendError) -> Self {
        Self::BackendUnavailable(err)
    }
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
