use crate::voting::ballot::BallotError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TallyError>;

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("event not found: {0}")]
    EventNotFound(String),
    #[error("poll not found: {0}")]
    PollNotFound(String),
    #[error("unknown poll type {kind:?} on poll {poll_id}")]
    UnknownPollType { poll_id: String, kind: String },
    #[error("invalid stored data: {0}")]
    InvalidRecord(String),
    #[error(transparent)]
    Ballot(#[from] BallotError),
    #[error("You have already voted for this event.")]
    AlreadyVoted,
}
