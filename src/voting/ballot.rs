//! Checks a participant's answers before they are submitted.
//!
//! The aggregator tolerates anything; these checks are what the vote form
//! enforces so that well-behaved clients only ever store complete ballots.

use crate::models::{Poll, PollKind, VoteValue};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

#[derive(Debug, Error, PartialEq)]
pub enum BallotError {
    #[error("Please ensure all options have a unique ranking for: \"{question}\"")]
    DuplicateRank { question: String },
    #[error("Please rank all options for: \"{question}\"")]
    IncompleteRanking { question: String },
    #[error("Rank for option {option_id} must be a whole number from 1 to {max} for: \"{question}\"")]
    RankOutOfRange {
        question: String,
        option_id: String,
        max: usize,
    },
    #[error("Unknown option {option_id} for: \"{question}\"")]
    UnknownOption { question: String, option_id: String },
    #[error("Please pick between 1 and 5 stars for: \"{question}\"")]
    InvalidRating { question: String },
    #[error("Answer does not match the {kind} poll: \"{question}\"")]
    WrongShape { question: String, kind: PollKind },
    #[error("Poll {0} is answered more than once")]
    DuplicatePoll(String),
    #[error("Not a valid email address: {0}")]
    InvalidEmail(String),
}

pub fn validate_answer(poll: &Poll, value: &VoteValue) -> Result<(), BallotError> {
    match (poll.kind, value) {
        (PollKind::Rating, VoteValue::Rating(stars)) => match stars {
            Some(s) if s.fract() == 0.0 && (1.0..=5.0).contains(s) => Ok(()),
            _ => Err(BallotError::InvalidRating {
                question: poll.question.clone(),
            }),
        },
        (PollKind::Ranking, VoteValue::Ranking(ranks)) => validate_ranking(poll, ranks),
        (kind, _) => Err(BallotError::WrongShape {
            question: poll.question.clone(),
            kind,
        }),
    }
}

fn validate_ranking(poll: &Poll, ranks: &[(String, Option<f64>)]) -> Result<(), BallotError> {
    let max = poll.options.len();
    let mut seen_ranks = HashSet::new();
    let mut seen_options = HashSet::new();

    for (option_id, rank) in ranks {
        if poll.option(option_id).is_none() {
            return Err(BallotError::UnknownOption {
                question: poll.question.clone(),
                option_id: option_id.clone(),
            });
        }

        let rank = match rank {
            Some(r) if r.fract() == 0.0 && *r >= 1.0 && *r <= max as f64 => *r as u64,
            _ => {
                return Err(BallotError::RankOutOfRange {
                    question: poll.question.clone(),
                    option_id: option_id.clone(),
                    max,
                });
            }
        };

        if !seen_ranks.insert(rank) {
            return Err(BallotError::DuplicateRank {
                question: poll.question.clone(),
            });
        }
        seen_options.insert(option_id.as_str());
    }

    if seen_options.len() != max {
        return Err(BallotError::IncompleteRanking {
            question: poll.question.clone(),
        });
    }

    Ok(())
}

pub fn validate_voter_email(email: &str) -> Result<(), BallotError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(BallotError::InvalidEmail(email.to_string()))
    }
}
