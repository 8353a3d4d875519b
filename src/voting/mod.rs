pub mod ballot;
pub mod borda;
pub mod rating;

use crate::models::{Poll, PollKind, Vote};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Chart-ready results for one poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResult {
    pub poll_id: String,
    pub question: String,
    pub kind: PollKind,
    pub summary: String,
    pub unit: String,      // "votes" for rating, "pts" for ranking
    #[serde(rename = "chartData")]
    pub rows: Vec<ChartRow>,
}

// One bar of the chart; `total` is the shared denominator for every row of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub label: String,
    pub value: f64,        // vote count or Borda points, which can be fractional
    pub total: u64,
}

/// Aggregates the votes cast on one poll.
///
/// The caller is responsible for passing only votes that belong to `poll`.
/// Never fails: malformed vote values are ignored or counted as zero.
pub fn aggregate(poll: &Poll, votes: &[Vote]) -> PollResult {
    debug!(
        "Aggregating {} vote(s) for {} poll {}",
        votes.len(),
        poll.kind,
        poll.id
    );

    let (summary, rows) = match poll.kind {
        PollKind::Rating => rating::calculate_results(votes),
        PollKind::Ranking => borda::calculate_results(poll, votes),
    };

    PollResult {
        poll_id: poll.id.clone(),
        question: poll.question.clone(),
        kind: poll.kind,
        summary,
        unit: unit_for(poll.kind).to_string(),
        rows,
    }
}

/// Groups `votes` by poll id and aggregates every poll, in `polls` order.
/// Votes that reference none of `polls` are dropped.
pub fn aggregate_event(polls: &[Poll], votes: &[Vote]) -> Vec<PollResult> {
    let mut by_poll: HashMap<&str, Vec<Vote>> = polls
        .iter()
        .map(|poll| (poll.id.as_str(), Vec::new()))
        .collect();

    for vote in votes {
        if let Some(bucket) = by_poll.get_mut(vote.poll_id.as_str()) {
            bucket.push(vote.clone());
        }
    }

    polls
        .iter()
        .map(|poll| {
            let poll_votes = by_poll
                .get(poll.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            aggregate(poll, poll_votes)
        })
        .collect()
}

pub fn unit_for(kind: PollKind) -> &'static str {
    match kind {
        PollKind::Rating => "votes",
        PollKind::Ranking => "pts",
    }
}

/// Share of `total` as a whole percentage, rounding halves up. Zero when `total` is zero.
pub fn percentage(value: f64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (value / total as f64 * 100.0).round().max(0.0) as u64
}
