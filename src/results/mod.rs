use crate::db::Database;
use crate::error::Result;
use crate::models::{Event, Poll, Vote};
use crate::voting::{aggregate_event, PollResult};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

// Where the results view gets its records from
#[async_trait]
pub trait PollSource: Send + Sync {
    async fn event(&self, event_id: &str) -> Result<Event>;
    async fn event_polls(&self, event_id: &str) -> Result<Vec<Poll>>;
    async fn votes_for(&self, polls: &[Poll]) -> Result<Vec<Vote>>;
}

#[async_trait]
impl PollSource for Database {
    async fn event(&self, event_id: &str) -> Result<Event> {
        self.get_event(event_id).await
    }

    async fn event_polls(&self, event_id: &str) -> Result<Vec<Poll>> {
        self.get_event_polls(event_id).await
    }

    async fn votes_for(&self, polls: &[Poll]) -> Result<Vec<Vote>> {
        self.get_votes_for_polls(polls).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResults {
    pub event: Event,
    pub results: Vec<PollResult>,
}

pub async fn load_event_results(source: &dyn PollSource, event_id: &str) -> Result<EventResults> {
    let event = source.event(event_id).await?;
    let polls = source.event_polls(event_id).await?;
    let votes = source.votes_for(&polls).await?;

    let results = aggregate_event(&polls, &votes);
    info!(
        "Computed results for {} poll(s) from {} vote(s) in event {}",
        results.len(),
        votes.len(),
        event_id
    );

    Ok(EventResults { event, results })
}
