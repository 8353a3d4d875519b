use crate::config::Config;
use crate::error::{Result, TallyError};
use crate::models::{Event, Poll, PollKind, PollOption, Vote, VoteValue};
use crate::voting::ballot::{validate_answer, validate_voter_email, BallotError};
use chrono::{DateTime, Utc};
use log::{info, warn};
use sqlx::sqlite::{
    SqliteConnection, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::collections::HashSet;
use std::str::FromStr;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &Config) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::init_schema(&pool).await?;
        info!("Connected to {}", config.database_url);

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                organizer_email TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                question TEXT NOT NULL,
                type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Option ids are only unique within their poll
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS poll_options (
                id TEXT NOT NULL,
                poll_id TEXT NOT NULL,
                text TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (poll_id, id),
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id TEXT PRIMARY KEY,
                poll_id TEXT NOT NULL,
                user_email TEXT,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn create_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, organizer_email, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.organizer_email)
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, organizer_email, created_at
            FROM events
            WHERE id = ?
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| TallyError::EventNotFound(event_id.to_string()))?;

        event_from_row(&row)
    }

    /// Events the user organizes followed by events they voted in, each listed once.
    pub async fn events_for_user(&self, user_email: &str) -> Result<Vec<Event>> {
        let user_email = user_email.trim();

        let organized = sqlx::query(
            r#"
            SELECT id, title, description, organizer_email, created_at
            FROM events
            WHERE organizer_email = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        let voted = sqlx::query(
            r#"
            SELECT DISTINCT e.id, e.title, e.description, e.organizer_email, e.created_at, e.rowid
            FROM events e
            JOIN polls p ON p.event_id = e.id
            JOIN votes v ON v.poll_id = p.id
            WHERE v.user_email = ?
            ORDER BY e.created_at, e.rowid
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for row in organized.iter().chain(voted.iter()) {
            let event = event_from_row(row)?;
            if seen.insert(event.id.clone()) {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Inserts the poll and its options together; a failed option insert leaves no poll behind.
    pub async fn create_poll(&self, poll: &Poll) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO polls (id, event_id, question, type, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&poll.id)
        .bind(&poll.event_id)
        .bind(&poll.question)
        .bind(poll.kind.as_str())
        .bind(poll.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for (i, option) in poll.options.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO poll_options (id, poll_id, text, position)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&option.id)
            .bind(&poll.id)
            .bind(&option.text)
            .bind(i as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_poll(&self, poll_id: &str) -> Result<Poll> {
        let row = sqlx::query(
            r#"
            SELECT id, event_id, question, type, created_at
            FROM polls
            WHERE id = ?
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| TallyError::PollNotFound(poll_id.to_string()))?;

        self.poll_from_row(&row).await
    }

    /// Polls of an event in creation order. Rows with an unknown type are skipped.
    pub async fn get_event_polls(&self, event_id: &str) -> Result<Vec<Poll>> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_id, question, type, created_at
            FROM polls
            WHERE event_id = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let mut polls = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.poll_from_row(row).await {
                Ok(poll) => polls.push(poll),
                Err(TallyError::UnknownPollType { poll_id, kind }) => {
                    warn!("Skipping poll {} with unknown type {:?}", poll_id, kind);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(polls)
    }

    async fn poll_from_row(&self, row: &SqliteRow) -> Result<Poll> {
        let id: String = row.get("id");
        let kind_str: String = row.get("type");
        let kind = PollKind::from_str(&kind_str).map_err(|_| TallyError::UnknownPollType {
            poll_id: id.clone(),
            kind: kind_str.clone(),
        })?;

        let options = sqlx::query(
            r#"
            SELECT id, text
            FROM poll_options
            WHERE poll_id = ?
            ORDER BY position
            "#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| PollOption {
            id: row.get::<String, _>("id"),
            text: row.get::<String, _>("text"),
        })
        .collect();

        Ok(Poll {
            id,
            event_id: row.get("event_id"),
            question: row.get("question"),
            kind,
            options,
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        })
    }

    pub async fn insert_vote(&self, vote: &Vote) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_vote_row(&mut conn, vote).await
    }

    /// Votes cast on `polls`, with each payload interpreted against its poll's type.
    pub async fn get_votes_for_polls(&self, polls: &[Poll]) -> Result<Vec<Vote>> {
        let mut votes = Vec::new();

        for poll in polls {
            let rows = sqlx::query(
                r#"
                SELECT id, poll_id, user_email, value, created_at
                FROM votes
                WHERE poll_id = ?
                ORDER BY created_at, rowid
                "#,
            )
            .bind(&poll.id)
            .fetch_all(&self.pool)
            .await?;

            for row in rows {
                votes.push(vote_from_row(&row, poll.kind)?);
            }
        }

        Ok(votes)
    }

    pub async fn has_voted(&self, poll_ids: &[&str], user_email: &str) -> Result<bool> {
        for poll_id in poll_ids {
            let existing = sqlx::query(
                r#"
                SELECT id
                FROM votes
                WHERE poll_id = ? AND user_email = ?
                LIMIT 1
                "#,
            )
            .bind(*poll_id)
            .bind(user_email)
            .fetch_optional(&self.pool)
            .await?;

            if existing.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Stores one participant's answers for an event.
    ///
    /// Every answer is validated against its poll first and the votes are
    /// written in one transaction. The duplicate check runs before that
    /// transaction, so two concurrent submissions from the same voter can
    /// both pass it.
    pub async fn submit_ballot(
        &self,
        event_id: &str,
        voter_email: &str,
        answers: &[(String, VoteValue)],
    ) -> Result<Vec<Vote>> {
        let voter_email = voter_email.trim();
        validate_voter_email(voter_email)?;

        let polls = self.get_event_polls(event_id).await?;
        let mut answered = HashSet::new();
        for (poll_id, value) in answers {
            if !answered.insert(poll_id.as_str()) {
                return Err(BallotError::DuplicatePoll(poll_id.clone()).into());
            }
            let poll = polls
                .iter()
                .find(|poll| poll.id == *poll_id)
                .ok_or_else(|| TallyError::PollNotFound(poll_id.clone()))?;
            validate_answer(poll, value)?;
        }

        let poll_ids: Vec<&str> = answers.iter().map(|(poll_id, _)| poll_id.as_str()).collect();
        if self.has_voted(&poll_ids, voter_email).await? {
            info!("Rejected repeat ballot from {} for event {}", voter_email, event_id);
            return Err(TallyError::AlreadyVoted);
        }

        let mut tx = self.pool.begin().await?;
        let mut votes = Vec::with_capacity(answers.len());
        for (poll_id, value) in answers {
            let vote = Vote::new(poll_id.clone(), Some(voter_email.to_string()), value.clone());
            insert_vote_row(&mut tx, &vote).await?;
            votes.push(vote);
        }
        tx.commit().await?;

        info!("Stored {} vote(s) for event {}", votes.len(), event_id);
        Ok(votes)
    }
}

async fn insert_vote_row(conn: &mut SqliteConnection, vote: &Vote) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO votes (id, poll_id, user_email, value, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&vote.id)
    .bind(&vote.poll_id)
    .bind(vote.user_email.as_deref())
    .bind(serde_json::to_string(&vote.value.to_json())?)
    .bind(vote.created_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    Ok(Event {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        organizer_email: row.get("organizer_email"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn vote_from_row(row: &SqliteRow, kind: PollKind) -> Result<Vote> {
    let id: String = row.get("id");
    let raw: String = row.get("value");

    // Unreadable payloads still count as a vote, just not a numeric one
    let value = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(json) => VoteValue::interpret(kind, &json),
        Err(e) => {
            warn!("Unparseable value on vote {}: {}", id, e);
            VoteValue::interpret(kind, &serde_json::Value::Null)
        }
    };

    Ok(Vote {
        id,
        poll_id: row.get("poll_id"),
        user_email: row.get("user_email"),
        value,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TallyError::InvalidRecord(format!("Failed to parse timestamp {raw:?}: {e}")))
}
