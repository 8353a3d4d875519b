use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub organizer_email: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(title: String, description: String, organizer_email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            organizer_email,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub event_id: String,
    pub question: String,
    pub kind: PollKind,
    /// Canonical (creation) order. Empty for rating polls.
    pub options: Vec<PollOption>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollKind {
    Rating,
    Ranking,
}

impl PollKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollKind::Rating => "rating",
            PollKind::Ranking => "ranking",
        }
    }
}

impl fmt::Display for PollKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(PollKind::Rating),
            "ranking" => Ok(PollKind::Ranking),
            other => Err(format!("Unknown poll type: {}", other)),
        }
    }
}

impl Poll {
    pub fn rating(event_id: String, question: String) -> Self {
        Self::with_options(event_id, question, PollKind::Rating, Vec::new())
    }

    /// Blank option texts are dropped; survivors are numbered "0", "1", ... in order.
    pub fn ranking(event_id: String, question: String, option_texts: Vec<String>) -> Self {
        let options = option_texts
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .enumerate()
            .map(|(idx, text)| PollOption {
                id: idx.to_string(),
                text,
            })
            .collect();

        Self::with_options(event_id, question, PollKind::Ranking, options)
    }

    fn with_options(
        event_id: String,
        question: String,
        kind: PollKind,
        options: Vec<PollOption>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            question,
            kind,
            options,
            created_at: Utc::now(),
        }
    }

    /// Splits pasted text into option texts, one per non-empty line.
    pub fn options_from_text(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub poll_id: String,
    pub user_email: Option<String>,
    pub value: VoteValue,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(poll_id: String, user_email: Option<String>, value: VoteValue) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            poll_id,
            user_email,
            value,
            created_at: Utc::now(),
        }
    }
}

/// A vote payload, interpreted against the type of the poll it was cast on.
///
/// Numeric fields are `None` when the stored payload held something that
/// does not coerce to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum VoteValue {
    Rating(Option<f64>),
    /// `(option id, rank)` pairs in payload order.
    Ranking(Vec<(String, Option<f64>)>),
}

impl VoteValue {
    pub fn rating(stars: i64) -> Self {
        VoteValue::Rating(Some(stars as f64))
    }

    pub fn ranking<I, S>(ranks: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        VoteValue::Ranking(
            ranks
                .into_iter()
                .map(|(option_id, rank)| (option_id.into(), Some(rank as f64)))
                .collect(),
        )
    }

    /// Turns a raw stored payload into the shape the poll type expects.
    ///
    /// A ranking payload that is not a JSON object has no entries. A rating
    /// payload that does not coerce to a number is `Rating(None)`.
    pub fn interpret(kind: PollKind, raw: &Value) -> Self {
        match kind {
            PollKind::Rating => VoteValue::Rating(coerce_number(raw)),
            PollKind::Ranking => match raw {
                Value::Object(map) => VoteValue::Ranking(
                    map.iter()
                        .map(|(option_id, rank)| (option_id.clone(), coerce_number(rank)))
                        .collect(),
                ),
                _ => VoteValue::Ranking(Vec::new()),
            },
        }
    }

    /// The payload as it is stored: a bare number for ratings, an
    /// `{option_id: rank}` object for rankings.
    pub fn to_json(&self) -> Value {
        match self {
            VoteValue::Rating(stars) => number_to_json(*stars),
            VoteValue::Ranking(ranks) => Value::Object(
                ranks
                    .iter()
                    .map(|(option_id, rank)| (option_id.clone(), number_to_json(*rank)))
                    .collect(),
            ),
        }
    }
}

/// Permissive numeric coercion: numbers as-is, strings trimmed and parsed
/// (an empty string is zero). Everything else is non-numeric.
pub fn coerce_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
        _ => None,
    }
}

fn number_to_json(value: Option<f64>) -> Value {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Value::from(v as i64),
        Some(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        None => Value::Null,
    }
}
