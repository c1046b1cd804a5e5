use chrono::{DateTime, NaiveDateTime, Utc};
use rocket::serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{LeaderboardError, LeaderboardResult};

pub type GameScore = i32;

pub const MAX_INITIALS: usize = 3;
pub const MIN_SCORE: GameScore = 0;
pub const MAX_SCORE: GameScore = 1_000_000;

/// A stored leaderboard row, as returned to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ScoreEntry {
    pub name: String,
    pub score: GameScore,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Reads an RFC 3339 timestamp. Timestamps without an offset, as a
/// `timestamp` (not `timestamptz`) column yields, are taken to be UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .or_else(|err| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|naive| naive.and_utc())
                .ok_or(err)
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(de::Error::custom)
}

/// Player initials that satisfy `^[A-Z0-9]{1,3}$`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(crate = "rocket::serde", transparent)]
pub struct Initials(String);

impl Initials {
    /// Normalizes `raw` and checks that something usable is left.
    pub fn parse(raw: &str) -> LeaderboardResult<Self> {
        let name = normalize_name(raw);
        if is_valid_name(&name) {
            Ok(Self(name))
        } else {
            Err(LeaderboardError::InvalidName)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated submission that has not reached the store yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NewScore {
    pub name: Initials,
    pub score: GameScore,
}

impl NewScore {
    pub fn new(name: Initials, score: GameScore) -> Self {
        Self { name, score }
    }

    pub fn into_entry(self, created_at: DateTime<Utc>) -> ScoreEntry {
        ScoreEntry {
            name: self.name.0,
            score: self.score,
            created_at,
        }
    }
}

/// Uppercases, drops everything outside `[A-Z0-9]` and keeps at most three characters.
pub fn normalize_name(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .take(MAX_INITIALS)
        .collect()
}

fn is_valid_name(name: &str) -> bool {
    (1..=MAX_INITIALS).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Truncates toward zero and clamps into `[MIN_SCORE, MAX_SCORE]`.
/// NaN and infinities count as non-numeric and become zero.
pub fn normalize_score(raw: f64) -> GameScore {
    if !raw.is_finite() {
        return MIN_SCORE;
    }
    raw.trunc()
        .clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as GameScore
}
