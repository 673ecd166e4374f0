//! Wire types for the score and session API, and a client over a pluggable
//! transport.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use client::*;

mod client;

pub const DEFAULT_API_BASE: &str = "https://api.george.richmond.gg";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Games that report scores.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    #[serde(rename = "2048")]
    Twenty48,
    #[serde(rename = "snake")]
    Snake,
    #[serde(rename = "sorting")]
    Sorting,
    #[serde(rename = "pathfinding")]
    Pathfinding,
}

impl GameId {
    pub const ALL: [GameId; 4] = [Self::Twenty48, Self::Snake, Self::Sorting, Self::Pathfinding];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twenty48 => "2048",
            Self::Snake => "snake",
            Self::Sorting => "sorting",
            Self::Pathfinding => "pathfinding",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Twenty48 => "2048",
            Self::Snake => "Snake",
            Self::Sorting => "Sorting Visualizer",
            Self::Pathfinding => "Pathfinding Visualizer",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub game: GameId,
    pub score: i64,
}

impl ScoreSubmission {
    pub fn new(game: GameId, score: i64) -> Self {
        Self { game, score }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(default)]
    pub game: Option<String>,
    pub username: String,
    pub score: i64,
    /// Server time, kept verbatim.
    #[serde(default)]
    pub timestamp: String,
}

impl ScoreEntry {
    /// Accepts RFC 3339 as well as offset-less ISO timestamps, read as UTC.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        if let Ok(time) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(time.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|time| time.and_utc())
    }

    /// Day of the score, or the raw timestamp when it can't be parsed.
    pub fn display_date(&self) -> String {
        self.parsed_timestamp()
            .map(|time| time.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| self.timestamp.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: Vec<ScoreEntry>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<ScoreEntry>, D::Error> {
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of a leaderboard. `page` counts from zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreQuery {
    pub game: GameId,
    pub page: u32,
    pub size: u32,
}

impl ScoreQuery {
    pub fn first_page(game: GameId) -> Self {
        Self {
            game,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self
        }
    }

    pub fn previous(self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            ..self
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiRequest {
    Me,
    Refresh,
    Logout,
    SubmitScore(ScoreSubmission),
    ScoresByGame(ScoreQuery),
}

impl ApiRequest {
    pub fn method(&self) -> Method {
        match self {
            Self::Me | Self::ScoresByGame(_) => Method::Get,
            Self::Refresh | Self::Logout | Self::SubmitScore(_) => Method::Post,
        }
    }

    /// Path and query, relative to the API base URL.
    pub fn path(&self) -> String {
        match self {
            Self::Me => "/api/me".to_string(),
            Self::Refresh => "/api/refresh".to_string(),
            Self::Logout => "/api/logout".to_string(),
            Self::SubmitScore(_) => "/api/submit-score".to_string(),
            Self::ScoresByGame(query) => format!(
                "/api/scores-by-game?game={}&page={}&size={}",
                query.game, query.page, query.size
            ),
        }
    }

    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path())
    }

    /// JSON body, only score submissions carry one.
    pub fn body(&self) -> Result<Option<String>> {
        match self {
            Self::SubmitScore(submission) => serde_json::to_string(submission)
                .map(Some)
                .map_err(|err| ApiError::Encode(err.to_string())),
            _ => Ok(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Fails with [`ApiError::Status`] before looking at the body.
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        if !self.is_success() {
            return Err(ApiError::Status(self.status));
        }
        serde_json::from_str(&self.body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("could not encode request: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_ids_use_wire_names() {
        for game in GameId::ALL {
            let json = serde_json::to_string(&game).unwrap();
            assert_eq!(json, format!("\"{}\"", game.as_str()));
            assert_eq!(serde_json::from_str::<GameId>(&json).unwrap(), game);
        }
    }

    #[test]
    fn submission_body() {
        let request = ApiRequest::SubmitScore(ScoreSubmission::new(GameId::Twenty48, 512));
        assert_eq!(request.method(), Method::Post);
        assert_eq!(
            request.body().unwrap().as_deref(),
            Some(r#"{"game":"2048","score":512}"#)
        );
        assert_eq!(ApiRequest::Me.body().unwrap(), None);
    }

    #[test]
    fn request_urls() {
        let query = ScoreQuery::first_page(GameId::Snake).next();
        let request = ApiRequest::ScoresByGame(query);
        assert_eq!(request.method(), Method::Get);
        assert_eq!(
            request.url("https://example.test/"),
            "https://example.test/api/scores-by-game?game=snake&page=1&size=10"
        );
        assert_eq!(ApiRequest::Refresh.url("http://x"), "http://x/api/refresh");
        assert_eq!(query.previous().previous().page, 0);
    }

    #[test]
    fn score_page_tolerates_missing_content() {
        let empty: ScorePage = serde_json::from_str("{}").unwrap();
        assert!(empty.content.is_empty());
        let null: ScorePage = serde_json::from_str(r#"{"content":null}"#).unwrap();
        assert!(null.content.is_empty());

        let page: ScorePage = serde_json::from_str(
            r#"{"content":[{"game":"snake","username":"ann","score":12,"timestamp":"2025-03-04T10:11:12.5"}],"number":0}"#,
        )
        .unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].username, "ann");
        assert_eq!(page.content[0].display_date(), "2025-03-04");
    }

    #[test]
    fn timestamps_parse_with_or_without_offset() {
        let entry = |timestamp: &str| ScoreEntry {
            game: None,
            username: "bob".to_string(),
            score: 1,
            timestamp: timestamp.to_string(),
        };
        let with_offset = entry("2024-01-02T03:04:05+02:00").parsed_timestamp().unwrap();
        assert_eq!(with_offset.to_rfc3339(), "2024-01-02T01:04:05+00:00");
        assert!(entry("2024-01-02T03:04:05").parsed_timestamp().is_some());
        assert!(entry("yesterday").parsed_timestamp().is_none());
        assert_eq!(entry("yesterday").display_date(), "yesterday");
    }

    #[test]
    fn json_checks_status_first() {
        let unauthorized = ApiResponse::new(401, "{}");
        assert!(unauthorized.is_unauthorized());
        assert_eq!(unauthorized.json::<User>(), Err(ApiError::Status(401)));
        assert!(matches!(
            ApiResponse::new(200, "not json").json::<User>(),
            Err(ApiError::Decode(_))
        ));
        assert_eq!(
            ApiResponse::new(200, r#"{"username":"cy"}"#).json::<User>(),
            Ok(User {
                username: "cy".to_string()
            })
        );
    }
}
