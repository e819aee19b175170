use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: i32 = 20;
pub const BASE_TICK_MS: f64 = 800.0;
pub const MIN_TICK_MS: f64 = 150.0;
pub const SPEEDUP_FACTOR: f64 = 0.9;
pub const MAX_MESSAGE_CHARS: usize = 280;
pub const MAX_COMMENTS: usize = 20;

/// A board coordinate. Heads computed by [`Cell::offset`] may fall outside
/// the board, which is how the boundary check sees them.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.x) && (0..BOARD_SIZE).contains(&self.y)
    }

    pub fn offset(&self, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        Cell::new(self.x + dx, self.y + dy)
    }
}

/// Heading on the board. Screen coordinates: `y` grows downwards.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// A player-submitted annotation on a score. Never mutated after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub username: String,
    pub score: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Trims a player message and caps it at [`MAX_MESSAGE_CHARS`] characters.
pub fn clean_message(message: &str) -> String {
    message.trim().chars().take(MAX_MESSAGE_CHARS).collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Request {
    Init,
    Submit {
        score: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// One request datagram. `context` and `user` are supplied by the hosting
/// page; the server validates them before touching the store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub seq: u32,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    pub request: Request,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    InitOk {
        display_name: String,
        high_score: u64,
        comments: Vec<Comment>,
    },
    #[serde(rename_all = "camelCase")]
    SubmitOk {
        high_score: u64,
        new_best: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<Comment>,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorReply {
    pub status: ErrorStatus,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Reply {
    Ok(Response),
    Error(ErrorReply),
}

impl Reply {
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(ErrorReply {
            status: ErrorStatus::Error,
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub seq: u32,
    pub reply: Reply,
}

pub fn encode<T: Serialize>(message: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(message)
}

pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> serde_json::Result<T> {
    serde_json::from_slice(bytes)
}
