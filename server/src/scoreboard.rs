//! Per-context high score and comment log
//!
//! Every read-modify-write goes through [`KeyValueStore::compare_and_set`]
//! and is retried when another submission for the same context got there
//! first. A stale snapshot can therefore never overwrite a higher score or
//! drop somebody else's comment.

use crate::error::{ServiceError, ServiceResult};
use crate::identity::{Caller, IdentityProvider};
use crate::store::KeyValueStore;
use chrono::Utc;
use log::{debug, error, info, warn};
use shared::{clean_message, Comment, Reply, Request, RequestEnvelope, Response, MAX_COMMENTS};
use uuid::Uuid;

pub const MAX_WRITE_ATTEMPTS: usize = 16;

pub fn high_score_key(context: &str) -> String {
    format!("{}:high_score", context)
}

pub fn comments_key(context: &str) -> String {
    format!("{}:comments", context)
}

fn require_context(context: Option<&str>) -> ServiceResult<&str> {
    match context.map(str::trim) {
        Some(context) if !context.is_empty() => Ok(context),
        _ => Err(ServiceError::MissingContext),
    }
}

pub struct ScoreboardService<S> {
    store: S,
    identity: Box<dyn IdentityProvider>,
}

impl<S: KeyValueStore> ScoreboardService<S> {
    pub fn new(store: S, identity: impl IdentityProvider + 'static) -> Self {
        Self {
            store,
            identity: Box::new(identity),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read-only snapshot used to seed a freshly loaded client.
    pub fn init(&self, context: Option<&str>, caller: &Caller) -> ServiceResult<Response> {
        let context = require_context(context)?;

        let (_, high_score) = self.read_high_score(&high_score_key(context))?;
        let (_, comments) = self.read_comments(&comments_key(context))?;

        Ok(Response::InitOk {
            display_name: self.identity.display_name(caller),
            high_score,
            comments,
        })
    }

    /// Records a finished (or in-progress) game and an optional message.
    pub fn submit(
        &self,
        context: Option<&str>,
        caller: &Caller,
        score: f64,
        message: Option<&str>,
    ) -> ServiceResult<Response> {
        let context = require_context(context)?;
        if !score.is_finite() || score < 0.0 {
            return Err(ServiceError::InvalidScore(score));
        }
        let score = score.floor() as u64;
        let message = message.map(clean_message).filter(|m| !m.is_empty());

        let (high_score, new_best) = self.raise_high_score(context, score)?;

        let comment = match message {
            Some(message) => Some(self.append_comment(context, caller, score, message)?),
            None => None,
        };

        info!(
            "Score {} submitted for {} (high score {}, new best: {}, comment: {})",
            score,
            context,
            high_score,
            new_best,
            comment.is_some()
        );

        Ok(Response::SubmitOk {
            high_score,
            new_best,
            comment,
        })
    }

    /// Dispatches one decoded request and folds errors into an error reply.
    pub fn respond(&self, envelope: &RequestEnvelope, caller: &Caller) -> Reply {
        let context = envelope.context.as_deref();
        let result = match &envelope.request {
            Request::Init => self.init(context, caller),
            Request::Submit { score, message } => {
                self.submit(context, caller, *score, message.as_deref())
            }
        };

        match result {
            Ok(response) => Reply::Ok(response),
            Err(e) if e.is_client_error() => {
                warn!("Rejected request {} from {}: {}", envelope.seq, caller.addr, e);
                Reply::error(e.public_message())
            }
            Err(e) => {
                error!("Request {} from {} failed: {}", envelope.seq, caller.addr, e);
                Reply::error(e.public_message())
            }
        }
    }

    fn read_high_score(&self, key: &str) -> ServiceResult<(Option<String>, u64)> {
        let raw = self.store.get(key)?;
        let value = match raw.as_deref() {
            None => 0,
            Some(text) => text.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!("Discarding malformed high score at {}: {:?}", key, text);
                0
            }),
        };
        Ok((raw, value))
    }

    fn read_comments(&self, key: &str) -> ServiceResult<(Option<String>, Vec<Comment>)> {
        let raw = self.store.get(key)?;
        let comments = match raw.as_deref() {
            None => Vec::new(),
            Some(text) => serde_json::from_str::<Vec<Comment>>(text).unwrap_or_else(|e| {
                warn!("Discarding malformed comment log at {}: {}", key, e);
                Vec::new()
            }),
        };
        Ok((raw, comments))
    }

    fn raise_high_score(&self, context: &str, score: u64) -> ServiceResult<(u64, bool)> {
        let key = high_score_key(context);

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let (raw, current) = self.read_high_score(&key)?;
            if score <= current {
                return Ok((current, false));
            }
            if self
                .store
                .compare_and_set(&key, raw.as_deref(), &score.to_string())?
            {
                return Ok((score, true));
            }
            debug!("{} changed during update, retrying", key);
        }

        Err(ServiceError::Contention {
            key,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    fn append_comment(
        &self,
        context: &str,
        caller: &Caller,
        score: u64,
        message: String,
    ) -> ServiceResult<Comment> {
        let key = comments_key(context);
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            username: self.identity.display_name(caller),
            score,
            message,
            created_at: Utc::now(),
        };

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let (raw, mut comments) = self.read_comments(&key)?;
            comments.push(comment.clone());
            if comments.len() > MAX_COMMENTS {
                let overflow = comments.len() - MAX_COMMENTS;
                comments.drain(..overflow);
            }

            let encoded = serde_json::to_string(&comments)?;
            if self.store.compare_and_set(&key, raw.as_deref(), &encoded)? {
                return Ok(comment);
            }
            debug!("{} changed during append, retrying", key);
        }

        Err(ServiceError::Contention {
            key,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}
