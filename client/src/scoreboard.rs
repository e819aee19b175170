//! Client-side view of the scoreboard for the current context

use crate::network::{InitData, NetEvent, SubmitData};
use log::{info, warn};
use shared::{Comment, MAX_COMMENTS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct ScoreboardView {
    display_name: Option<String>,
    high_score: u64,
    comments: Vec<Comment>,
    banner: Option<Banner>,
    pending: bool,
    loaded: bool,
}

impl ScoreboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("...")
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    /// Newest last, as stored by the server.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Zero scores are never sent, and only one submission is in flight at a time.
    pub fn can_submit(&self, score: u32) -> bool {
        score > 0 && !self.pending
    }

    pub fn apply(&mut self, event: NetEvent) {
        match event {
            NetEvent::InitLoaded(data) => self.apply_init(data),
            NetEvent::InitFailed(reason) => self.apply_init_failure(reason),
            NetEvent::Submitted(data) => self.apply_submit(data),
            NetEvent::SubmitFailed(reason) => self.apply_submit_failure(reason),
        }
    }

    pub fn apply_init(&mut self, data: InitData) {
        info!(
            "Scoreboard loaded for {}: high score {}, {} comments",
            data.display_name,
            data.high_score,
            data.comments.len()
        );
        self.display_name = Some(data.display_name);
        self.high_score = data.high_score;
        self.comments = data.comments;
        self.loaded = true;
    }

    pub fn apply_init_failure(&mut self, reason: String) {
        warn!("Could not load scoreboard: {}", reason);
        self.banner = Some(Banner::Error(format!("Scoreboard unavailable: {}", reason)));
    }

    pub fn begin_submit(&mut self) {
        self.pending = true;
        self.banner = Some(Banner::Info("Submitting score...".to_string()));
    }

    /// The server's high score is authoritative even if it went down.
    pub fn apply_submit(&mut self, data: SubmitData) {
        self.pending = false;
        self.high_score = data.high_score;

        if let Some(comment) = data.comment {
            if !self.comments.iter().any(|c| c.id == comment.id) {
                self.comments.push(comment);
            }
            if self.comments.len() > MAX_COMMENTS {
                let excess = self.comments.len() - MAX_COMMENTS;
                self.comments.drain(..excess);
            }
        }

        let text = if data.new_best {
            format!("New high score: {}!", data.high_score)
        } else {
            format!("Score saved. High score is {}", data.high_score)
        };
        self.banner = Some(Banner::Info(text));
    }

    pub fn apply_submit_failure(&mut self, reason: String) {
        warn!("Score submission failed: {}", reason);
        self.pending = false;
        self.banner = Some(Banner::Error(format!("Could not submit score: {}", reason)));
    }
}
