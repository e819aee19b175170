use crate::game::{CellMarker, GameSession, Phase, SnakeColor};
use crate::input::MessageInput;
use crate::scoreboard::{Banner, ScoreboardView};
use macroquad::prelude::*;
use shared::{Comment, BOARD_SIZE};

pub const CELL_SIZE: f32 = 25.0;
pub const BOARD_ORIGIN: (f32, f32) = (20.0, 50.0);
const PANEL_X: f32 = BOARD_ORIGIN.0 + BOARD_SIZE as f32 * CELL_SIZE + 20.0;
const FEED_LINE_CHARS: usize = 34;
const VISIBLE_COMMENTS: usize = 10;

const BACKGROUND: Color = Color::new(0.1, 0.1, 0.1, 1.0);
const BOARD_BACKGROUND: Color = Color::new(0.16, 0.16, 0.16, 1.0);
const FOOD_COLOR: Color = Color::new(1.0, 0.27, 0.27, 1.0);
const MUTED: Color = Color::new(0.55, 0.55, 0.55, 1.0);

/// Screen rectangle of the board cell at grid position (x, y)
pub fn cell_rect(x: usize, y: usize) -> Rect {
    Rect::new(
        BOARD_ORIGIN.0 + x as f32 * CELL_SIZE,
        BOARD_ORIGIN.1 + y as f32 * CELL_SIZE,
        CELL_SIZE,
        CELL_SIZE,
    )
}

pub fn status_text(phase: Phase, score: u32) -> String {
    match phase {
        Phase::Idle => "Press Space to start".to_string(),
        Phase::Running => format!("Score: {}", score),
        Phase::Paused => format!("Paused at {} - Space to resume", score),
        Phase::GameOver => format!("Game over! Score {} - Space to restart", score),
    }
}

/// One feed line, cut to fit the side panel.
pub fn comment_line(comment: &Comment) -> String {
    let line = format!(
        "{} {} ({}): {}",
        comment.created_at.format("%H:%M"),
        comment.username,
        comment.score,
        comment.message
    );
    if line.chars().count() <= FEED_LINE_CHARS {
        return line;
    }
    let mut cut: String = line.chars().take(FEED_LINE_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

fn snake_color(color: SnakeColor) -> Color {
    Color::from_rgba(color.r, color.g, color.b, 255)
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn render(&self, session: &GameSession, view: &ScoreboardView, message: &MessageInput) {
        clear_background(BACKGROUND);

        draw_text(&status_text(session.phase(), session.score()), 20.0, 32.0, 28.0, WHITE);
        self.draw_board(session);
        self.draw_panel(view, message, session.score());
    }

    fn draw_board(&self, session: &GameSession) {
        let side = BOARD_SIZE as f32 * CELL_SIZE;
        draw_rectangle(BOARD_ORIGIN.0, BOARD_ORIGIN.1, side, side, BOARD_BACKGROUND);

        let body = snake_color(session.color());
        for (y, row) in session.project().iter().enumerate() {
            for (x, marker) in row.iter().enumerate() {
                let rect = cell_rect(x, y);
                match marker {
                    CellMarker::Empty => {}
                    CellMarker::Snake => {
                        draw_rectangle(rect.x, rect.y, rect.w, rect.h, body);
                        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, BACKGROUND);
                    }
                    CellMarker::Food => {
                        draw_circle(
                            rect.x + rect.w / 2.0,
                            rect.y + rect.h / 2.0,
                            rect.w / 2.5,
                            FOOD_COLOR,
                        );
                    }
                }
            }
        }

        draw_rectangle_lines(BOARD_ORIGIN.0, BOARD_ORIGIN.1, side, side, 2.0, MUTED);
    }

    fn draw_panel(&self, view: &ScoreboardView, message: &MessageInput, score: u32) {
        let mut y = BOARD_ORIGIN.1 + 16.0;

        draw_text(&format!("Player: {}", view.display_name()), PANEL_X, y, 20.0, WHITE);
        y += 24.0;
        draw_text(&format!("High score: {}", view.high_score()), PANEL_X, y, 20.0, GOLD);
        y += 30.0;

        if let Some(banner) = view.banner() {
            let (text, color) = match banner {
                Banner::Info(text) => (text, SKYBLUE),
                Banner::Error(text) => (text, RED),
            };
            draw_text(text, PANEL_X, y, 16.0, color);
        }
        y += 26.0;

        let field_w = self.width - PANEL_X - 10.0;
        let border = if message.is_focused() { WHITE } else { MUTED };
        draw_rectangle_lines(PANEL_X, y, field_w, 26.0, 1.0, border);
        let shown = if message.text().is_empty() && !message.is_focused() {
            "Tab to write a comment".to_string()
        } else {
            let tail: Vec<char> = message.text().chars().rev().take(FEED_LINE_CHARS).collect();
            tail.into_iter().rev().collect()
        };
        draw_text(&shown, PANEL_X + 4.0, y + 18.0, 16.0, border);
        y += 40.0;

        let hint = if view.can_submit(score) {
            "Enter to submit your score"
        } else {
            "Comments"
        };
        draw_text(hint, PANEL_X, y, 16.0, MUTED);
        y += 22.0;

        for comment in view.comments().iter().rev().take(VISIBLE_COMMENTS) {
            if y > self.height - 10.0 {
                break;
            }
            draw_text(&comment_line(comment), PANEL_X, y, 14.0, LIGHTGRAY);
            y += 18.0;
        }
    }
}
