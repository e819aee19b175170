//! Keyboard handling with edge detection and a one-line message field

use macroquad::prelude::*;
use shared::{Direction, MAX_MESSAGE_CHARS};

const STEER_KEY_COUNT: usize = 8;
const STEER_KEYS: [KeyCode; STEER_KEY_COUNT] = [
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Left,
    KeyCode::Right,
    KeyCode::W,
    KeyCode::S,
    KeyCode::A,
    KeyCode::D,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Steer(Direction),
    /// Start, pause/resume, or restart.
    Control,
    ToggleFocus,
    Blur,
    Submit,
}

/// Maps a key to a heading. Letter keys are text while the message field
/// has focus, so only the arrows steer then.
pub fn direction_for_key(key: KeyCode, typing: bool) -> Option<Direction> {
    match key {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ if typing => None,
        KeyCode::W => Some(Direction::Up),
        KeyCode::S => Some(Direction::Down),
        KeyCode::A => Some(Direction::Left),
        KeyCode::D => Some(Direction::Right),
        _ => None,
    }
}

/// Text typed into the comment field
#[derive(Debug, Clone, Default)]
pub struct MessageInput {
    text: String,
    focused: bool,
}

impl MessageInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Appends a character unless it is a control character or the field is full.
    pub fn push(&mut self, c: char) -> bool {
        if c.is_control() || self.text.chars().count() >= MAX_MESSAGE_CHARS {
            return false;
        }
        self.text.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Empties the field, returning what was typed if anything but whitespace.
    pub fn take(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.text);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Polls macroquad once per frame and turns key presses into [`InputEvent`]s
pub struct InputManager {
    message: MessageInput,

    // Previous frame key states for edge detection
    prev_steer: [bool; STEER_KEY_COUNT],
    prev_space: bool,
    prev_tab: bool,
    prev_enter: bool,
    prev_escape: bool,
    prev_backspace: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            message: MessageInput::new(),
            prev_steer: [false; STEER_KEY_COUNT],
            prev_space: false,
            prev_tab: false,
            prev_enter: false,
            prev_escape: false,
            prev_backspace: false,
        }
    }

    pub fn message(&self) -> &MessageInput {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut MessageInput {
        &mut self.message
    }

    pub fn update(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let typing = self.message.is_focused();

        for (i, key) in STEER_KEYS.iter().enumerate() {
            let down = is_key_down(*key);
            if down && !self.prev_steer[i] {
                if let Some(direction) = direction_for_key(*key, typing) {
                    events.push(InputEvent::Steer(direction));
                }
            }
            self.prev_steer[i] = down;
        }

        let space = is_key_down(KeyCode::Space);
        let tab = is_key_down(KeyCode::Tab);
        let enter = is_key_down(KeyCode::Enter) || is_key_down(KeyCode::KpEnter);
        let escape = is_key_down(KeyCode::Escape);
        let backspace = is_key_down(KeyCode::Backspace);

        if space && !self.prev_space && !typing {
            events.push(InputEvent::Control);
        }
        if tab && !self.prev_tab {
            events.push(InputEvent::ToggleFocus);
        }
        if enter && !self.prev_enter {
            events.push(InputEvent::Submit);
        }
        if escape && !self.prev_escape && typing {
            events.push(InputEvent::Blur);
        }
        if backspace && !self.prev_backspace && typing {
            self.message.backspace();
        }

        self.prev_space = space;
        self.prev_tab = tab;
        self.prev_enter = enter;
        self.prev_escape = escape;
        self.prev_backspace = backspace;

        // Drain the queue every frame so keys pressed before focusing are dropped.
        while let Some(c) = get_char_pressed() {
            if typing {
                self.message.push(c);
            }
        }

        events
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
