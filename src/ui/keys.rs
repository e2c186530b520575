//! Logical keys understood by the page engine.
//!
//! Raw crossterm key codes are folded into this fixed vocabulary; anything
//! else is a no-op.

use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Left,
    Right,
    PageUp,
    PageDown,
    Up,
    Down,
}

impl Key {
    pub const ALL: [Key; 9] = [
        Key::Escape,
        Key::Enter,
        Key::Tab,
        Key::Left,
        Key::Right,
        Key::PageUp,
        Key::PageDown,
        Key::Up,
        Key::Down,
    ];

    pub fn from_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Esc => Some(Key::Escape),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Tab => Some(Key::Tab),
            KeyCode::Left => Some(Key::Left),
            KeyCode::Right => Some(Key::Right),
            KeyCode::PageUp => Some(Key::PageUp),
            KeyCode::PageDown => Some(Key::PageDown),
            KeyCode::Up => Some(Key::Up),
            KeyCode::Down => Some(Key::Down),
            _ => None,
        }
    }

    pub fn code(self) -> KeyCode {
        match self {
            Key::Escape => KeyCode::Esc,
            Key::Enter => KeyCode::Enter,
            Key::Tab => KeyCode::Tab,
            Key::Left => KeyCode::Left,
            Key::Right => KeyCode::Right,
            Key::PageUp => KeyCode::PageUp,
            Key::PageDown => KeyCode::PageDown,
            Key::Up => KeyCode::Up,
            Key::Down => KeyCode::Down,
        }
    }
}
