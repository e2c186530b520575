use crate::ui::keys::Key;
use thiserror::Error;

/// Errors raised by the page engine.
///
/// Everything except [`UiError::Interrupted`] is fatal: the terminal is
/// restored and the message is reported on exit.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("screen {axis} is {actual} but the minimum is {minimum}")]
    Dimension {
        axis: &'static str,
        actual: u16,
        minimum: u16,
    },
    #[error("screen not initialized")]
    NotInitialized,
    #[error("keybinding for {0:?} is reserved")]
    ReservedKey(Key),
    #[error("invalid keybinding: {0}")]
    InvalidAction(String),
    #[error("button {index} does not exist (carousel has {len} buttons)")]
    InvalidButton { index: usize, len: usize },
    #[error("interrupted")]
    Interrupted,
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl UiError {
    /// Wrap a backend error. Backends carry their own error types, so only
    /// the message is kept.
    pub fn terminal(err: impl std::fmt::Display) -> Self {
        Self::Terminal(err.to_string())
    }
}
