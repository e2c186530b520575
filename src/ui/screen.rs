//! # Screen
//!
//! Row-oriented drawing on top of a ratatui [`Terminal`].
//!
//! Pages do not lay out widgets. They ask the screen for the next free row
//! with [`Screen::allocate_next_row`] and write text into it. Writes land in a
//! backing [`Buffer`] that survives between frames; [`Screen::flush`] copies
//! it into a ratatui frame and ratatui sends only the cells that changed.
//!
//! The backing buffer is only wiped by [`Screen::clear`] (on refresh) and by a
//! detected resize, so callers that shorten a line blank it first.

use crate::ui::error::UiError;
use crate::ui::keys::Key;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::line;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use tracing::info;

pub const MIN_WIDTH: u16 = 110;
pub const MIN_HEIGHT: u16 = 20;

/// Trait for reading terminal events (allows dependency injection for testing)
pub trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> io::Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
pub struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }
}

/// Display width of a label, in cells.
pub fn text_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

fn check_dimensions(size: Size) -> Result<(), UiError> {
    if size.width < MIN_WIDTH {
        return Err(UiError::Dimension {
            axis: "width",
            actual: size.width,
            minimum: MIN_WIDTH,
        });
    }

    if size.height < MIN_HEIGHT {
        return Err(UiError::Dimension {
            axis: "height",
            actual: size.height,
            minimum: MIN_HEIGHT,
        });
    }

    Ok(())
}

pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    events: Box<dyn EventReader>,
    /// `None` until [`Screen::initialize`] succeeds.
    size: Option<Size>,
    buffer: Buffer,
    next_row: u16,
}

impl<B: Backend> Screen<B> {
    pub fn new(terminal: Terminal<B>, events: Box<dyn EventReader>) -> Self {
        Self {
            terminal,
            events,
            size: None,
            buffer: Buffer::empty(Rect::default()),
            next_row: 0,
        }
    }

    /// Capture the terminal size. Fails if it is below 110x20.
    pub fn initialize(&mut self) -> Result<(), UiError> {
        let size = self.terminal.size().map_err(UiError::terminal)?;
        check_dimensions(size)?;

        info!(width = size.width, height = size.height, "screen initialized");
        self.size = Some(size);
        self.buffer = Buffer::empty(Rect::new(0, 0, size.width, size.height));
        self.next_row = 0;

        Ok(())
    }

    fn dimensions(&self) -> Result<Size, UiError> {
        self.size.ok_or(UiError::NotInitialized)
    }

    pub fn width(&self) -> u16 {
        self.size.map_or(0, |s| s.width)
    }

    pub fn height(&self) -> u16 {
        self.size.map_or(0, |s| s.height)
    }

    /// Row the next call to [`Screen::allocate_next_row`] will return.
    pub fn current_row(&self) -> u16 {
        self.next_row
    }

    /// Hand out the next row of this frame. Saturates at the last row, so
    /// overflowing draws overwrite it instead of failing.
    pub fn allocate_next_row(&mut self) -> u16 {
        let row = self.next_row;
        self.next_row = self
            .next_row
            .saturating_add(1)
            .min(self.height().saturating_sub(1));
        row
    }

    pub fn reset_row_cursor(&mut self) {
        self.next_row = 0;
    }

    /// Write `text` at `(row, col)`, clipped to the right edge. `highlighted`
    /// draws it in reverse video.
    pub fn draw_text(
        &mut self,
        row: u16,
        col: u16,
        text: &str,
        highlighted: bool,
    ) -> Result<(), UiError> {
        let size = self.dimensions()?;
        if row >= size.height || col >= size.width {
            return Ok(());
        }

        let style = if highlighted {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        self.buffer
            .set_stringn(col, row, text, usize::from(size.width - col), style);

        Ok(())
    }

    pub fn draw_horizontal_rule(&mut self, row: u16, col: u16, length: u16) -> Result<(), UiError> {
        let rule = line::HORIZONTAL.repeat(usize::from(length));
        self.draw_text(row, col, &rule, false)
    }

    pub fn clear_blank_line(&mut self, row: u16) -> Result<(), UiError> {
        let blank = " ".repeat(usize::from(self.width()));
        self.draw_text(row, 0, &blank, false)
    }

    /// Wipe the backing buffer and force a full repaint on the next flush.
    pub fn clear(&mut self) -> Result<(), UiError> {
        self.dimensions()?;
        self.buffer.reset();
        self.terminal.clear().map_err(UiError::terminal)
    }

    /// Re-read the terminal size. Returns `true` (after clearing) when it
    /// changed, so the caller redraws from scratch.
    pub fn detect_resize(&mut self) -> Result<bool, UiError> {
        let known = self.dimensions()?;
        let current = self.terminal.size().map_err(UiError::terminal)?;
        check_dimensions(current)?;

        if current == known {
            return Ok(false);
        }

        info!(
            width = current.width,
            height = current.height,
            "terminal resized"
        );
        self.size = Some(current);
        self.buffer
            .resize(Rect::new(0, 0, current.width, current.height));
        self.buffer.reset();
        self.terminal.clear().map_err(UiError::terminal)?;

        Ok(true)
    }

    /// Push the backing buffer to the terminal.
    pub fn flush(&mut self) -> Result<(), UiError> {
        self.dimensions()?;
        let buffer = &self.buffer;

        self.terminal
            .draw(|frame| {
                let area = frame.area().intersection(buffer.area);
                let target = frame.buffer_mut();
                for y in area.top()..area.bottom() {
                    for x in area.left()..area.right() {
                        if let (Some(src), Some(dst)) = (buffer.cell((x, y)), target.cell_mut((x, y)))
                        {
                            *dst = src.clone();
                        }
                    }
                }
            })
            .map_err(UiError::terminal)?;

        Ok(())
    }

    /// Non-blocking read of one logical key. `Ctrl+C` is reported as
    /// [`UiError::Interrupted`].
    pub fn poll_key(&mut self) -> Result<Option<Key>, UiError> {
        self.dimensions()?;

        let Some(event) = self.events.read_event(Duration::ZERO)? else {
            return Ok(None);
        };

        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Err(UiError::Interrupted);
                }
                Ok(Key::from_code(key.code))
            }
            _ => Ok(None),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.terminal.backend_mut()
    }
}
