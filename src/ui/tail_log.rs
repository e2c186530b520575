//! # Tail Log Page
//!
//! Shows the newest content of one output stream of a process, word-wrapped
//! and anchored to the bottom of the screen. Entered from the process list
//! and left with Escape.

use crate::supervisor::{LogStream, Supervisor};
use crate::ui::error::UiError;
use crate::ui::page::{Button, Direction, Page};
use crate::ui::screen::Screen;
use crossterm::event::KeyCode;
use ratatui::backend::Backend;
use std::time::Duration;
use tracing::{debug, warn};

pub const PAGE_TITLE: &str = "Tail";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailCommand {
    Enter,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailAction {
    Refresh,
}

const KEYBINDINGS: [(KeyCode, Option<TailCommand>); 3] = [
    (KeyCode::Right, Some(TailCommand::Right)),
    (KeyCode::Left, Some(TailCommand::Left)),
    (KeyCode::Enter, Some(TailCommand::Enter)),
];

/// Split `buffer` into lines and wrap each to `width - 1` columns. Blank and
/// whitespace-only lines take no rows.
pub fn wrap_log(buffer: &str, width: usize) -> Vec<String> {
    let wrap_width = width.saturating_sub(1).max(1);

    buffer
        .lines()
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| {
            textwrap::wrap(line, wrap_width)
                .into_iter()
                .map(|wrapped| wrapped.into_owned())
        })
        .collect()
}

/// The last `visible` lines, padded at the bottom with blanks when there are
/// fewer.
pub fn tail_window(lines: &[String], visible: usize) -> Vec<String> {
    let start = lines.len().saturating_sub(visible);
    let mut window = lines[start..].to_vec();
    window.resize(visible, String::new());
    window
}

pub struct TailLogPage {
    page: Page<TailCommand, TailAction>,
    process_name: String,
    stream: LogStream,
    buffer: String,
    tick: Duration,
}

impl TailLogPage {
    pub fn new(process_name: impl Into<String>, stream: LogStream, tick: Duration) -> Self {
        Self {
            page: Page::new(),
            process_name: process_name.into(),
            stream,
            buffer: String::new(),
            tick,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn title(&self) -> String {
        format!("{PAGE_TITLE} {} {}", self.process_name, self.stream)
    }

    pub fn init(&mut self) -> Result<(), UiError> {
        self.page.enter(
            vec![Button::new("Refresh", Some(TailAction::Refresh))],
            0,
            Some(&KEYBINDINGS),
            false,
        )
    }

    pub async fn run<B: Backend, S: Supervisor>(
        &mut self,
        screen: &mut Screen<B>,
        supervisor: &S,
    ) -> Result<(), UiError> {
        self.init()?;
        self.refresh(screen, supervisor).await?;

        while !self.page.should_exit() {
            if screen.detect_resize()? {
                self.refresh(screen, supervisor).await?;
            }

            self.draw(screen)?;

            if let Some(command) = self.page.dispatch_input(screen)? {
                self.handle(command, screen, supervisor).await?;
            }

            tokio::time::sleep(self.tick).await;
        }

        debug!(process = %self.process_name, "leaving tail page");
        Ok(())
    }

    /// Fetch roughly one screenful of the stream. A failure is shown in place
    /// of the log.
    pub async fn refresh<B: Backend, S: Supervisor>(
        &mut self,
        screen: &mut Screen<B>,
        supervisor: &S,
    ) -> Result<(), UiError> {
        self.page.begin_refresh(screen)?;

        let byte_count = usize::from(screen.height()) * usize::from(screen.width());
        self.buffer = match supervisor
            .tail_log(&self.process_name, self.stream, byte_count)
            .await
        {
            Ok(log) => log,
            Err(err) => {
                warn!(process = %self.process_name, error = %err, "failed to tail log");
                err.to_string()
            }
        };

        Ok(())
    }

    pub async fn handle<B: Backend, S: Supervisor>(
        &mut self,
        command: TailCommand,
        screen: &mut Screen<B>,
        supervisor: &S,
    ) -> Result<(), UiError> {
        match command {
            TailCommand::Left => self.page.cycle_button(Direction::Left),
            TailCommand::Right => self.page.cycle_button(Direction::Right),
            TailCommand::Enter => {
                if let Some(TailAction::Refresh) = self.page.selected_button().and_then(|b| b.action)
                {
                    self.refresh(screen, supervisor).await?;
                }
            }
        }

        Ok(())
    }

    pub fn draw<B: Backend>(&self, screen: &mut Screen<B>) -> Result<(), UiError> {
        screen.reset_row_cursor();

        self.page.render_title(screen, &self.title())?;
        self.page.render_buttons(screen, false)?;

        let row = screen.allocate_next_row();
        screen.draw_horizontal_rule(row, 0, screen.width())?;

        self.draw_log(screen)?;
        self.page.render_keybindings_help(screen)?;

        screen.flush()
    }

    fn draw_log<B: Backend>(&self, screen: &mut Screen<B>) -> Result<(), UiError> {
        let lines = wrap_log(&self.buffer, usize::from(screen.width()));
        let visible = usize::from(screen.height().saturating_sub(screen.current_row()))
            .saturating_sub(2);

        for line in tail_window(&lines, visible) {
            let row = screen.allocate_next_row();
            screen.clear_blank_line(row)?;
            screen.draw_text(row, 0, &line, false)?;
        }

        Ok(())
    }
}
