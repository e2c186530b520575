//! # Process List Page
//!
//! The top-level page: a header with global actions, the process table and a
//! status panel showing the output of the last action.
//!
//! ```text
//! Supervisor - Processes (Monday 02 January 2023 10:00:00)     <- title
//! Refresh  Restart All  Stop All                                <- header buttons
//!
//! State   Description   Name   Action                           <- columns
//! ─────────────────────────────────────────
//! RUNNING pid 42        api    Restart  Stop  Clear Log ...     <- visible rows
//! ─────────────────────────────────────────
//! (last five lines of the last action output)
//! Esc: Exit Page | Tab: Switch Section | ...                    <- help footer
//! ```
//!
//! Focus is either on the header buttons or on the table; Tab switches it.

use crate::supervisor::{Supervisor, SupervisorError};
use crate::ui::error::UiError;
use crate::ui::page::{truncate, Button, Direction, Page};
use crate::ui::process_table::{ProcessButton, ProcessTable, Section};
use crate::ui::screen::{text_width, Screen};
use crate::ui::tail_log::TailLogPage;
use crossterm::event::KeyCode;
use ratatui::backend::Backend;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const PAGE_TITLE: &str = "Processes";

pub const STATUS_NUM_ROWS: usize = 5;

pub const MAX_VISIBLE_PROCESS_BUTTONS: usize = 5;

pub const TABLE_COLUMN_NAMES: [&str; 4] = ["State", "Description", "Name", "Action"];

/// The action column spans roughly two data columns.
const TOTAL_COLUMNS: usize = TABLE_COLUMN_NAMES.len() + MAX_VISIBLE_PROCESS_BUTTONS / 2;

/// Header button actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    Refresh,
    RestartAll,
    StopAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCommand {
    Enter,
    Tab,
    Left,
    Right,
    PageUp,
    PageDown,
    Up,
    Down,
}

const KEYBINDINGS: [(KeyCode, Option<ListCommand>); 8] = [
    (KeyCode::Right, Some(ListCommand::Right)),
    (KeyCode::Left, Some(ListCommand::Left)),
    (KeyCode::PageDown, Some(ListCommand::PageDown)),
    (KeyCode::PageUp, Some(ListCommand::PageUp)),
    (KeyCode::Up, Some(ListCommand::Up)),
    (KeyCode::Down, Some(ListCommand::Down)),
    (KeyCode::Tab, Some(ListCommand::Tab)),
    (KeyCode::Enter, Some(ListCommand::Enter)),
];

fn header_buttons() -> Vec<Button<HeaderAction>> {
    vec![
        Button::new("Refresh", Some(HeaderAction::Refresh)),
        Button::new("Restart All", Some(HeaderAction::RestartAll)),
        Button::new("Stop All", Some(HeaderAction::StopAll)),
    ]
}

/// Width of the State/Description/Name cells in a process row.
pub fn column_width(screen_width: u16) -> usize {
    (usize::from(screen_width) / TOTAL_COLUMNS).max(10)
}

/// Table rows left after the fixed chrome: header, status divider, status
/// block, column names, content divider and the two-row help footer.
pub fn visible_rows_for(screen_height: u16, header_rows: u16) -> usize {
    let chrome = usize::from(header_rows) + 1 + STATUS_NUM_ROWS + 1 + 1 + 2;
    usize::from(screen_height).saturating_sub(chrome)
}

/// The last five trimmed lines of `output`, padded with blank lines.
pub fn status_lines(output: &str) -> Vec<String> {
    let lines: Vec<&str> = output.trim().split('\n').collect();
    let start = lines.len().saturating_sub(STATUS_NUM_ROWS);

    let mut status: Vec<String> = lines[start..]
        .iter()
        .map(|line| line.trim().to_string())
        .collect();
    status.resize(STATUS_NUM_ROWS, String::new());
    status
}

pub struct ProcessListPage {
    page: Page<ListCommand, HeaderAction>,
    table: ProcessTable,
    last_action_output: String,
    header_rows: u16,
    tick: Duration,
}

impl ProcessListPage {
    pub fn new(tick: Duration) -> Self {
        Self {
            page: Page::new(),
            table: ProcessTable::new(),
            last_action_output: String::new(),
            header_rows: 0,
            tick,
        }
    }

    pub fn page(&self) -> &Page<ListCommand, HeaderAction> {
        &self.page
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn last_action_output(&self) -> &str {
        &self.last_action_output
    }

    /// Reset the page session. Table state is kept.
    pub fn init(&mut self) -> Result<(), UiError> {
        self.page.enter(header_buttons(), 0, Some(&KEYBINDINGS), false)
    }

    /// Own the event loop until Escape.
    pub async fn run<B: Backend, S: Supervisor>(
        &mut self,
        screen: &mut Screen<B>,
        supervisor: &S,
    ) -> Result<(), UiError> {
        self.init()?;
        self.refresh(screen, supervisor).await?;

        let mut last_scroll_offset = self.table.scroll_offset();
        while !self.page.should_exit() {
            screen.detect_resize()?;

            if last_scroll_offset != self.table.scroll_offset() {
                screen.clear()?;
                last_scroll_offset = self.table.scroll_offset();
            }

            self.draw(screen)?;

            if let Some(command) = self.page.dispatch_input(screen)? {
                self.handle(command, screen, supervisor).await?;
            }

            tokio::time::sleep(self.tick).await;
        }

        debug!("leaving process list page");
        Ok(())
    }

    /// Re-fetch the process list. On failure the previous list stays and the
    /// error goes to the status panel.
    pub async fn refresh<B: Backend, S: Supervisor>(
        &mut self,
        screen: &mut Screen<B>,
        supervisor: &S,
    ) -> Result<(), UiError> {
        self.page.begin_refresh(screen)?;

        match supervisor.list_processes().await {
            Ok(processes) => {
                debug!(count = processes.len(), "process list refreshed");
                self.table.set_processes(processes);
            }
            Err(err) => {
                warn!(error = %err, "failed to list processes");
                self.last_action_output = err.to_string();
                self.table.reset_selected_buttons();
            }
        }

        Ok(())
    }

    pub async fn handle<B: Backend, S: Supervisor>(
        &mut self,
        command: ListCommand,
        screen: &mut Screen<B>,
        supervisor: &S,
    ) -> Result<(), UiError> {
        let section = self.table.section();

        match command {
            ListCommand::Enter => return self.handle_enter(screen, supervisor).await,
            ListCommand::Tab => self.table.cycle_section(),
            ListCommand::Left | ListCommand::Right => {
                let direction = if command == ListCommand::Left {
                    Direction::Left
                } else {
                    Direction::Right
                };
                match section {
                    Section::Header => self.page.cycle_button(direction),
                    Section::Table => self.table.cycle_selected_process_button(direction),
                }
            }
            ListCommand::PageDown => self.table.scroll_table(Direction::Down),
            ListCommand::PageUp => self.table.scroll_table(Direction::Up),
            ListCommand::Down => self.table.cycle_process(Direction::Down),
            ListCommand::Up => self.table.cycle_process(Direction::Up),
        }

        Ok(())
    }

    async fn handle_enter<B: Backend, S: Supervisor>(
        &mut self,
        screen: &mut Screen<B>,
        supervisor: &S,
    ) -> Result<(), UiError> {
        match self.table.section() {
            Section::Header => {
                let Some(action) = self.page.selected_button().and_then(|b| b.action) else {
                    return Ok(());
                };

                info!(?action, "header action");
                let output = match action {
                    HeaderAction::Refresh => None,
                    HeaderAction::RestartAll => Some(supervisor.restart_all().await),
                    HeaderAction::StopAll => Some(supervisor.stop_all().await),
                };
                if let Some(output) = output {
                    self.record_output(output);
                }
            }
            Section::Table => {
                let (Some(process), Some(button)) =
                    (self.table.selected_process(), self.table.selected_button())
                else {
                    return Ok(());
                };
                let name = process.name.clone();

                if let ProcessButton::Tail(stream) = button {
                    debug!(process = %name, %stream, "entering tail page");
                    TailLogPage::new(name, stream, self.tick)
                        .run(screen, supervisor)
                        .await?;
                    self.init()?;
                } else {
                    info!(process = %name, action = button.label(), "process action");
                    let output = match button {
                        ProcessButton::Start => supervisor.start(&name).await,
                        ProcessButton::Restart => supervisor.restart(&name).await,
                        ProcessButton::Stop => supervisor.stop(&name).await,
                        ProcessButton::ClearLog => supervisor.clear_log(&name).await,
                        ProcessButton::Tail(_) => return Ok(()),
                    };
                    self.record_output(output);
                }
            }
        }

        self.refresh(screen, supervisor).await
    }

    fn record_output(&mut self, output: Result<String, SupervisorError>) {
        self.last_action_output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!(error = %err, "supervisor action failed");
                err.to_string()
            }
        };
    }

    pub fn draw<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<(), UiError> {
        screen.reset_row_cursor();

        self.draw_header(screen)?;
        self.draw_table(screen)?;
        self.draw_status(screen)?;
        self.page.render_keybindings_help(screen)?;

        screen.flush()
    }

    fn draw_header<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<(), UiError> {
        let start = screen.current_row();

        self.page.render_title(screen, PAGE_TITLE)?;
        self.page
            .render_buttons(screen, self.table.section() != Section::Header)?;
        let row = screen.allocate_next_row();
        screen.clear_blank_line(row)?;

        self.header_rows = screen.current_row().saturating_sub(start);
        Ok(())
    }

    fn draw_table<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<(), UiError> {
        let header_width = usize::from(screen.width()) / TOTAL_COLUMNS;
        let row = screen.allocate_next_row();
        let mut col = 0u16;
        for name in TABLE_COLUMN_NAMES {
            let cell = format!("{name:<header_width$}");
            screen.draw_text(row, col, &cell, false)?;
            col = col.saturating_add(text_width(&cell));
        }

        let row = screen.allocate_next_row();
        screen.draw_horizontal_rule(row, 0, screen.width())?;

        self.table
            .set_visible_rows(visible_rows_for(screen.height(), self.header_rows));

        let visible = self.table.visible_rows();
        let displayed = if self.table.processes().is_empty() {
            let message = "No Processes";
            let col = screen.width().saturating_sub(text_width(message)) / 2;
            let row = screen.allocate_next_row();
            screen.clear_blank_line(row)?;
            screen.draw_text(row, col, message, false)?;
            1
        } else {
            let range = self.table.visible_range();
            let displayed = range.len();
            for index in range {
                self.draw_process_row(screen, index)?;
            }
            displayed
        };

        for _ in 0..visible.saturating_sub(displayed) {
            let row = screen.allocate_next_row();
            screen.clear_blank_line(row)?;
        }

        Ok(())
    }

    fn draw_process_row<B: Backend>(
        &self,
        screen: &mut Screen<B>,
        index: usize,
    ) -> Result<(), UiError> {
        let Some(process) = self.table.processes().get(index) else {
            return Ok(());
        };

        let row = screen.allocate_next_row();
        screen.clear_blank_line(row)?;

        let width = column_width(screen.width());
        let details = format!(
            "{:<width$}{:<width$}{:<width$}",
            truncate(process.state.as_str(), width),
            truncate(&process.description, width),
            truncate(&process.name, width),
        );

        let is_selected =
            self.table.section() == Section::Table && index == self.table.selected_index();
        screen.draw_text(row, 0, &details, is_selected)?;

        let selected_button = self.table.selected_button();
        let mut col = text_width(&details);
        for &button in ProcessButton::legal_for(process.state) {
            let highlighted = is_selected && selected_button == Some(button);
            screen.draw_text(row, col, button.label(), highlighted)?;
            col = col.saturating_add(text_width(button.label()).saturating_add(2));
        }

        Ok(())
    }

    fn draw_status<B: Backend>(&self, screen: &mut Screen<B>) -> Result<(), UiError> {
        let row = screen.allocate_next_row();
        screen.draw_horizontal_rule(row, 0, screen.width())?;

        for line in status_lines(&self.last_action_output) {
            let row = screen.allocate_next_row();
            screen.clear_blank_line(row)?;
            screen.draw_text(row, 0, &line, false)?;
        }

        Ok(())
    }
}
