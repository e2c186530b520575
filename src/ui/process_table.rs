//! # Process Table State
//!
//! Focus, selection and scroll bookkeeping for the process list page, kept
//! apart from rendering so it can be driven directly.
//!
//! ## Invariants
//!
//! - `selected < processes.len()` whenever the list is non-empty.
//! - `scroll_offset <= selected < scroll_offset + visible_rows` whenever
//!   `visible_rows > 0`.
//! - The selected button of process `i` is always one of the buttons legal
//!   for `processes[i].state`; every list replacement resets it.
//!
//! Selection survives a refresh by position, not by process name.

use crate::supervisor::{LogStream, Process, ProcessState};
use crate::ui::page::{cycle_index, Direction};
use std::ops::Range;

/// Which part of the process list page has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Table,
}

impl Section {
    pub fn toggle(self) -> Self {
        match self {
            Section::Header => Section::Table,
            Section::Table => Section::Header,
        }
    }
}

/// An action offered in a process row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessButton {
    Start,
    Restart,
    Stop,
    ClearLog,
    Tail(LogStream),
}

const ACTIVE_BUTTONS: [ProcessButton; 5] = [
    ProcessButton::Restart,
    ProcessButton::Stop,
    ProcessButton::ClearLog,
    ProcessButton::Tail(LogStream::Stdout),
    ProcessButton::Tail(LogStream::Stderr),
];
const STARTING_BUTTONS: [ProcessButton; 1] = [ProcessButton::Stop];
const STOPPED_BUTTONS: [ProcessButton; 2] = [ProcessButton::Start, ProcessButton::ClearLog];

impl ProcessButton {
    pub fn label(self) -> &'static str {
        match self {
            ProcessButton::Start => "Start",
            ProcessButton::Restart => "Restart",
            ProcessButton::Stop => "Stop",
            ProcessButton::ClearLog => "Clear Log",
            ProcessButton::Tail(LogStream::Stdout) => "Tail Stdout",
            ProcessButton::Tail(LogStream::Stderr) => "Tail Stderr",
        }
    }

    /// Buttons legal for a process in `state`, in display order.
    pub fn legal_for(state: ProcessState) -> &'static [ProcessButton] {
        match state {
            ProcessState::Starting => &STARTING_BUTTONS,
            ProcessState::Stopped => &STOPPED_BUTTONS,
            ProcessState::Running
            | ProcessState::Backoff
            | ProcessState::Exited
            | ProcessState::Fatal
            | ProcessState::Unknown => &ACTIVE_BUTTONS,
        }
    }

    /// First legal button for `state`. Every legal set is non-empty.
    pub fn default_for(state: ProcessState) -> ProcessButton {
        Self::legal_for(state)[0]
    }
}

#[derive(Debug, Clone)]
pub struct ProcessTable {
    section: Section,
    processes: Vec<Process>,
    selected: usize,
    scroll_offset: usize,
    visible_rows: usize,
    scroll_length: usize,
    /// Selected button per process, by index.
    selected_buttons: Vec<ProcessButton>,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self {
            section: Section::Header,
            processes: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            visible_rows: 0,
            scroll_length: 1,
            selected_buttons: Vec::new(),
        }
    }
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn scroll_length(&self) -> usize {
        self.scroll_length
    }

    /// Indices of the processes inside the scroll window.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_offset.min(self.processes.len());
        let end = (self.scroll_offset + self.visible_rows).min(self.processes.len());
        start..end
    }

    pub fn selected_process(&self) -> Option<&Process> {
        self.processes.get(self.selected)
    }

    pub fn selected_button(&self) -> Option<ProcessButton> {
        self.button_for(self.selected)
    }

    pub fn button_for(&self, index: usize) -> Option<ProcessButton> {
        self.selected_buttons.get(index).copied()
    }

    /// Replace the whole list. Button selections reset to each state's
    /// default and the selection is clamped into the new list.
    pub fn set_processes(&mut self, processes: Vec<Process>) {
        self.processes = processes;
        self.reset_selected_buttons();

        if self.processes.is_empty() {
            self.selected = 0;
            self.scroll_offset = 0;
        } else {
            self.selected = self.selected.min(self.processes.len() - 1);
        }

        self.fit_window();
    }

    pub fn reset_selected_buttons(&mut self) {
        self.selected_buttons = self
            .processes
            .iter()
            .map(|p| ProcessButton::default_for(p.state))
            .collect();
    }

    pub fn cycle_section(&mut self) {
        self.section = self.section.toggle();
    }

    /// Move the selected process's button within its legal set, wrapping.
    pub fn cycle_selected_process_button(&mut self, direction: Direction) {
        let Some(process) = self.processes.get(self.selected) else {
            return;
        };
        let legal = ProcessButton::legal_for(process.state);

        // A stale selection outside the legal set counts as the first button.
        let current = self
            .button_for(self.selected)
            .and_then(|button| legal.iter().position(|&b| b == button))
            .unwrap_or(0);
        let next = cycle_index(current, legal.len(), direction.step());

        if let (Some(slot), Some(&button)) =
            (self.selected_buttons.get_mut(self.selected), legal.get(next))
        {
            *slot = button;
        }
    }

    /// Move the selection up or down across the whole list, wrapping, and
    /// scroll just enough to keep it visible. Only active with table focus.
    pub fn cycle_process(&mut self, direction: Direction) {
        if self.section != Section::Table || self.processes.is_empty() {
            return;
        }

        self.reset_selected_buttons();

        let last = self.processes.len() - 1;
        self.selected = match direction {
            Direction::Up if self.selected > 0 => self.selected - 1,
            Direction::Up => last,
            Direction::Down if self.selected < last => self.selected + 1,
            Direction::Down => 0,
            Direction::Left | Direction::Right => self.selected,
        };

        self.follow_selection();
    }

    /// Page the window by a quarter of its height (at least one row). A
    /// selection left outside the window moves to its last row after paging
    /// down and to its first row after paging up.
    pub fn scroll_table(&mut self, direction: Direction) {
        if self.section != Section::Table || self.processes.is_empty() {
            return;
        }

        let max_offset = self.processes.len().saturating_sub(self.visible_rows);
        match direction {
            Direction::Down => {
                self.scroll_offset = (self.scroll_offset + self.scroll_length).min(max_offset);
                if self.visible_rows > 0 && !self.in_window(self.selected) {
                    self.selected = self.scroll_offset + self.visible_rows - 1;
                }
            }
            Direction::Up => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.scroll_length);
                if self.visible_rows > 0 && !self.in_window(self.selected) {
                    self.selected = self.scroll_offset;
                }
            }
            Direction::Left | Direction::Right => {}
        }
    }

    /// Update the layout budget for this frame. Zero rows is allowed.
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows;
        self.scroll_length = (rows / 4).max(1);
        self.fit_window();
    }

    fn in_window(&self, index: usize) -> bool {
        index >= self.scroll_offset && index < self.scroll_offset + self.visible_rows
    }

    fn fit_window(&mut self) {
        let max_offset = self.processes.len().saturating_sub(self.visible_rows);
        self.scroll_offset = self.scroll_offset.min(max_offset);
        self.follow_selection();
    }

    fn follow_selection(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.visible_rows > 0 && self.selected >= self.scroll_offset + self.visible_rows {
            self.scroll_offset = self.selected + 1 - self.visible_rows;
        }
    }
}
