//! Shared fixtures for the integration tests: a scripted key source, an
//! in-memory supervisor and buffer helpers.

#![allow(dead_code)]

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::style::Modifier;
use ratatui::Terminal;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;
use supervisor_tui::supervisor::{
    LogStream, Process, ProcessState, Supervisor, SupervisorError,
};
use supervisor_tui::ui::{EventReader, Screen};

/// Replays a fixed list of key presses, one per poll. Once the script runs
/// out it sends `Ctrl+C` so a test can never spin forever.
pub struct ScriptedEvents {
    events: VecDeque<Event>,
}

impl ScriptedEvents {
    pub fn new(keys: &[KeyCode]) -> Self {
        Self {
            events: keys.iter().map(|&code| key_event(code)).collect(),
        }
    }
}

impl EventReader for ScriptedEvents {
    fn read_event(&mut self, _timeout: Duration) -> io::Result<Option<Event>> {
        Ok(Some(self.events.pop_front().unwrap_or_else(|| {
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
        })))
    }
}

pub fn key_event(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
}

/// An initialized 110x20 screen fed by `keys`.
pub fn screen(keys: &[KeyCode]) -> Screen<TestBackend> {
    screen_sized(110, 20, keys)
}

pub fn screen_sized(width: u16, height: u16, keys: &[KeyCode]) -> Screen<TestBackend> {
    let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    let mut screen = Screen::new(terminal, Box::new(ScriptedEvents::new(keys)));
    screen.initialize().unwrap();
    screen
}

pub fn row_text(buffer: &Buffer, row: u16) -> String {
    (0..buffer.area.width)
        .map(|x| buffer[(x, row)].symbol())
        .collect()
}

pub fn is_reversed(buffer: &Buffer, col: u16, row: u16) -> bool {
    buffer[(col, row)].modifier.contains(Modifier::REVERSED)
}

/// Column where `needle` starts on `row`.
pub fn find_col(buffer: &Buffer, row: u16, needle: &str) -> Option<u16> {
    row_text(buffer, row)
        .find(needle)
        .and_then(|byte| u16::try_from(row_text(buffer, row)[..byte].chars().count()).ok())
}

/// Records every call and answers from canned data.
#[derive(Default)]
pub struct MockSupervisor {
    pub processes: RefCell<Vec<Process>>,
    pub calls: RefCell<Vec<String>>,
    pub tail_requests: RefCell<Vec<(String, LogStream, usize)>>,
    pub log: Option<String>,
    pub action_output: Option<String>,
    pub fail_list: Cell<bool>,
}

impl MockSupervisor {
    pub fn with_processes(processes: Vec<Process>) -> Self {
        Self {
            processes: RefCell::new(processes),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn output(&self, default: String) -> String {
        self.action_output.clone().unwrap_or(default)
    }
}

impl Supervisor for MockSupervisor {
    async fn list_processes(&self) -> Result<Vec<Process>, SupervisorError> {
        self.record("list".to_string());
        if self.fail_list.get() {
            return Err(SupervisorError::Rejected {
                command: "status".to_string(),
                output: "connection refused".to_string(),
            });
        }
        Ok(self.processes.borrow().clone())
    }

    async fn get_process(&self, name: &str) -> Result<Process, SupervisorError> {
        self.processes
            .borrow()
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| SupervisorError::NotFound(name.to_string()))
    }

    async fn tail_log(
        &self,
        name: &str,
        stream: LogStream,
        byte_count: usize,
    ) -> Result<String, SupervisorError> {
        self.tail_requests
            .borrow_mut()
            .push((name.to_string(), stream, byte_count));
        self.log.clone().ok_or_else(|| SupervisorError::NoLog {
            name: name.to_string(),
            stream,
        })
    }

    async fn start(&self, name: &str) -> Result<String, SupervisorError> {
        self.record(format!("start {name}"));
        Ok(self.output(format!("Started process {name}.")))
    }

    async fn stop(&self, name: &str) -> Result<String, SupervisorError> {
        self.record(format!("stop {name}"));
        Ok(self.output(format!("Stopped process {name}.")))
    }

    async fn clear_log(&self, name: &str) -> Result<String, SupervisorError> {
        self.record(format!("clear_log {name}"));
        Ok(self.output(format!("Cleared logs for process {name}.")))
    }

    async fn stop_all(&self) -> Result<String, SupervisorError> {
        self.record("stop_all".to_string());
        Ok(self.output("Stopped all processes.".to_string()))
    }
}

pub fn process(name: &str, state: ProcessState) -> Process {
    Process::new(name, state, format!("{name} description"))
}
