//! # Supervisor Module
//!
//! The process data source the dashboard talks to. The UI never knows how a
//! request reaches the supervisor; it only sees the [`Supervisor`] trait.
//!
//! ## Contract
//!
//! | Method | Returns |
//! |--------|---------|
//! | [`Supervisor::list_processes`] | every known process, sorted by name |
//! | [`Supervisor::get_process`] | a single process |
//! | [`Supervisor::tail_log`] | the last `byte_count` bytes of a stream |
//! | `start` / `stop` / `restart` / `clear_log` | a status line for the status panel |
//! | `stop_all` / `restart_all` | a status line for the status panel |
//!
//! The only bundled implementation is [`Supervisorctl`], which shells out to
//! the `supervisorctl` control program.

pub mod ctl;

pub use ctl::Supervisorctl;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Lifecycle state of a supervised process, as reported by Supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessState {
    Running,
    Starting,
    Stopped,
    Backoff,
    Exited,
    Fatal,
    Unknown,
}

impl ProcessState {
    /// Parse a Supervisor state name. Names outside the known set (for
    /// example `STOPPING`) become [`ProcessState::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => Self::Running,
            "STARTING" => Self::Starting,
            "STOPPED" => Self::Stopped,
            "BACKOFF" => Self::Backoff,
            "EXITED" => Self::Exited,
            "FATAL" => Self::Fatal,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Starting => "STARTING",
            Self::Stopped => "STOPPED",
            Self::Backoff => "BACKOFF",
            Self::Exited => "EXITED",
            Self::Fatal => "FATAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A process record. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub state: ProcessState,
    pub description: String,
}

impl Process {
    pub fn new(name: impl Into<String>, state: ProcessState, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state,
            description: description.into(),
        }
    }
}

/// Which output stream of a process to tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a [`Supervisor`] implementation. The process list
/// page shows their message in the status panel instead of propagating them.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Process {name} has no {stream} log")]
    NoLog { name: String, stream: LogStream },
    #[error("{command} failed: {output}")]
    Rejected { command: String, output: String },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected supervisor output: {0}")]
    Parse(String),
    #[error("no such process: {0}")]
    NotFound(String),
}

/// The process-control collaborator.
///
/// Every mutating call returns a short human-readable status string that is
/// surfaced verbatim in the status panel. Calls block the event loop for
/// their whole duration; there is never more than one in flight.
#[allow(async_fn_in_trait)]
pub trait Supervisor {
    async fn list_processes(&self) -> Result<Vec<Process>, SupervisorError>;

    async fn get_process(&self, name: &str) -> Result<Process, SupervisorError>;

    /// Fetch the most recent `byte_count` bytes of `stream`. Fails with
    /// [`SupervisorError::NoLog`] when the stream is empty.
    async fn tail_log(
        &self,
        name: &str,
        stream: LogStream,
        byte_count: usize,
    ) -> Result<String, SupervisorError>;

    async fn start(&self, name: &str) -> Result<String, SupervisorError>;

    async fn stop(&self, name: &str) -> Result<String, SupervisorError>;

    async fn clear_log(&self, name: &str) -> Result<String, SupervisorError>;

    async fn stop_all(&self) -> Result<String, SupervisorError>;

    /// Restart is stop followed by start.
    async fn restart(&self, name: &str) -> Result<String, SupervisorError> {
        self.stop(name).await?;
        self.start(name).await?;

        Ok(format!("Restarted process {name}."))
    }

    /// Restart every process currently known to the supervisor. A failed
    /// restart does not stop the rest; each failure gets its own line.
    async fn restart_all(&self) -> Result<String, SupervisorError> {
        let processes = self.list_processes().await?;

        let mut failures = Vec::new();
        for process in &processes {
            if let Err(err) = self.restart(&process.name).await {
                warn!(process = %process.name, error = %err, "restart failed");
                failures.push(err.to_string());
            }
        }

        if failures.is_empty() {
            return Ok("Restarted all processes.".to_string());
        }

        let restarted = processes.len() - failures.len();
        failures.push(format!(
            "Restarted {restarted} of {} processes.",
            processes.len()
        ));
        Ok(failures.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
        fail_stop: Option<&'static str>,
    }

    impl Supervisor for Recorder {
        async fn list_processes(&self) -> Result<Vec<Process>, SupervisorError> {
            self.calls.borrow_mut().push("list".to_string());
            Ok(vec![
                Process::new("api", ProcessState::Running, "pid 1"),
                Process::new("worker", ProcessState::Stopped, "Not started"),
            ])
        }

        async fn get_process(&self, name: &str) -> Result<Process, SupervisorError> {
            Err(SupervisorError::NotFound(name.to_string()))
        }

        async fn tail_log(
            &self,
            name: &str,
            stream: LogStream,
            _byte_count: usize,
        ) -> Result<String, SupervisorError> {
            Err(SupervisorError::NoLog {
                name: name.to_string(),
                stream,
            })
        }

        async fn start(&self, name: &str) -> Result<String, SupervisorError> {
            self.calls.borrow_mut().push(format!("start {name}"));
            Ok(format!("Started process {name}."))
        }

        async fn stop(&self, name: &str) -> Result<String, SupervisorError> {
            self.calls.borrow_mut().push(format!("stop {name}"));
            if self.fail_stop == Some(name) {
                return Err(SupervisorError::Rejected {
                    command: format!("stop {name}"),
                    output: format!("{name}: ERROR (spawn error)"),
                });
            }
            Ok(format!("Stopped process {name}."))
        }

        async fn clear_log(&self, name: &str) -> Result<String, SupervisorError> {
            Ok(format!("Cleared logs for process {name}."))
        }

        async fn stop_all(&self) -> Result<String, SupervisorError> {
            Ok("Stopped all processes.".to_string())
        }
    }

    #[test]
    fn test_state_from_name() {
        assert_eq!(ProcessState::from_name("RUNNING"), ProcessState::Running);
        assert_eq!(ProcessState::from_name("backoff"), ProcessState::Backoff);
        assert_eq!(ProcessState::from_name("STOPPING"), ProcessState::Unknown);
        assert_eq!(ProcessState::from_name(""), ProcessState::Unknown);
    }

    #[test]
    fn test_state_display_round_trips_through_from_name() {
        for state in [
            ProcessState::Running,
            ProcessState::Starting,
            ProcessState::Stopped,
            ProcessState::Backoff,
            ProcessState::Exited,
            ProcessState::Fatal,
            ProcessState::Unknown,
        ] {
            assert_eq!(ProcessState::from_name(&state.to_string()), state);
        }
    }

    #[test]
    fn test_no_log_message() {
        let err = SupervisorError::NoLog {
            name: "api".to_string(),
            stream: LogStream::Stderr,
        };
        assert_eq!(err.to_string(), "Process api has no stderr log");
    }

    #[tokio::test]
    async fn test_restart_is_stop_then_start() {
        let supervisor = Recorder::default();
        let output = supervisor.restart("api").await.unwrap();

        assert_eq!(output, "Restarted process api.");
        assert_eq!(*supervisor.calls.borrow(), vec!["stop api", "start api"]);
    }

    #[tokio::test]
    async fn test_restart_all_restarts_each_listed_process() {
        let supervisor = Recorder::default();
        let output = supervisor.restart_all().await.unwrap();

        assert_eq!(output, "Restarted all processes.");
        assert_eq!(
            *supervisor.calls.borrow(),
            vec![
                "list",
                "stop api",
                "start api",
                "stop worker",
                "start worker"
            ]
        );
    }

    #[tokio::test]
    async fn test_restart_all_continues_past_failures() {
        let supervisor = Recorder {
            fail_stop: Some("api"),
            ..Recorder::default()
        };
        let output = supervisor.restart_all().await.unwrap();

        assert_eq!(
            output,
            "stop api failed: api: ERROR (spawn error)\nRestarted 1 of 2 processes."
        );
        assert_eq!(
            *supervisor.calls.borrow(),
            vec!["list", "stop api", "stop worker", "start worker"]
        );
    }
}
