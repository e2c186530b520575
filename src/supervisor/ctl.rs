//! # supervisorctl Backend
//!
//! Implements [`Supervisor`] by running the `supervisorctl` control program
//! and parsing its plain-text output.
//!
//! ## Commands
//!
//! | Operation | Invocation |
//! |-----------|------------|
//! | list | `supervisorctl status` |
//! | get | `supervisorctl status NAME` |
//! | tail | `supervisorctl tail -BYTES NAME stdout\|stderr` |
//! | start / stop | `supervisorctl start NAME` / `supervisorctl stop NAME` |
//! | restart | `stop NAME` (a `not running` error is fine), then `start NAME` |
//! | clear log | `supervisorctl clear NAME` |
//! | stop all | `supervisorctl stop all` |
//!
//! `-c FILE` and `-s URL` are prepended when configured, so the same binary can
//! reach a non-default `supervisord.conf` or a socket/HTTP server URL.
//!
//! `supervisorctl status` exits non-zero whenever any process is not running,
//! so its exit status only counts as a failure when no process line parsed. Mutating
//! commands report failures as `NAME: ERROR (reason)` lines.

use super::{LogStream, Process, ProcessState, Supervisor, SupervisorError};
use crate::config::Config;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A [`Supervisor`] backed by the `supervisorctl` command-line client.
#[derive(Debug, Clone)]
pub struct Supervisorctl {
    program: PathBuf,
    supervisor_config: Option<PathBuf>,
    server_url: Option<String>,
}

impl Supervisorctl {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            supervisor_config: None,
            server_url: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.supervisorctl.clone(),
            supervisor_config: config.supervisor_config.clone(),
            server_url: config.server_url.clone(),
        }
    }

    /// Full argument list for a supervisorctl invocation.
    fn args(&self, command: &[&str]) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref path) = self.supervisor_config {
            args.push("-c".to_string());
            args.push(path.display().to_string());
        }
        if let Some(ref url) = self.server_url {
            args.push("-s".to_string());
            args.push(url.clone());
        }
        args.extend(command.iter().map(|s| (*s).to_string()));
        args
    }

    /// Run a command and return `(success, stdout + stderr)`.
    async fn run(&self, command: &[&str]) -> Result<(bool, String), SupervisorError> {
        let args = self.args(command);
        debug!(program = %self.program.display(), ?args, "running supervisorctl");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| SupervisorError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok((output.status.success(), text))
    }

    /// Run a mutating command, turning `NAME: ERROR` output into a rejection.
    async fn control(&self, command: &[&str]) -> Result<(), SupervisorError> {
        let (success, output) = self.run(command).await?;
        if !success || reports_error(&output) {
            return Err(rejected(command, &output));
        }

        Ok(())
    }
}

/// supervisorctl prefixes per-process failures with `NAME: ERROR`.
fn reports_error(output: &str) -> bool {
    output.lines().any(|line| line.contains(": ERROR"))
}

fn rejected(command: &[&str], output: &str) -> SupervisorError {
    SupervisorError::Rejected {
        command: command.join(" "),
        output: output.trim().to_string(),
    }
}

/// Parse `supervisorctl status` output into process records sorted by name.
///
/// Each line is `NAME STATE DESCRIPTION`; error lines such as
/// `foo: ERROR (no such process)` are skipped.
pub fn parse_status(output: &str) -> Result<Vec<Process>, SupervisorError> {
    let line_re = Regex::new(r"^(\S+)\s+([A-Z]+)\b\s*(.*)$")
        .map_err(|e| SupervisorError::Parse(e.to_string()))?;

    let mut processes: Vec<Process> = output
        .lines()
        .filter_map(|line| {
            let caps = line_re.captures(line.trim_end())?;
            let name = caps.get(1)?.as_str();
            if name.ends_with(':') {
                return None;
            }

            Some(Process::new(
                name,
                ProcessState::from_name(caps.get(2)?.as_str()),
                caps.get(3).map_or("", |m| m.as_str()).trim(),
            ))
        })
        .collect();

    processes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(processes)
}

impl Supervisor for Supervisorctl {
    async fn list_processes(&self) -> Result<Vec<Process>, SupervisorError> {
        let (success, output) = self.run(&["status"]).await?;
        let processes = parse_status(&output)?;

        // A non-zero exit with process lines only means some are not running.
        if !success && processes.is_empty() {
            return Err(rejected(&["status"], &output));
        }

        Ok(processes)
    }

    async fn get_process(&self, name: &str) -> Result<Process, SupervisorError> {
        let (_, output) = self.run(&["status", name]).await?;
        parse_status(&output)?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SupervisorError::NotFound(name.to_string()))
    }

    async fn tail_log(
        &self,
        name: &str,
        stream: LogStream,
        byte_count: usize,
    ) -> Result<String, SupervisorError> {
        let bytes = format!("-{byte_count}");
        let command = ["tail", bytes.as_str(), name, stream.as_str()];
        let (success, output) = self.run(&command).await?;

        if !success || output.starts_with(&format!("{name}: ERROR")) {
            return Err(rejected(&command, &output));
        }

        if output.is_empty() {
            return Err(SupervisorError::NoLog {
                name: name.to_string(),
                stream,
            });
        }

        Ok(output)
    }

    async fn start(&self, name: &str) -> Result<String, SupervisorError> {
        self.control(&["start", name]).await?;
        Ok(format!("Started process {name}."))
    }

    async fn stop(&self, name: &str) -> Result<String, SupervisorError> {
        self.control(&["stop", name]).await?;
        Ok(format!("Stopped process {name}."))
    }

    /// Stop then start. A process that is already down still gets started.
    async fn restart(&self, name: &str) -> Result<String, SupervisorError> {
        let command = ["stop", name];
        let (success, output) = self.run(&command).await?;
        let not_running = output.contains("ERROR (not running)");
        if !not_running && (!success || reports_error(&output)) {
            return Err(rejected(&command, &output));
        }

        self.control(&["start", name]).await?;
        Ok(format!("Restarted process {name}."))
    }

    async fn clear_log(&self, name: &str) -> Result<String, SupervisorError> {
        self.control(&["clear", name]).await?;
        Ok(format!("Cleared logs for process {name}."))
    }

    async fn stop_all(&self) -> Result<String, SupervisorError> {
        self.control(&["stop", "all"]).await?;
        Ok("Stopped all processes.".to_string())
    }
}
