//! Host command execution
//!
//! External tools are collaborators: their failures collapse to `None`
//! so callers only ever see present or absent output.

use crate::manifest::{RetryConfig, RuntimeConfig};
use chrono_machines::{BackoffStrategy, ExponentialBackoff};
use rand::rng;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Runs a program and returns its trimmed stdout on success
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<String>;
}

/// Outcome of a single invocation
#[derive(Debug)]
enum Attempt {
    Completed(String),
    Failed(String),
    TimedOut,
}

/// Create backoff strategy from RetryConfig
fn backoff_from_config(config: &RetryConfig) -> ExponentialBackoff {
    ExponentialBackoff::new()
        .base_delay_ms(config.base_delay_ms)
        .max_delay_ms(config.max_delay_ms)
        .multiplier(config.multiplier)
        .max_attempts(config.max_attempts)
        .jitter_factor(config.jitter_factor)
}

/// Read a child pipe to the end on its own thread
fn drain<P: Read + Send + 'static>(mut pipe: P) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        pipe.read_to_string(&mut buf).ok();
        buf
    })
}

/// Runs commands on the host with a timeout, retrying timeouts
#[derive(Debug, Clone)]
pub struct HostRunner {
    timeout: Duration,
    retry: RetryConfig,
}

impl HostRunner {
    pub fn new(timeout: Duration, retry: RetryConfig) -> Self {
        Self { timeout, retry }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout), config.retry.clone())
    }

    /// Execute once, enforcing the timeout
    fn attempt(&self, program: &str, args: &[&str]) -> Attempt {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return Attempt::Failed(format!("failed to spawn: {}", e)),
        };

        // Drain both pipes concurrently so neither can fill and block the child
        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let stdout = stdout_reader
                        .and_then(|h| h.join().ok())
                        .unwrap_or_default();

                    if status.success() {
                        return Attempt::Completed(stdout.trim().to_string());
                    }

                    let stderr = stderr_reader
                        .and_then(|h| h.join().ok())
                        .unwrap_or_default();
                    return Attempt::Failed(format!(
                        "exited with {}: {}",
                        status,
                        stderr.lines().next().unwrap_or("").trim()
                    ));
                }
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait(); // Reap the zombie
                        return Attempt::TimedOut;
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Attempt::Failed(format!("failed to wait: {}", e)),
            }
        }
    }
}

impl CommandRunner for HostRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        let backoff = backoff_from_config(&self.retry);
        let mut rng = rng();
        let mut attempt: u8 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            debug!(program, ?args, attempt, "running command");

            match self.attempt(program, args) {
                Attempt::Completed(stdout) => return Some(stdout),
                Attempt::Failed(reason) => {
                    debug!(program, ?args, %reason, "command failed");
                    return None;
                }
                Attempt::TimedOut => match backoff.delay(attempt, &mut rng) {
                    Some(delay_ms) => {
                        warn!(
                            program,
                            attempt,
                            delay_ms,
                            "command timed out after {}s, retrying",
                            self.timeout.as_secs()
                        );
                        thread::sleep(Duration::from_millis(delay_ms));
                    }
                    None => {
                        warn!(program, attempt, "command timed out, giving up");
                        return None;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted runner for collaborator tests

    use super::CommandRunner;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Returns canned output keyed by the full command line
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: HashMap<String, Option<String>>,
        pub calls: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond to `command_line` with `output` (`None` simulates failure)
        pub fn on(mut self, command_line: &str, output: Option<&str>) -> Self {
            self.responses
                .insert(command_line.to_string(), output.map(str::to_string));
            self
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[&str]) -> Option<String> {
            let mut line = vec![program];
            line.extend_from_slice(args);
            let line = line.join(" ");
            self.calls.borrow_mut().push(line.clone());
            self.responses.get(&line).cloned().flatten()
        }
    }
}
