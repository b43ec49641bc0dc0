// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::diagnostics::Warning;
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn elapsed_secs(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a platform or retry warning with the step that produced it.
    pub fn warning(&self, warning: &Warning) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Warning [{}]: {}", warning.step, warning.message);
            }
            OutputMode::Json => self.emit_err(JsonEvent {
                event: "warning",
                message: &warning.message,
                step: Some(&warning.step),
                duration_secs: None,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => match self.elapsed_secs() {
                Some(elapsed) => println!("{message} ({elapsed:.1}s)"),
                None => println!("{message}"),
            },
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_out(JsonEvent {
                event: "success",
                message,
                step: None,
                duration_secs: self.elapsed_secs(),
            }),
        }
    }

    /// Print a result line, or `value` as one JSON line in JSON mode.
    pub fn data<T: Serialize>(&self, human: &str, value: &T) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{human}"),
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(value) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.emit_err(JsonEvent {
                event: "error",
                message,
                step: None,
                duration_secs: self.elapsed_secs(),
            }),
        }
    }

    fn emit_out(&self, event: JsonEvent<'_>) {
        if let Ok(json) = serde_json::to_string(&event) {
            println!("{json}");
        }
    }

    fn emit_err(&self, event: JsonEvent<'_>) {
        if let Ok(json) = serde_json::to_string(&event) {
            eprintln!("{json}");
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
