//! Platform definition for a console-attached device family.

use crate::error::PlatformError;

/// Everything the driver needs to know about a device's console dialect.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "h3c_comware").
    pub name: String,

    /// Prompt printed when the device is ready for input.
    pub prompt: String,

    /// Bytes sent to wake the console before anything else.
    pub wake_sequence: String,

    /// Appended to every command.
    pub line_ending: String,

    /// Commands to run when the session is opened (e.g. disable paging).
    pub on_open_commands: Vec<String>,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            wake_sequence: "\r\n".to_string(),
            line_ending: "\r\n".to_string(),
            on_open_commands: vec![],
            failed_when_contains: vec![],
        }
    }

    /// Replace the prompt (devices print their sysname, e.g. `<Core-SW1>`).
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the wake sequence.
    pub fn with_wake_sequence(mut self, wake: impl Into<String>) -> Self {
        self.wake_sequence = wake.into();
        self
    }

    /// Set the command line ending.
    pub fn with_line_ending(mut self, ending: impl Into<String>) -> Self {
        self.line_ending = ending.into();
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Check the definition can drive a session.
    pub fn validate(&self) -> Result<(), PlatformError> {
        if self.prompt.is_empty() {
            return Err(PlatformError::InvalidDefinition {
                message: format!("platform '{}' has an empty prompt", self.name),
            });
        }
        if self.line_ending.is_empty() {
            return Err(PlatformError::InvalidDefinition {
                message: format!("platform '{}' has an empty line ending", self.name),
            });
        }
        Ok(())
    }

    /// The bytes to send for `command`.
    pub fn command_line(&self, command: &str) -> String {
        format!("{}{}", command, self.line_ending)
    }

    /// Normalize command output: strip the command echo, turn CRLF into LF,
    /// drop surrounding blank lines.
    ///
    /// `raw` is the output before the trailing prompt.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw.trim_start();
        let output = output
            .strip_prefix(command)
            .unwrap_or(output)
            .trim_start_matches(['\r', '\n']);

        output.replace("\r\n", "\n").trim_end().to_string()
    }

    /// Detect command failure from output.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .cloned()
    }
}
