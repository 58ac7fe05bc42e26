//! Native directory pickers.

use async_trait::async_trait;
use tokio::process::Command;

use super::{DirectoryPicker, PickerResult};

/// Runs an external dialog program (`zenity`, `kdialog`, `osascript` ...)
/// and reads the chosen directories from its stdout, one per line.
///
/// A non-zero exit status or empty output counts as a cancel.
#[derive(Debug, Clone)]
pub struct CommandPicker {
    program: String,
    args: Vec<String>,
}

impl CommandPicker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a `[program, args...]` list. Empty lists yield `None`.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

#[async_trait]
impl DirectoryPicker for CommandPicker {
    async fn show(&self) -> PickerResult {
        let output = match Command::new(&self.program).args(&self.args).output().await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to launch directory picker {}: {}", self.program, e);
                return PickerResult::canceled();
            }
        };

        if !output.status.success() {
            tracing::debug!("Directory picker exited with {}", output.status);
            return PickerResult::canceled();
        }

        let paths: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if paths.is_empty() {
            return PickerResult::canceled();
        }

        PickerResult {
            canceled: false,
            paths,
        }
    }
}

/// Picker for headless deployments. Every dialog is "canceled".
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePicker;

#[async_trait]
impl DirectoryPicker for UnavailablePicker {
    async fn show(&self) -> PickerResult {
        PickerResult::canceled()
    }
}
