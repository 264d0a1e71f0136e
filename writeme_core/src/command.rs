use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;

use crate::WritemeError;
use crate::WritemeResult;

/// Runs shell commands and captures what they print on stdout.
///
/// By default failures are swallowed: a command that exits with a non-zero
/// status still yields whatever it printed, and a command that cannot be
/// spawned yields an empty string. Enable [`strict`](Self::strict) to turn
/// both cases into errors.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
	strict: bool,
	working_dir: Option<PathBuf>,
}

impl CommandExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Report spawn failures and non-zero exit statuses as errors.
	#[must_use]
	pub fn strict(mut self, strict: bool) -> Self {
		self.strict = strict;
		self
	}

	/// Run commands from `dir` instead of the current directory.
	#[must_use]
	pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.working_dir = Some(dir.into());
		self
	}

	pub fn is_strict(&self) -> bool {
		self.strict
	}

	/// Execute `command` through the platform shell, wait for it to finish and
	/// return its standard output.
	pub fn run(&self, command: &str) -> WritemeResult<String> {
		tracing::debug!(command, strict = self.strict, "running command");

		let output = match spawn_shell(command, self.working_dir.as_deref()) {
			Ok(output) => output,
			Err(error) if !self.strict => {
				tracing::warn!(command, %error, "failed to spawn command");
				return Ok(String::new());
			}
			Err(error) => return Err(error.into()),
		};

		if !output.status.success() {
			let status = output
				.status
				.code()
				.map_or_else(|| "unknown".to_string(), |code| code.to_string());

			if self.strict {
				return Err(WritemeError::CommandFailed {
					command: command.to_string(),
					status,
					stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
				});
			}

			tracing::warn!(command, %status, "command exited unsuccessfully");
		}

		Ok(String::from_utf8_lossy(&output.stdout).to_string())
	}
}

fn spawn_shell(command: &str, working_dir: Option<&Path>) -> std::io::Result<Output> {
	let mut shell = if cfg!(windows) {
		let mut shell = Command::new("cmd");
		shell.arg("/C");
		shell
	} else {
		let mut shell = Command::new("sh");
		shell.arg("-c");
		shell
	};

	shell.arg(command).stdin(Stdio::null());

	if let Some(dir) = working_dir {
		shell.current_dir(dir);
	}

	shell.output()
}
