use crate::constants::limits::COMMAND_OUTPUT_LOG_BYTES;
use crate::errors::OpsError;
use crate::services::logger::Logger;
use crate::utils::text::truncate_utf8_suffix;
use serde::Serialize;
use std::process::Stdio;

/// Captured result of one finished subprocess.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandOutput {
    pub program: String,
    pub args: Vec<String>,
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

impl CommandOutput {
    pub fn command_line(&self) -> String {
        render_command_line(&self.program, &self.args)
    }

    /// stdout followed by stderr, the way a terminal would interleave a
    /// quiet tool's output.
    pub fn combined(&self) -> String {
        let mut out = String::new();
        out.push_str(self.stdout.trim_end_matches(&['\r', '\n'][..]));
        let stderr = self.stderr.trim_end_matches(&['\r', '\n'][..]);
        if !stderr.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(stderr);
        }
        out
    }

    pub fn into_success(self) -> Result<Self, OpsError> {
        if self.success {
            return Ok(self);
        }
        let tail = truncate_utf8_suffix(&self.combined(), COMMAND_OUTPUT_LOG_BYTES);
        Err(OpsError::subprocess(format!(
            "Command `{}` exited with status {}",
            self.command_line(),
            self.exit_code
        ))
        .with_details(serde_json::json!({
            "program": self.program,
            "exit_code": self.exit_code,
            "output": tail,
        })))
    }
}

pub fn render_command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        return program.to_string();
    }
    format!("{} {}", program, args.join(" "))
}

/// The only way this crate talks to external tools.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` to completion. Spawn failures are errors; a
    /// non-zero exit is reported through `CommandOutput::success`.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, OpsError>;
}

#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    logger: Logger,
}

impl SystemCommandRunner {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("exec"),
        }
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, OpsError> {
        let command_line = render_command_line(program, args);
        self.logger.info(
            "Executing command",
            Some(&serde_json::json!({ "command": command_line })),
        );

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let started = chrono::Utc::now().timestamp_millis();
        let output = cmd.output().await.map_err(|err| {
            OpsError::subprocess(format!("Failed to spawn `{}`: {}", program, err))
                .with_hint(format!("Make sure `{}` is installed and on PATH.", program))
        })?;
        let duration_ms = chrono::Utc::now().timestamp_millis() - started;

        let result = CommandOutput {
            program: program.to_string(),
            args: args.to_vec(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms,
        };
        self.logger.debug(
            "Command finished",
            Some(&serde_json::json!({
                "command": command_line,
                "exit_code": result.exit_code,
                "duration_ms": duration_ms,
            })),
        );
        Ok(result)
    }
}
