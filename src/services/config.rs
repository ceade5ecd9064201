use crate::constants::{provisioning, remote, schedule, storage};
use crate::errors::OpsError;
use crate::utils::user_paths::absolutize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Everything a run needs to know up front. Defaults mirror the historical
/// behaviour: `root@<host>:~/.bash_history` copied into `./data/bash_history`.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory holding capture files and the summary.
    pub data_dir: PathBuf,
    pub summary_file: String,
    pub summary_min_line_bytes: usize,
    pub remote_user: String,
    pub remote_path: String,
    pub connect_timeout_secs: u64,
    /// Directory `terraform -chdir` points at.
    pub terraform_dir: PathBuf,
    /// Where task descriptors are written (`~/Library/LaunchAgents`).
    pub task_dir: PathBuf,
    pub label: String,
    /// Working directory recorded in the task descriptor.
    pub cwd: PathBuf,
    pub delay: Duration,
    pub log_path: PathBuf,
    /// Program recorded in the descriptor; `None` means the running binary.
    pub executable: Option<PathBuf>,
    pub verify_retry_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(storage::DEFAULT_DATA_DIR),
            summary_file: storage::SUMMARY_FILE.to_string(),
            summary_min_line_bytes: storage::SUMMARY_MIN_LINE_BYTES,
            remote_user: remote::DEFAULT_USER.to_string(),
            remote_path: remote::DEFAULT_HISTORY_PATH.to_string(),
            connect_timeout_secs: remote::CONNECT_TIMEOUT_SECS,
            terraform_dir: PathBuf::from(provisioning::DEFAULT_DIR),
            task_dir: PathBuf::from(schedule::TASK_DIR),
            label: schedule::DEFAULT_LABEL.to_string(),
            cwd: PathBuf::from(schedule::DEFAULT_CWD),
            delay: Duration::from_secs(schedule::DEFAULT_DELAY_SECS),
            log_path: PathBuf::from(schedule::LOG_PATH),
            executable: None,
            verify_retry_delay: Duration::from_millis(schedule::VERIFY_RETRY_DELAY_MS),
        }
    }
}

fn normalize_env_value(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(trimmed.to_string())
}

fn env_value(key: &str) -> Option<String> {
    normalize_env_value(env::var(key).ok())
}

impl SyncConfig {
    /// Defaults overlaid with `HISTSYNC_*` environment variables.
    pub fn from_env() -> Result<Self, OpsError> {
        let mut config = Self::default();
        if let Some(path) = env_value("HISTSYNC_DATA_DIR") {
            config.data_dir = PathBuf::from(path);
        }
        if let Some(user) = env_value("HISTSYNC_REMOTE_USER") {
            config.remote_user = user;
        }
        if let Some(path) = env_value("HISTSYNC_REMOTE_PATH") {
            config.remote_path = path;
        }
        if let Some(path) = env_value("HISTSYNC_TERRAFORM_DIR") {
            config.terraform_dir = PathBuf::from(path);
        }
        if let Some(path) = env_value("HISTSYNC_TASK_DIR") {
            config.task_dir = PathBuf::from(path);
        }
        if let Some(raw) = env_value("HISTSYNC_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout_secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    OpsError::invalid_params(format!(
                        "HISTSYNC_CONNECT_TIMEOUT_SECS must be a positive integer, got '{}'",
                        raw
                    ))
                })?;
        }
        Ok(config)
    }

    /// Absolute location of the summary file inside the data directory.
    pub fn summary_path(&self) -> Result<PathBuf, OpsError> {
        Ok(absolutize(&self.data_dir)?.join(&self.summary_file))
    }

    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "data_dir": self.data_dir,
            "remote": format!("{}:{}", self.remote_user, self.remote_path),
            "terraform_dir": self.terraform_dir,
            "task_dir": self.task_dir,
            "label": self.label,
            "delay_secs": self.delay.as_secs(),
        })
    }
}
