use crate::constants::{limits, remote, storage};
use crate::errors::OpsError;
use crate::services::command_runner::CommandRunner;
use crate::services::config::SyncConfig;
use crate::services::logger::Logger;
use crate::utils::text::truncate_utf8_suffix;
use crate::utils::user_paths::absolutize;
use chrono::{DateTime, Local};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One local copy of the remote history file.
#[derive(Debug, Clone)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub captured_at: DateTime<Local>,
}

#[derive(Clone)]
pub struct RemoteFetcher {
    logger: Logger,
    runner: Arc<dyn CommandRunner>,
    data_dir: PathBuf,
    remote_user: String,
    remote_path: String,
    connect_timeout_secs: u64,
}

impl RemoteFetcher {
    pub fn new(logger: Logger, runner: Arc<dyn CommandRunner>, config: &SyncConfig) -> Self {
        Self {
            logger: logger.child("fetch"),
            runner,
            data_dir: config.data_dir.clone(),
            remote_user: config.remote_user.clone(),
            remote_path: config.remote_path.clone(),
            connect_timeout_secs: config.connect_timeout_secs,
        }
    }

    pub fn remote_source(&self, ip: Ipv4Addr) -> String {
        format!("{}@{}:{}", self.remote_user, ip, self.remote_path)
    }

    pub async fn fetch(&self, ip: Ipv4Addr) -> Result<CaptureFile, OpsError> {
        self.fetch_at(ip, Local::now()).await
    }

    /// Copies the remote file into a new capture named after `captured_at`.
    /// The data directory is created on demand.
    pub async fn fetch_at(
        &self,
        ip: Ipv4Addr,
        captured_at: DateTime<Local>,
    ) -> Result<CaptureFile, OpsError> {
        let dir = absolutize(&self.data_dir)?;
        std::fs::create_dir_all(&dir).map_err(|err| {
            OpsError::filesystem(format!(
                "Failed to create directory {}: {}",
                dir.display(),
                err
            ))
        })?;
        let path = next_capture_path(&dir, &captured_at);

        let args = vec![
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            self.remote_source(ip),
            path.display().to_string(),
        ];
        self.logger
            .info("Copying remote bash history file to the local machine...", None);
        let output = self
            .runner
            .run(remote::COPY_PROGRAM, &args)
            .await?
            .into_success()?;

        let combined = output.combined();
        if !combined.is_empty() {
            self.logger.info(
                "Output from the scp command",
                Some(&serde_json::json!({
                    "output": truncate_utf8_suffix(&combined, limits::COMMAND_OUTPUT_LOG_BYTES),
                })),
            );
        }
        self.logger.info(
            "Successfully copied remote bash history file to the local machine.",
            Some(&serde_json::json!({ "path": path })),
        );
        Ok(CaptureFile { path, captured_at })
    }
}

pub fn capture_file_name(captured_at: &DateTime<Local>, suffix: usize) -> String {
    let stamp = captured_at.format(storage::CAPTURE_TIMESTAMP_FORMAT);
    if suffix == 0 {
        format!(
            "{}{}.{}",
            storage::CAPTURE_PREFIX,
            stamp,
            storage::CAPTURE_EXTENSION
        )
    } else {
        format!(
            "{}{}_{}.{}",
            storage::CAPTURE_PREFIX,
            stamp,
            suffix,
            storage::CAPTURE_EXTENSION
        )
    }
}

/// Timestamps only have second resolution; a second run within the same
/// second gets `_1`, `_2`, ... instead of clobbering the earlier capture.
pub fn next_capture_path(dir: &Path, captured_at: &DateTime<Local>) -> PathBuf {
    let mut suffix = 0;
    loop {
        let candidate = dir.join(capture_file_name(captured_at, suffix));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}
