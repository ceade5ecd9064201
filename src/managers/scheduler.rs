use crate::constants::schedule;
use crate::errors::OpsError;
use crate::services::command_runner::CommandRunner;
use crate::services::config::SyncConfig;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use crate::utils::fs_atomic::ensure_dir_for_file;
use crate::utils::template::{escape_xml, Template};
use crate::utils::user_paths::absolutize;
use serde::Serialize;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const PLIST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{{ label }}</string>

  <key>ProgramArguments</key>
  <array>
    <string>{{ program }}</string>
  </array>

  <key>EnvironmentVariables</key>
  <dict>
    <key>PATH</key>
    <string>{{ path_env }}</string>
  </dict>

  <key>StartInterval</key>
  <integer>{{ start_interval }}</integer>

  <key>StandardOutPath</key>
  <string>{{ log_path }}</string>

  <key>StandardErrorPath</key>
  <string>{{ log_path }}</string>

  <key>WorkingDirectory</key>
  <string>{{ working_directory }}</string>

  <key>RunAtLoad</key>
  <{{ run_at_load }}/>
</dict>
</plist>
"#;

/// Everything that goes into one launchd job.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDescriptor {
    pub label: String,
    pub ip: String,
    pub program: PathBuf,
    pub path_env: String,
    pub working_directory: PathBuf,
    pub log_path: PathBuf,
    pub start_interval: u64,
    pub run_at_load: bool,
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub task_name: String,
    pub descriptor_path: PathBuf,
    pub registered: bool,
}

pub fn task_name(label: &str, ip: Ipv4Addr) -> String {
    format!("{}.{}", label, ip)
}

/// `/usr/local/bin:<exe dir>:/usr/bin:/bin:/usr/sbin:/sbin:`
pub fn task_path_env(exe_dir: &Path) -> String {
    format!(
        "{}:{}:{}",
        schedule::PATH_PREFIX,
        exe_dir.display(),
        schedule::PATH_SUFFIX
    )
}

/// True when one row of `launchctl list` (PID, status, label) is `task`.
pub fn listing_contains(listing: &str, task: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().last() == Some(task))
}

#[derive(Clone)]
pub struct SchedulerInstaller {
    logger: Logger,
    validation: Validation,
    runner: Arc<dyn CommandRunner>,
    task_dir: PathBuf,
    log_path: PathBuf,
    executable: Option<PathBuf>,
    verify_retry_delay: Duration,
}

impl SchedulerInstaller {
    pub fn new(
        logger: Logger,
        validation: Validation,
        runner: Arc<dyn CommandRunner>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            logger: logger.child("scheduler"),
            validation,
            runner,
            task_dir: config.task_dir.clone(),
            log_path: config.log_path.clone(),
            executable: config.executable.clone(),
            verify_retry_delay: config.verify_retry_delay,
        }
    }

    fn resolve_executable(&self) -> Result<PathBuf, OpsError> {
        let exe = match self.executable.as_ref() {
            Some(path) => path.clone(),
            None => std::env::current_exe().map_err(|err| {
                OpsError::filesystem(format!("Failed to resolve executable path: {}", err))
            })?,
        };
        Ok(absolutize(exe)?)
    }

    pub fn descriptor_path(&self, task_name: &str) -> Result<PathBuf, OpsError> {
        let dir = absolutize(&self.task_dir)?;
        Ok(dir.join(format!(
            "{}.{}",
            task_name,
            schedule::DESCRIPTOR_EXTENSION
        )))
    }

    pub fn descriptor(
        &self,
        label: &str,
        ip: Ipv4Addr,
        cwd: &Path,
        delay: Duration,
    ) -> Result<TaskDescriptor, OpsError> {
        let label = self.validation.ensure_label(label)?;
        let start_interval = delay.as_secs();
        if start_interval == 0 {
            return Err(OpsError::invalid_params(format!(
                "delay must be at least one second, got {:?}",
                delay
            )));
        }
        let program = self.resolve_executable()?;
        let exe_dir = program
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        self.logger.info(
            "Resolved executable",
            Some(&serde_json::json!({ "path": program, "dir": exe_dir })),
        );
        Ok(TaskDescriptor {
            label: task_name(&label, ip),
            ip: ip.to_string(),
            path_env: task_path_env(&exe_dir),
            program,
            working_directory: absolutize(cwd)?,
            log_path: self.log_path.clone(),
            start_interval,
            run_at_load: false,
        })
    }

    pub fn render(&self, descriptor: &TaskDescriptor) -> Result<String, OpsError> {
        let template = Template::parse(PLIST_TEMPLATE)?;
        let context = serde_json::to_value(descriptor).map_err(|err| {
            OpsError::template(format!("Failed to serialize task descriptor: {}", err))
        })?;
        Ok(template.render(&context, escape_xml)?)
    }

    /// Writes the descriptor, loads it and checks that launchd picked it up.
    /// A missing entry after the retry is logged, not treated as an error.
    pub async fn install(
        &self,
        label: &str,
        ip: Ipv4Addr,
        cwd: &Path,
        delay: Duration,
    ) -> Result<InstallReport, OpsError> {
        let descriptor = self.descriptor(label, ip, cwd, delay)?;
        let path = self.descriptor_path(&descriptor.label)?;
        self.logger.info("Creating launchd .plist file...", None);
        let rendered = self.render(&descriptor)?;
        write_descriptor(&path, &rendered)?;
        self.logger.info(
            "Successfully created launchd .plist file.",
            Some(&serde_json::json!({ "path": path })),
        );

        self.load(&path).await?;
        let registered = self.verify(&descriptor.label).await?;
        Ok(InstallReport {
            task_name: descriptor.label,
            descriptor_path: path,
            registered,
        })
    }

    async fn load(&self, path: &Path) -> Result<(), OpsError> {
        let args = vec!["load".to_string(), path.display().to_string()];
        self.runner
            .run(schedule::MANAGER_PROGRAM, &args)
            .await?
            .into_success()?;
        Ok(())
    }

    async fn is_listed(&self, task: &str) -> Result<bool, OpsError> {
        let output = self
            .runner
            .run(schedule::MANAGER_PROGRAM, &["list".to_string()])
            .await?
            .into_success()?;
        Ok(listing_contains(&output.stdout, task))
    }

    /// One check, then one more after a short pause. Never re-registers.
    pub async fn verify(&self, task: &str) -> Result<bool, OpsError> {
        let mut found = self.is_listed(task).await?;
        if !found {
            tokio::time::sleep(self.verify_retry_delay).await;
            found = self.is_listed(task).await?;
        }
        let meta = serde_json::json!({ "task": task });
        if found {
            self.logger.info("Task found, load was successful", Some(&meta));
        } else {
            self.logger.warn("Task not found, load failed", Some(&meta));
        }
        Ok(found)
    }
}

fn write_descriptor(path: &Path, content: &str) -> Result<(), OpsError> {
    let create_err = |err: std::io::Error| {
        OpsError::filesystem(format!(
            "Failed to create .plist file {}: {}",
            path.display(),
            err
        ))
    };
    ensure_dir_for_file(path).map_err(create_err)?;
    let mut file = std::fs::File::create(path).map_err(create_err)?;
    file.write_all(content.as_bytes()).map_err(create_err)?;
    Ok(())
}
