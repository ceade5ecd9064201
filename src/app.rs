use crate::errors::OpsError;
use crate::managers::aggregate::{Aggregate, LineAggregator};
use crate::managers::dedup::{DedupStats, Deduplicator, LineSet};
use crate::managers::fetcher::{CaptureFile, RemoteFetcher};
use crate::managers::resolver::IpResolver;
use crate::managers::scheduler::{InstallReport, SchedulerInstaller};
use crate::services::command_runner::{CommandRunner, SystemCommandRunner};
use crate::services::config::SyncConfig;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use crate::utils::user_paths::absolutize;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fetch,
    Install,
    ShowFull,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub ip: Ipv4Addr,
    pub capture: CaptureFile,
    pub files: usize,
    pub stats: DedupStats,
    pub summary_path: PathBuf,
    pub summary_lines: usize,
}

/// Wires the steps together for one run. Each step finishes before the next
/// starts and the first error ends the run.
pub struct App {
    pub logger: Logger,
    pub config: SyncConfig,
    validation: Validation,
    runner: Arc<dyn CommandRunner>,
}

impl App {
    pub fn new(config: SyncConfig, logger: Logger, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            logger,
            config,
            validation: Validation::new(),
            runner,
        }
    }

    pub fn initialize(config: SyncConfig) -> Self {
        let logger = Logger::new("histsync");
        let runner = Arc::new(SystemCommandRunner::new(logger.clone()));
        Self::new(config, logger, runner)
    }

    fn resolver(&self) -> IpResolver {
        IpResolver::new(
            self.logger.clone(),
            self.validation.clone(),
            self.runner.clone(),
            self.config.terraform_dir.clone(),
        )
    }

    fn aggregator(&self) -> LineAggregator {
        LineAggregator::new(self.logger.clone()).exclude(self.config.summary_file.clone())
    }

    fn deduplicator(&self) -> Deduplicator {
        Deduplicator::new(self.logger.clone(), self.config.summary_min_line_bytes)
    }

    pub async fn run(&self, mode: Mode, ip: Option<&str>) -> Result<(), OpsError> {
        self.logger
            .debug("Starting run", Some(&self.config.describe()));
        match mode {
            Mode::Fetch => self.fetch(ip).await.map(|_| ()),
            Mode::Install => self.install(ip).await.map(|_| ()),
            Mode::ShowFull => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                self.show_full(&mut lock).map(|_| ())
            }
        }
    }

    /// resolve → copy → aggregate → summarize.
    pub async fn fetch(&self, ip: Option<&str>) -> Result<FetchReport, OpsError> {
        let ip = self.resolver().resolve(ip).await?;
        let fetcher = RemoteFetcher::new(self.logger.clone(), self.runner.clone(), &self.config);
        let capture = fetcher.fetch(ip).await?;

        let data_dir = absolutize(&self.config.data_dir)?;
        let aggregate = self.aggregator().aggregate(&data_dir)?;
        self.log_file_summary(&aggregate);

        let dedup = self.deduplicator();
        let (set, stats) = dedup.unique(&aggregate.lines);
        let summary_path = self.config.summary_path()?;
        let summary_lines = dedup.write_summary(&summary_path, &set)?;
        self.logger.info("Finished.", Some(&self.logger.stats()));

        Ok(FetchReport {
            ip,
            capture,
            files: aggregate.file_count(),
            stats,
            summary_path,
            summary_lines,
        })
    }

    fn log_file_summary(&self, aggregate: &Aggregate) {
        self.logger.info("Summary of data files:", None);
        for (path, count) in &aggregate.line_counts {
            self.logger.info(
                "File line count",
                Some(&serde_json::json!({ "file": path, "lines": count })),
            );
        }
    }

    pub async fn install(&self, ip: Option<&str>) -> Result<InstallReport, OpsError> {
        let ip = self.resolver().resolve(ip).await?;
        let installer = SchedulerInstaller::new(
            self.logger.clone(),
            self.validation.clone(),
            self.runner.clone(),
            &self.config,
        );
        let report = installer
            .install(&self.config.label, ip, &self.config.cwd, self.config.delay)
            .await?;
        self.logger.info("Finished.", Some(&self.logger.stats()));
        Ok(report)
    }

    /// Current unique set of every capture, one line each, without the
    /// summary's length filter.
    pub fn unique_lines(&self) -> Result<LineSet, OpsError> {
        let data_dir = absolutize(&self.config.data_dir)?;
        let aggregate = self.aggregator().aggregate(&data_dir)?;
        let (set, _) = self.deduplicator().unique(&aggregate.lines);
        Ok(set)
    }

    pub fn show_full<W: Write>(&self, out: &mut W) -> Result<usize, OpsError> {
        let set = self.unique_lines()?;
        for line in &set {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(set.len())
    }
}
