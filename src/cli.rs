use crate::app::{App, Mode};
use crate::errors::OpsError;
use crate::services::config::SyncConfig;
use crate::utils::arg_aliases::normalize_go_style_flags;
use crate::utils::duration::parse_duration_arg;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Copy a remote shell history locally, deduplicate it, or schedule the copy
/// with launchd.
#[derive(Debug, Parser)]
#[command(name = "histsync", version)]
pub struct Cli {
    /// Host ip; skips `terraform output` when set
    #[arg(long)]
    pub ip: Option<String>,

    /// Prefix of the launchd job name
    #[arg(long, default_value = crate::constants::schedule::DEFAULT_LABEL)]
    pub label: String,

    /// Working directory for the launchd task
    #[arg(long, default_value = crate::constants::schedule::DEFAULT_CWD)]
    pub cwd: PathBuf,

    /// Print the unique list of lines to stdout and exit
    #[arg(long, conflicts_with = "install")]
    pub show_full: bool,

    /// Install the launchd plist and exit
    #[arg(long)]
    pub install: bool,

    /// Delay between successive fetches (Go duration, e.g. 10m, 1h30m)
    #[arg(long, default_value = "10m", value_parser = parse_duration_arg)]
    pub delay: Duration,

    /// Local directory for captures and the summary
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Remote user to copy from
    #[arg(long)]
    pub user: Option<String>,

    /// Terraform working directory
    #[arg(long)]
    pub terraform_dir: Option<PathBuf>,
}

impl Cli {
    /// Accepts both `-ip 1.2.3.4` and `--ip 1.2.3.4`.
    pub fn try_parse_args<I, S>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::try_parse_from(normalize_go_style_flags(args))
    }

    pub fn mode(&self) -> Mode {
        if self.show_full {
            Mode::ShowFull
        } else if self.install {
            Mode::Install
        } else {
            Mode::Fetch
        }
    }

    /// Flags win over environment, environment over defaults.
    pub fn apply(&self, mut config: SyncConfig) -> SyncConfig {
        config.label = self.label.clone();
        config.cwd = self.cwd.clone();
        config.delay = self.delay;
        if let Some(dir) = self.data_dir.as_ref() {
            config.data_dir = dir.clone();
        }
        if let Some(user) = self.user.as_ref() {
            config.remote_user = user.clone();
        }
        if let Some(dir) = self.terraform_dir.as_ref() {
            config.terraform_dir = dir.clone();
        }
        config
    }
}

pub async fn run<I, S>(args: I) -> Result<(), OpsError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli = match Cli::try_parse_args(args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    let config = cli.apply(SyncConfig::from_env()?);
    let app = App::initialize(config);
    let result = app.run(cli.mode(), cli.ip.as_deref()).await;
    if let Err(err) = result.as_ref() {
        let details = serde_json::to_value(err).unwrap_or_default();
        app.logger.error("Run failed", Some(&details));
    }
    result
}
