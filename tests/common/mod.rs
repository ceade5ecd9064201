#![allow(dead_code)]

use histsync::errors::OpsError;
use histsync::services::command_runner::{CommandOutput, CommandRunner};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn tmp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn write_lines(path: &Path, lines: &[&str]) {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content).expect("write fixture");
}

pub fn ok_output(program: &str, args: &[String], stdout: &str) -> CommandOutput {
    CommandOutput {
        program: program.to_string(),
        args: args.to_vec(),
        success: true,
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
        duration_ms: 1,
    }
}

pub fn failed_output(program: &str, args: &[String], stderr: &str) -> CommandOutput {
    CommandOutput {
        program: program.to_string(),
        args: args.to_vec(),
        success: false,
        exit_code: 1,
        stdout: String::new(),
        stderr: stderr.to_string(),
        duration_ms: 1,
    }
}

type Handler = Box<dyn Fn(&str, &[String], usize) -> CommandOutput + Send + Sync>;

/// Records every invocation and answers with `handler(program, args, nth)`,
/// where `nth` counts earlier calls to the same program.
pub struct FakeRunner {
    calls: StdMutex<Vec<(String, Vec<String>)>>,
    handler: Handler,
}

impl FakeRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &[String], usize) -> CommandOutput + Send + Sync + 'static,
    {
        Self {
            calls: StdMutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == program)
            .map(|(_, args)| args)
            .collect()
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, OpsError> {
        let nth = {
            let mut calls = self.calls.lock().expect("calls lock");
            let nth = calls.iter().filter(|(name, _)| name == program).count();
            calls.push((program.to_string(), args.to_vec()));
            nth
        };
        Ok((self.handler)(program, args, nth))
    }
}
