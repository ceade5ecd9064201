pub mod remote {
    pub const DEFAULT_USER: &str = "root";
    pub const DEFAULT_HISTORY_PATH: &str = "~/.bash_history";
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const COPY_PROGRAM: &str = "scp";
}

pub mod provisioning {
    pub const PROGRAM: &str = "terraform";
    pub const DEFAULT_DIR: &str = "terraform";
    pub const PUBLIC_IP_FIELD: &str = "instance_public_ip.value";
}

pub mod storage {
    pub const DEFAULT_DATA_DIR: &str = "./data/bash_history";
    pub const CAPTURE_PREFIX: &str = "bash_history_";
    pub const CAPTURE_EXTENSION: &str = "txt";
    pub const CAPTURE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
    pub const SUMMARY_FILE: &str = "summary.txt";
    pub const SUMMARY_MIN_LINE_BYTES: usize = 10;
    pub const FILE_MODE: u32 = 0o644;
}

pub mod schedule {
    pub const DEFAULT_LABEL: &str = "com.tarsnap";
    pub const DEFAULT_DELAY_SECS: u64 = 600;
    pub const DEFAULT_CWD: &str = ".";
    pub const TASK_DIR: &str = "~/Library/LaunchAgents";
    pub const DESCRIPTOR_EXTENSION: &str = "plist";
    pub const MANAGER_PROGRAM: &str = "launchctl";
    pub const LOG_PATH: &str = "/tmp/tarsnap.log";
    pub const PATH_PREFIX: &str = "/usr/local/bin";
    pub const PATH_SUFFIX: &str = "/usr/bin:/bin:/usr/sbin:/sbin:";
    pub const VERIFY_RETRY_DELAY_MS: u64 = 500;
}

pub mod limits {
    pub const COMMAND_OUTPUT_LOG_BYTES: usize = 4 * 1024;
}
