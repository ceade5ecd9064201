mod common;

use common::{failed_output, ok_output, tmp_dir, FakeRunner};
use histsync::app::App;
use histsync::errors::OpsErrorKind;
use histsync::managers::scheduler::SchedulerInstaller;
use histsync::services::config::SyncConfig;
use histsync::services::logger::{LogLevel, Logger};
use histsync::services::validation::Validation;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn config_for(dir: &Path) -> SyncConfig {
    SyncConfig {
        task_dir: dir.join("LaunchAgents"),
        executable: Some(dir.join("bin").join("histsync")),
        cwd: dir.join("work"),
        label: "com.test".to_string(),
        delay: Duration::from_secs(300),
        verify_retry_delay: Duration::from_millis(5),
        ..SyncConfig::default()
    }
}

/// launchctl that accepts `load` and lists the task starting from the
/// `listed_from`-th `list` call (`None` = never).
fn launchctl(task: &'static str, listed_from: Option<usize>) -> Arc<FakeRunner> {
    Arc::new(FakeRunner::new(move |program, args, nth| {
        assert_eq!(program, "launchctl");
        match args.first().map(String::as_str) {
            Some("load") => ok_output(program, args, ""),
            Some("list") => {
                let mut listing = String::from("PID\tStatus\tLabel\n-\t0\tcom.apple.Finder\n");
                let list_index = nth.saturating_sub(1);
                if listed_from.is_some_and(|from| list_index >= from) {
                    listing.push_str(&format!("-\t0\t{}\n", task));
                }
                ok_output(program, args, &listing)
            }
            other => panic!("unexpected launchctl args {:?}", other),
        }
    }))
}

#[tokio::test]
async fn install_writes_named_descriptor_with_interval() {
    let dir = tmp_dir("histsync-install");
    let config = config_for(&dir);
    let runner = launchctl("com.test.10.0.0.5", Some(0));
    let app = App::new(config.clone(), Logger::new("test"), runner.clone());

    let report = app.install(Some("10.0.0.5")).await.expect("install");
    assert_eq!(report.task_name, "com.test.10.0.0.5");
    assert_eq!(
        report.descriptor_path,
        dir.join("LaunchAgents").join("com.test.10.0.0.5.plist")
    );
    assert!(report.registered);

    let plist = std::fs::read_to_string(&report.descriptor_path).expect("read plist");
    assert!(plist.starts_with("<?xml"));
    assert!(plist.contains("<key>Label</key>\n  <string>com.test.10.0.0.5</string>"));
    assert!(plist.contains("<key>StartInterval</key>\n  <integer>300</integer>"));
    assert!(plist.contains(&format!(
        "<string>{}</string>",
        dir.join("bin").join("histsync").display()
    )));
    assert!(plist.contains(&format!(
        "<string>/usr/local/bin:{}:/usr/bin:/bin:/usr/sbin:/sbin:</string>",
        dir.join("bin").display()
    )));
    assert!(plist.contains(&format!(
        "<key>WorkingDirectory</key>\n  <string>{}</string>",
        dir.join("work").display()
    )));
    assert_eq!(plist.matches("<string>/tmp/tarsnap.log</string>").count(), 2);
    assert!(plist.contains("<key>RunAtLoad</key>\n  <false/>"));

    let calls = runner.calls_to("launchctl");
    assert_eq!(
        calls[0],
        vec!["load".to_string(), report.descriptor_path.display().to_string()]
    );
    assert_eq!(calls.len(), 2, "load plus a single successful list");
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn verification_retries_list_once() {
    let dir = tmp_dir("histsync-verify");
    let runner = launchctl("com.test.10.0.0.5", Some(1));
    let app = App::new(config_for(&dir), Logger::new("test"), runner.clone());

    let report = app.install(Some("10.0.0.5")).await.expect("install");
    assert!(report.registered);
    let calls = runner.calls_to("launchctl");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls.iter().filter(|args| args[0] == "load").count(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn missing_task_is_reported_not_reloaded() {
    let dir = tmp_dir("histsync-unlisted");
    let runner = launchctl("com.test.10.0.0.5", None);
    let mut logger = Logger::new("test");
    logger.set_level(LogLevel::Debug);
    let app = App::new(config_for(&dir), logger, runner.clone());

    let report = app.install(Some("10.0.0.5")).await.expect("install");
    assert!(!report.registered);
    let stats = app.logger.stats();
    assert_eq!(stats["warn"], 1);
    assert_eq!(stats["error"], 0);
    let calls = runner.calls_to("launchctl");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls.iter().filter(|args| args[0] == "load").count(), 1);
    assert!(report.descriptor_path.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn load_failure_aborts_install() {
    let dir = tmp_dir("histsync-loadfail");
    let runner = Arc::new(FakeRunner::new(|program, args, _| {
        failed_output(program, args, "Load failed: 5: Input/output error")
    }));
    let app = App::new(config_for(&dir), Logger::new("test"), runner.clone());

    let err = app.install(Some("10.0.0.5")).await.expect_err("load failed");
    assert_eq!(err.kind, OpsErrorKind::Subprocess);
    assert_eq!(runner.calls().len(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn reinstall_overwrites_descriptor() {
    let dir = tmp_dir("histsync-reinstall");
    let mut config = config_for(&dir);
    let runner = launchctl("com.test.10.0.0.5", Some(0));

    App::new(config.clone(), Logger::new("test"), runner.clone())
        .install(Some("10.0.0.5"))
        .await
        .expect("first install");
    config.delay = Duration::from_secs(90);
    let report = App::new(config, Logger::new("test"), runner)
        .install(Some("10.0.0.5"))
        .await
        .expect("second install");

    let plist = std::fs::read_to_string(&report.descriptor_path).expect("read plist");
    assert!(plist.contains("<integer>90</integer>"));
    assert!(!plist.contains("<integer>300</integer>"));
    let entries = std::fs::read_dir(dir.join("LaunchAgents")).expect("list").count();
    assert_eq!(entries, 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn descriptor_rejects_bad_label_and_zero_delay() {
    let dir = tmp_dir("histsync-descriptor");
    let config = config_for(&dir);
    let runner = launchctl("unused", None);
    let installer = SchedulerInstaller::new(Logger::new("test"), Validation::new(), runner, &config);
    let ip = "10.0.0.5".parse().expect("ip");

    let err = installer
        .descriptor("com/test", ip, &config.cwd, config.delay)
        .expect_err("slash in label");
    assert_eq!(err.kind, OpsErrorKind::InvalidParams);
    let err = installer
        .descriptor("com.test", ip, &config.cwd, Duration::from_millis(400))
        .expect_err("sub-second delay");
    assert_eq!(err.kind, OpsErrorKind::InvalidParams);

    let descriptor = installer
        .descriptor("com.test", ip, &config.cwd, Duration::from_secs(600))
        .expect("descriptor");
    assert_eq!(descriptor.start_interval, 600);
    assert_eq!(descriptor.ip, "10.0.0.5");
    assert!(!descriptor.run_at_load);
    let _ = std::fs::remove_dir_all(&dir);
}
