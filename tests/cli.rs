//! Exit-status tests for the `chainfeeds` binary.
//!
//! These run without an API key and without network access.

use std::path::PathBuf;
use std::process::{Command, Output};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("chainfeeds_cli_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(dir: &PathBuf, args: &[&str]) -> Output {
    let config = dir.join("chainfeeds.toml");
    std::fs::write(
        &config,
        format!(
            "store_path = {:?}\ndead_feeds_path = {:?}\n",
            dir.join("feeds.opml").display().to_string(),
            dir.join("dead.json").display().to_string()
        ),
    )
    .unwrap();

    Command::new(env!("CARGO_BIN_EXE_chainfeeds"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("BRAVE_SEARCH_API_KEY")
        .env_remove("DEAD_FEEDS_PATH")
        .output()
        .unwrap()
}

#[test]
fn test_sync_with_discover_but_no_key_still_succeeds() {
    let dir = temp_dir("sync_no_key");
    let output = run(&dir, &["sync", "--discover"]);

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Registry Sync Report"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BRAVE_SEARCH_API_KEY"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_discover_without_key_fails() {
    let dir = temp_dir("discover_no_key");
    let output = run(&dir, &["discover"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BRAVE_SEARCH_API_KEY is required for discovery"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_probe_without_homepage_is_usage_error() {
    let dir = temp_dir("probe_usage");
    let output = run(&dir, &["probe"]);

    assert_eq!(output.status.code(), Some(2));

    let _ = std::fs::remove_dir_all(&dir);
}
