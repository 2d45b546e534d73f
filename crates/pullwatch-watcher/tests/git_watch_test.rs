//! Drives the watcher against real git repositories in temp directories.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use pullwatch_core::{SystemRunner, WatcherConfig};
use pullwatch_watcher::{RepoWatcher, TickOutcome};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(["-c", "user.name=pullwatch", "-c", "user.email=pullwatch@localhost"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git runs");
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn commit(dir: &Path, file: &str, contents: &str) -> String {
    std::fs::write(dir.join(file), contents).unwrap();
    git(dir, &["add", file]);
    git(dir, &["commit", "-q", "-m", &format!("update {file}")]);
    git(dir, &["rev-parse", "HEAD"])
}

struct Fixture {
    _root: tempfile::TempDir,
    upstream: std::path::PathBuf,
    checkout: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let upstream = root.path().join("upstream");
    let checkout = root.path().join("checkout");
    std::fs::create_dir(&upstream).unwrap();

    git(&upstream, &["init", "-q", "-b", "main"]);
    commit(&upstream, "app.txt", "v1");
    git(
        root.path(),
        &["clone", "-q", upstream.to_str().unwrap(), checkout.to_str().unwrap()],
    );

    Fixture {
        _root: root,
        upstream,
        checkout,
    }
}

fn watcher_for(checkout: &Path) -> RepoWatcher {
    let mut config = WatcherConfig::new(checkout);
    config.poll_interval = Duration::from_secs(1);
    RepoWatcher::new(config, Arc::new(SystemRunner))
}

#[test]
fn test_detects_and_pulls_new_commit() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let fx = fixture();
    let mut watcher = watcher_for(&fx.checkout);
    let initial = git(&fx.checkout, &["rev-parse", "HEAD"]);
    assert_eq!(watcher.last_known_commit(), Some(initial.as_str()));

    assert_eq!(watcher.tick(), TickOutcome::UpToDate);

    let new_tip = commit(&fx.upstream, "app.txt", "v2");
    assert_eq!(watcher.tick(), TickOutcome::Updated);
    assert_eq!(watcher.last_known_commit(), Some(new_tip.as_str()));
    assert_eq!(
        std::fs::read_to_string(fx.checkout.join("app.txt")).unwrap(),
        "v2"
    );

    assert_eq!(watcher.tick(), TickOutcome::UpToDate);
}

#[test]
fn test_unknown_branch_fails_fetch() {
    if !git_available() {
        return;
    }
    let fx = fixture();
    let mut config = WatcherConfig::new(&fx.checkout);
    config.branch = "no-such-branch".to_string();
    let mut watcher = RepoWatcher::new(config, Arc::new(SystemRunner));

    assert_eq!(watcher.tick(), TickOutcome::FetchFailed);
}

#[test]
fn test_not_a_repository() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut watcher = watcher_for(dir.path());
    assert_eq!(watcher.last_known_commit(), None);
    assert_eq!(watcher.tick(), TickOutcome::FetchFailed);
}
