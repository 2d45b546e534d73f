//! Poll a tracked branch, pull new commits and restart the supervised program.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;

use pullwatch_core::{CommandRunner, WatcherConfig};
use tracing::{debug, error, info};

use crate::git::GitRepo;
use crate::supervisor::ChildSupervisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
}

/// What happened during one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    FetchFailed,
    UpToDate,
    PullFailed,
    Updated,
}

pub struct RepoWatcher {
    config: WatcherConfig,
    git: GitRepo,
    supervisor: ChildSupervisor,
    last_commit: Option<String>,
    phase: Phase,
}

impl RepoWatcher {
    pub fn new(config: WatcherConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let git = GitRepo::new(&config.repo_path, &config.branch, runner);
        let supervisor = ChildSupervisor::new(config.child.clone(), &config.repo_path);

        let mut watcher = Self {
            config,
            git,
            supervisor,
            last_commit: None,
            phase: Phase::Idle,
        };
        watcher.last_commit = watcher.current_commit();
        watcher
    }

    pub fn last_known_commit(&self) -> Option<&str> {
        self.last_commit.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn supervisor(&mut self) -> &mut ChildSupervisor {
        &mut self.supervisor
    }

    pub fn current_commit(&self) -> Option<String> {
        match self.git.head_commit() {
            Ok(commit) => Some(commit),
            Err(e) => {
                error!("Failed to read current commit: {}", e);
                None
            }
        }
    }

    pub fn fetch_remote(&self) -> bool {
        match self.git.fetch() {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to fetch updates: {}", e);
                false
            }
        }
    }

    pub fn has_remote_update(&self) -> bool {
        match self.git.remote_tip() {
            Ok(remote) => self.last_commit.as_deref() != Some(remote.as_str()),
            Err(e) => {
                error!("Failed to check for updates: {}", e);
                false
            }
        }
    }

    pub fn pull(&mut self) -> bool {
        match self.git.pull() {
            Ok(()) => {
                self.last_commit = self.current_commit();
                info!(commit = ?self.last_commit, "Pulled new changes");
                true
            }
            Err(e) => {
                error!("Failed to pull changes: {}", e);
                false
            }
        }
    }

    pub fn restart_child(&mut self) {
        self.supervisor.restart();
    }

    /// One poll: fetch, compare, pull, restart.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.fetch_remote() {
            return TickOutcome::FetchFailed;
        }
        if !self.has_remote_update() {
            return TickOutcome::UpToDate;
        }

        info!("New changes detected");
        if !self.pull() {
            return TickOutcome::PullFailed;
        }
        self.restart_child();
        TickOutcome::Updated
    }

    /// Start the program, then poll until `shutdown` receives a message or its
    /// sender is dropped. The wait between polls is the only place shutdown is seen.
    pub fn run(&mut self, shutdown: &Receiver<()>) {
        self.phase = Phase::Running;
        info!("Watching repository at {}", self.config.repo_path.display());
        info!("Branch: {}", self.config.branch);
        info!(
            "Checking for updates every {} seconds",
            self.config.poll_interval.as_secs()
        );

        self.restart_child();

        loop {
            let outcome = self.tick();
            debug!(?outcome, "poll finished");

            match shutdown.recv_timeout(self.config.poll_interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("Stopped watching repository");
        self.supervisor.stop();
        self.phase = Phase::Stopped;
    }
}
