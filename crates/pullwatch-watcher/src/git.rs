//! The handful of git commands the watcher needs, run in the watched repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pullwatch_core::command::run_checked;
use pullwatch_core::{CommandRunner, Result};
use tracing::instrument;

const GIT: &str = "git";
const REMOTE: &str = "origin";

pub struct GitRepo {
    path: PathBuf,
    branch: String,
    runner: Arc<dyn CommandRunner>,
}

impl GitRepo {
    pub fn new(path: impl Into<PathBuf>, branch: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            path: path.into(),
            branch: branch.into(),
            runner,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let out = run_checked(self.runner.as_ref(), GIT, args, Some(&self.path))?;
        Ok(out.stdout_trimmed().to_string())
    }

    /// `git rev-parse HEAD`
    #[instrument(skip(self), fields(repo = %self.path.display()))]
    pub fn head_commit(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }

    /// `git fetch origin <branch>`
    #[instrument(skip(self), fields(repo = %self.path.display(), branch = %self.branch))]
    pub fn fetch(&self) -> Result<()> {
        self.git(&["fetch", REMOTE, &self.branch]).map(|_| ())
    }

    /// `git rev-parse origin/<branch>`
    #[instrument(skip(self), fields(repo = %self.path.display(), branch = %self.branch))]
    pub fn remote_tip(&self) -> Result<String> {
        let tracking = format!("{REMOTE}/{}", self.branch);
        self.git(&["rev-parse", &tracking])
    }

    /// `git pull origin <branch>`
    #[instrument(skip(self), fields(repo = %self.path.display(), branch = %self.branch))]
    pub fn pull(&self) -> Result<()> {
        self.git(&["pull", REMOTE, &self.branch]).map(|_| ())
    }
}
