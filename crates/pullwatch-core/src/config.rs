use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PullwatchError, Result};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5048;

/// Program restarted after every successful pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ChildCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Relative paths such as `./run.sh` or `bin/app` live inside the repository;
    /// bare names are left for `PATH` lookup.
    pub fn resolve_program(&self, repo_path: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            repo_path.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub repo_path: PathBuf,
    pub branch: String,
    pub poll_interval: Duration,
    pub child: Option<ChildCommand>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            branch: DEFAULT_BRANCH.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            child: None,
        }
    }
}

impl WatcherConfig {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.branch.trim().is_empty() {
            return Err(PullwatchError::Config("branch must not be empty".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(PullwatchError::Config(
                "poll interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT` and `MODE` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| PullwatchError::Config(format!("PORT is not a valid port: {raw:?}")))?,
            None => DEFAULT_PORT,
        };
        let debug = lookup("MODE").as_deref() == Some("dev");

        Ok(Self { host, port, debug })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
