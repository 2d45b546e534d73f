pub mod git;
pub mod supervisor;
pub mod watcher;

pub use git::GitRepo;
pub use supervisor::ChildSupervisor;
pub use watcher::{Phase, RepoWatcher, TickOutcome};
