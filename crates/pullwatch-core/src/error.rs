use thiserror::Error;

#[derive(Error, Debug)]
pub enum PullwatchError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("Malformed GPU line {line:?}: {reason}")]
    GpuParse { line: String, reason: String },

    #[error("Process error: {0}")]
    Process(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PullwatchError>;
