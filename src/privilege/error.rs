use thiserror::Error;

/// Failure of a single elevated execution
#[derive(Debug, Error)]
pub enum ExecError {
    /// The elevated channel could not be opened: binary absent, spawn denied,
    /// or su refused to grant root.
    #[error("elevated channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// The channel opened but the command did not complete cleanly.
    #[error("elevated command failed: {message}")]
    ExecutionError {
        /// Exit code, `None` when killed by a signal or never collected
        status: Option<i32>,
        message: String,
    },
}

impl ExecError {
    pub fn execution(status: Option<i32>, message: impl Into<String>) -> Self {
        ExecError::ExecutionError {
            status,
            message: message.into(),
        }
    }

    pub fn is_channel_unavailable(&self) -> bool {
        matches!(self, ExecError::ChannelUnavailable(_))
    }
}

impl From<std::io::Error> for ExecError {
    fn from(err: std::io::Error) -> Self {
        ExecError::execution(None, format!("I/O failure on elevated channel: {err}"))
    }
}
