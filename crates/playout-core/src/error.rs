//! Stage error types

use thiserror::Error;

/// Errors that can occur on the stage command and render paths
#[derive(Error, Debug, Clone)]
pub enum StageError {
    /// The stage's executor worker has been shut down
    #[error("stage executor has shut down")]
    ExecutorShutdown,

    /// A producer failed to yield a frame
    #[error("producer `{producer}` failed: {message}")]
    Producer { producer: String, message: String },

    /// The foreground producer does not implement the call capability
    #[error("producer `{0}` does not support call")]
    UnsupportedCall(String),

    /// A transform update callback rejected the current transform
    #[error("transform update failed: {0}")]
    Transform(String),

    /// A route consumer rejected a frame
    #[error("route consumer `{consumer}` rejected frame: {message}")]
    Consumer { consumer: String, message: String },
}

impl StageError {
    /// Wrap a producer failure with the producer's name
    pub fn producer(name: &str, message: impl Into<String>) -> Self {
        Self::Producer {
            producer: name.to_string(),
            message: message.into(),
        }
    }

    /// Wrap a consumer failure with the consumer's name
    pub fn consumer(name: &str, message: impl Into<String>) -> Self {
        Self::Consumer {
            consumer: name.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for stage operations
pub type StageResult<T> = Result<T, StageError>;
