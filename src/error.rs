use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Assetpipe's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Assetpipe's crate-wide error type.
///
/// Every variant except `Config` is fatal to the job (or container file) it came from. The
/// scheduler turns the first job failure into `Aborted`.
#[derive(Debug, Error)]
pub enum Error {
    /// An external decoder/encoder exited non-zero or produced unusable output.
    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailure {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Container metadata is internally inconsistent.
    #[error("malformed {context}: {message}")]
    StructuralParse { context: String, message: String },

    /// Invalid combination of job arguments. Indicates a producer bug.
    #[error("usage error: {0}")]
    Usage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Terminal outcome of a failed scheduler run.
    #[error("run aborted after {failed} failed job(s) and {enumeration_errors} enumeration error(s); first failure in {job}: {first}")]
    Aborted {
        job: String,
        first: Box<Error>,
        failed: usize,
        enumeration_errors: usize,
    },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StructuralParse {
            context: context.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a `StructuralParse` error.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::StructuralParse { .. })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
