/// Error types for the lexical simplification engine
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimplifierError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("File could not be read: {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Stage interrupted while waiting for workers: {stage}")]
    StageInterrupted { stage: &'static str },

    #[error("Precondition not met: {0}")]
    MissingPrecondition(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SimplifierError {
    /// Map an IO error raised while opening or reading `path` into the load taxonomy
    pub fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileUnreadable { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, SimplifierError>;

/// Why a single line of an input file was left out of a store.
///
/// These are recovered locally and surface only through load reports.
#[derive(Debug, Clone, PartialEq)]
pub enum LineFailureKind {
    /// A numeric field failed to parse
    MalformedEmbeddingLine { field: usize, value: String },

    /// The line names a word but carries no vector values
    MissingVector,

    /// Nothing precedes the first comma
    EmptyWord,

    /// The vector length differs from the store's fixed dimension
    DimensionMismatch { expected: usize, found: usize },

    /// The worker parsing this line failed unexpectedly
    Internal(String),
}

impl std::fmt::Display for LineFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedEmbeddingLine { field, value } => {
                write!(f, "field {} is not a number: {:?}", field, value)
            }
            Self::MissingVector => write!(f, "no vector values after the word"),
            Self::EmptyWord => write!(f, "line has no word before the first comma"),
            Self::DimensionMismatch { expected, found } => {
                write!(f, "expected {} values, found {}", expected, found)
            }
            Self::Internal(reason) => write!(f, "internal error: {}", reason),
        }
    }
}

/// A non-fatal per-line load failure (1-based line number)
#[derive(Debug, Clone, PartialEq)]
pub struct LineFailure {
    pub line_number: usize,
    pub kind: LineFailureKind,
}
