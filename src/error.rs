/// Error types shared by every stage of the capture pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, capturing or reconstructing a dataset
#[derive(Error, Debug)]
pub enum Error {
    /// Row range where the end does not come after the start
    #[error("Starting row {start} must be strictly less than ending row {end}")]
    InvalidRange { start: usize, end: usize },

    /// Source table or export directory could not be opened
    #[error("Data not found at {path}: {source}")]
    DataNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest row resolves to a file that does not exist
    #[error("Could not locate image {0}")]
    MissingImage(PathBuf),

    /// Manifest header has no path column
    #[error("Manifest {0} has no `Path` column")]
    MissingPathColumn(PathBuf),

    /// A file name that is not an encoded capture filename
    #[error("Malformed capture filename `{name}`: {reason}")]
    MalformedFilename { name: String, reason: String },

    /// A path that cannot be encoded into a flat filename
    #[error("Cannot encode path {path}: {reason}")]
    UnencodablePath { path: PathBuf, reason: String },

    /// Two exported photos claim the same sequence number
    #[error("Sequence {sequence} appears twice ({first} and {second})")]
    DuplicateSequence {
        sequence: u64,
        first: PathBuf,
        second: PathBuf,
    },

    /// Exported photos do not line up with the source rows
    #[error("Export does not match source rows at index {index} (expected {expected:?}, found {found:?})")]
    CorrespondenceMismatch {
        index: usize,
        expected: Option<PathBuf>,
        found: Option<PathBuf>,
    },

    /// Capture device reported errors twice in a row
    #[error("Stopping transfer loop at sequence {sequence} due to server error: {message}")]
    SessionAborted { sequence: u64, message: String },

    /// Screen dimensions that cannot hold an image
    #[error("Screen dimensions must be positive, got {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// Configuration value rejected before any work starts
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filter name not present in the registry
    #[error("Unknown filter `{0}`")]
    UnknownFilter(String),

    /// The display collaborator could not show an image
    #[error("Failed to display {path}: {reason}")]
    Display { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Background task failed to complete
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for capture pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
