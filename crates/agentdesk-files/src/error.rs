use serde::Serialize;
use thiserror::Error;

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("No workspace folder is bound")]
    NoWorkspace,

    #[error("Access denied: path is outside the workspace")]
    AccessDenied,

    #[error("Path is a directory")]
    IsDirectory,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Thread metadata is not a JSON object: {0}")]
    InvalidMetadata(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl WorkspaceError {
    /// Stable machine-readable code rendered next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            WorkspaceError::NoWorkspace => "NO_WORKSPACE",
            WorkspaceError::AccessDenied => "ACCESS_DENIED",
            WorkspaceError::IsDirectory => "IS_DIRECTORY",
            WorkspaceError::Io(_) => "IO_ERROR",
            WorkspaceError::InvalidPath(_) => "INVALID_PATH",
            WorkspaceError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            WorkspaceError::ThreadNotFound(_) => "THREAD_NOT_FOUND",
            WorkspaceError::InvalidMetadata(_) => "INVALID_METADATA",
            WorkspaceError::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<std::io::Error> for WorkspaceError {
    fn from(err: std::io::Error) -> Self {
        WorkspaceError::Io(err.to_string())
    }
}

impl From<walkdir::Error> for WorkspaceError {
    fn from(err: walkdir::Error) -> Self {
        WorkspaceError::Io(err.to_string())
    }
}

/// Error half of a plain result value.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl From<&WorkspaceError> for ErrorBody {
    fn from(err: &WorkspaceError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code(),
        }
    }
}

/// Plain result value handed to the UI layer.
///
/// Serializes as `{ "success": true, ...payload }` or
/// `{ "success": false, "error": "...", "code": "..." }`.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(flatten)]
    pub failure: Option<ErrorBody>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            failure: None,
        }
    }

    pub fn err(err: &WorkspaceError) -> Self {
        Self::fail(err.into())
    }

    /// Failure from an error body built outside this crate.
    pub fn fail(failure: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            failure: Some(failure),
        }
    }

    pub fn error_code(&self) -> Option<&'static str> {
        self.failure.as_ref().map(|f| f.code)
    }
}

impl<T> From<WorkspaceResult<T>> for Outcome<T> {
    fn from(result: WorkspaceResult<T>) -> Self {
        match result {
            Ok(data) => Outcome::ok(data),
            Err(err) => Outcome::err(&err),
        }
    }
}
