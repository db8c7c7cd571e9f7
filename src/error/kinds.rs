use std::{fmt, io};

/// Crate-wide `Result` type using [`ExportError`] as the error.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Top-level error type for export runs.
#[derive(Debug)]
pub enum ExportError {
    /// Could not establish a session with the document source.
    Connection(ConnectionError),

    /// Invalid or unreadable configuration.
    Config(ConfigError),

    /// Failure while listing or reading documents.
    Source(SourceError),

    /// Failure while building or persisting a worksheet.
    Sink(SinkError),

    /// I/O errors.
    Io(io::Error),

    /// The run was cancelled before the operation completed.
    Cancelled,

    /// Generic error with a free-form message.
    Generic(String),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// The connection string could not be parsed.
    InvalidUri(String),

    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Ping command failed.
    PingFailed(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// Errors raised by the document source.
#[derive(Debug)]
pub enum SourceError {
    /// Enumerating collections failed.
    ListFailed { database: String, message: String },

    /// Opening or advancing a cursor failed.
    QueryFailed { collection: String, message: String },
}

/// Errors raised while producing a spreadsheet.
#[derive(Debug)]
pub enum SinkError {
    /// Writing a cell or configuring the sheet failed.
    WriteFailed(String),

    /// Persisting the workbook failed.
    SaveFailed { path: String, message: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Connection(e) => write!(f, "Connection error: {e}"),
            ExportError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportError::Source(e) => write!(f, "Source error: {e}"),
            ExportError::Sink(e) => write!(f, "Sink error: {e}"),
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
            ExportError::Cancelled => write!(f, "Operation cancelled"),
            ExportError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::InvalidUri(msg) => write!(f, "Invalid connection string: {msg}"),
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::ListFailed { database, message } => {
                write!(f, "Failed to list collections of '{database}': {message}")
            }
            SourceError::QueryFailed {
                collection,
                message,
            } => write!(f, "Query on '{collection}' failed: {message}"),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::WriteFailed(msg) => write!(f, "Failed to write sheet: {msg}"),
            SinkError::SaveFailed { path, message } => {
                write!(f, "Failed to save '{path}': {message}")
            }
        }
    }
}

impl std::error::Error for ExportError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for SourceError {}
impl std::error::Error for SinkError {}

/* ========================= Conversions to ExportError ========================= */

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Sink(SinkError::WriteFailed(err.to_string()))
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<ConnectionError> for ExportError {
    fn from(err: ConnectionError) -> Self {
        ExportError::Connection(err)
    }
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        ExportError::Config(err)
    }
}

impl From<SourceError> for ExportError {
    fn from(err: SourceError) -> Self {
        ExportError::Source(err)
    }
}

impl From<SinkError> for ExportError {
    fn from(err: SinkError) -> Self {
        ExportError::Sink(err)
    }
}

impl From<String> for ExportError {
    fn from(msg: String) -> Self {
        ExportError::Generic(msg)
    }
}

impl From<&str> for ExportError {
    fn from(msg: &str) -> Self {
        ExportError::Generic(msg.to_owned())
    }
}
