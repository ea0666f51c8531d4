use std::fmt;
use std::io;

/// Failure that ends the handling of a connection.
///
/// Anything a handler can answer itself (404, 405, 500, a rejected upload)
/// is written as a response and never shows up here.
#[derive(Debug)]
pub enum HttpError {
    /// The peer sent something that is not a valid request. Answered with a
    /// best-effort 400 before the connection is torn down.
    Protocol(String),
    /// The connection itself failed (including idle timeouts). Nothing more
    /// is written.
    Io(io::Error),
}

impl HttpError {
    pub fn protocol(message: impl Into<String>) -> Self {
        HttpError::Protocol(message.into())
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            HttpError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Protocol(_) => None,
            HttpError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> Self {
        HttpError::Io(e)
    }
}
