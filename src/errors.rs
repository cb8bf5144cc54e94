use std::fmt;

/// Errors that can surface from the public [`crate::coordinator::BufferMgr`] API.
#[derive(Debug)]
pub enum Error {
    /// `pin` could not secure a frame within `MAX_WAIT`, or the wait was interrupted.
    BufferAbort,
    /// A `BlockStore`/`LogStore` adapter reported an I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferAbort => write!(f, "BufferAbort: timed out waiting for a free frame"),
            Error::Io(e) => write!(f, "I/O failure in block store or log adapter: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::BufferAbort => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
