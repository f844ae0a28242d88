//! Error types
//!
//! Every I/O boundary in the crate funnels its failures through [`Error`],
//! and [`Error::kind`] classifies them so callers can apply the right
//! policy: disconnects end a connection quietly, malformed input and storage
//! failures become a 500 for the requesting client only.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server and engine operations
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or persisting the shared document failed
    #[error("storage failure: {0}")]
    Storage(String),

    /// The client sent something we cannot accept
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The peer went away mid-request or mid-stream
    #[error("client disconnected")]
    Disconnected,

    /// Socket-level I/O error
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Peer closed the connection, broken pipe, reset
    Disconnect,
    /// Invalid request body
    MalformedInput,
    /// Document could not be read or written
    Storage,
    /// Anything else
    Internal,
}

impl Error {
    /// Build a storage error from anything displayable
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage(err.to_string())
    }

    /// Build a malformed-input error from anything displayable
    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Error::MalformedInput(err.to_string())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Storage(_) => ErrorKind::Storage,
            Error::MalformedInput(_) => ErrorKind::MalformedInput,
            Error::Disconnected => ErrorKind::Disconnect,
            Error::Io(e) if is_disconnect(e) => ErrorKind::Disconnect,
            Error::Io(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error is an expected client disconnect
    pub fn is_disconnect(&self) -> bool {
        self.kind() == ErrorKind::Disconnect
    }
}

/// Whether an I/O error means the peer is gone
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}

/// Whether a hyper error means the peer is gone
pub fn is_hyper_disconnect(err: &hyper::Error) -> bool {
    if err.is_incomplete_message() || err.is_canceled() || err.is_closed() {
        return true;
    }

    // Walk the source chain for an underlying socket error
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            return is_disconnect(io_err);
        }
        source = inner.source();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_disconnect_classification() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
        ] {
            let err = Error::from(io::Error::new(kind, "gone"));
            assert_eq!(err.kind(), ErrorKind::Disconnect);
            assert!(err.is_disconnect());
        }
    }

    #[test]
    fn test_other_io_is_internal() {
        let err = Error::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_domain_classification() {
        assert_eq!(Error::storage("disk full").kind(), ErrorKind::Storage);
        assert_eq!(Error::malformed("bad json").kind(), ErrorKind::MalformedInput);
        assert_eq!(Error::Disconnected.kind(), ErrorKind::Disconnect);
    }

    #[test]
    fn test_display() {
        let err = Error::storage("permission denied");
        assert_eq!(err.to_string(), "storage failure: permission denied");
    }
}
