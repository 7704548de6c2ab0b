/*!
# Unified Error Type

This module provides a unified error enum that consolidates all Gridswarm error types
for better ergonomics and error handling consistency.
*/

use std::error::Error;
use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridswarmError>;

/// Unified error type for all Gridswarm operations.
#[derive(Debug)]
pub enum GridswarmError {
    /// General-purpose error
    Generic(String),

    /// Malformed or inconsistent input file
    InvalidInput(String),

    /// Graph structure violates a construction requirement
    InvalidGraph(String),

    /// Partitioner could not produce a valid assignment
    Partition(String),

    /// A peer zone disappeared mid-run
    PeerLost { zone: usize, message: String },

    /// Internal invariant violation; the run must abort
    Internal(String),

    /// I/O error
    IoError(String),

    /// Serialization/deserialization error
    SerializationError(String),

    /// Invalid argument or parameter
    InvalidArgument(String),
}

impl GridswarmError {
    /// Creates a generic error with the given message.
    pub fn generic(message: impl Into<String>) -> Self {
        GridswarmError::Generic(message.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        GridswarmError::InvalidInput(message.into())
    }

    /// Creates an invalid graph error.
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        GridswarmError::InvalidGraph(message.into())
    }

    /// Creates a partitioner error.
    pub fn partition(message: impl Into<String>) -> Self {
        GridswarmError::Partition(message.into())
    }

    /// Creates a peer-loss error for the given zone.
    pub fn peer_lost(zone: usize, message: impl Into<String>) -> Self {
        GridswarmError::PeerLost {
            zone,
            message: message.into(),
        }
    }

    /// Creates an internal invariant-violation error.
    pub fn internal(message: impl Into<String>) -> Self {
        GridswarmError::Internal(message.into())
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        GridswarmError::InvalidArgument(message.into())
    }
}

impl fmt::Display for GridswarmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GridswarmError::Generic(msg) => write!(f, "Gridswarm error: {}", msg),
            GridswarmError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            GridswarmError::InvalidGraph(msg) => write!(f, "Invalid graph: {}", msg),
            GridswarmError::Partition(msg) => write!(f, "Partitioner error: {}", msg),
            GridswarmError::PeerLost { zone, message } => {
                write!(f, "Lost peer zone {}: {}", zone, message)
            }
            GridswarmError::Internal(msg) => write!(f, "Internal error: {}", msg),
            GridswarmError::IoError(msg) => write!(f, "I/O error: {}", msg),
            GridswarmError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            GridswarmError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl Error for GridswarmError {}

impl From<std::io::Error> for GridswarmError {
    fn from(e: std::io::Error) -> Self {
        GridswarmError::IoError(e.to_string())
    }
}

impl From<bincode::Error> for GridswarmError {
    fn from(e: bincode::Error) -> Self {
        GridswarmError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridswarmError::generic("test error");
        assert_eq!(format!("{}", err), "Gridswarm error: test error");

        let err = GridswarmError::invalid_input("bad header");
        assert_eq!(format!("{}", err), "Invalid input: bad header");

        let err = GridswarmError::peer_lost(3, "channel closed");
        assert_eq!(format!("{}", err), "Lost peer zone 3: channel closed");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GridswarmError = io.into();
        assert!(matches!(err, GridswarmError::IoError(_)));
    }
}
