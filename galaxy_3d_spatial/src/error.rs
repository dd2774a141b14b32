//! Error types for the Galaxy3D spatial index
//!
//! This module defines the recoverable failures reported by the octree.
//! Internal invariant violations are not represented here: they panic.

use std::fmt;

/// Result type for spatial index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Spatial index errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The element is not tracked by the octree
    ElementNotFound(String),

    /// A position with NaN or infinite coordinates was supplied
    InvalidPosition(String),

    /// Construction parameters are unusable
    InvalidConfig(String),

    /// A previous operation panicked while holding the octree lock
    LockPoisoned,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ElementNotFound(msg) => write!(f, "Element not found: {}", msg),
            Error::InvalidPosition(msg) => write!(f, "Invalid position: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::LockPoisoned => write!(f, "Octree lock poisoned"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
