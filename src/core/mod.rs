//! Core types and error handling for wireup.
//!
//! This module is the foundation of the crate's type system:
//!
//! - [`WireupError`] - Strongly-typed errors for every failure mode in the loader
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error into the user-friendly format
//! - [`Consumer`] - Attribution of a dependency request to the module (or top-level
//!   load call) that made it
//!
//! # Design Principles
//!
//! Every operation that can fail returns a [`Result`] carrying a [`WireupError`]
//! somewhere in its chain. Errors are never swallowed or retried: the first failure
//! in a resolution aborts the remaining work in its frame and surfaces, typed, to
//! the original caller. Callers that want precise handling downcast; callers that
//! want a terminal message use [`ErrorContext`].

pub mod error;

pub use error::{ErrorContext, WireupError, user_friendly_error};

use std::fmt;

/// Identifies who requested a dependency.
///
/// Used in diagnostics to distinguish a miss at the top level from a miss nested
/// inside another module's dependency list. The walker threads a `Consumer` down
/// every recursion frame: the root frame carries [`Consumer::Root`], and each
/// module's own dependencies are requested with [`Consumer::Module`] naming the
/// resolved origin of that module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumer {
    /// The dependency was requested directly by a top-level load call.
    Root,
    /// The dependency was requested by the module resolved at the given origin.
    Module(String),
}

impl Consumer {
    /// Returns the module origin, or `None` for a top-level request.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Module(origin) => Some(origin),
        }
    }
}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "the top-level load call"),
            Self::Module(origin) => write!(f, "module \"{origin}\""),
        }
    }
}
