//! Error handling for wireup.
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`WireupError`]) for precise handling in code
//! 2. **User-friendly rendering** ([`ErrorContext`]) with actionable suggestions
//!
//! Loader APIs return [`anyhow::Result`] with a [`WireupError`] at the root of the
//! chain, so callers can either display the rendered message or downcast for exact
//! matching:
//!
//! ```rust,no_run
//! use wireup::core::WireupError;
//!
//! fn classify(err: &anyhow::Error) -> &'static str {
//!     match err.downcast_ref::<WireupError>() {
//!         Some(WireupError::DependencyNotFound { .. }) => "missing",
//!         Some(WireupError::CircularDependency { .. }) => "cycle",
//!         _ => "other",
//!     }
//! }
//! ```
//!
//! # Propagation Policy
//!
//! There is no retry anywhere in this crate. The first failing dependency aborts
//! the remaining siblings in its resolution frame and propagates to the parent
//! frame, all the way to the caller that awaited the load. A hard error from a
//! module source (for example a malformed value file) is carried verbatim via
//! [`WireupError::SourceError`] and is never reinterpreted as "not found".

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use super::Consumer;

/// The main error type for wireup operations.
///
/// Each variant carries the context needed to diagnose a failed load: the
/// dependency name, the consumer that requested it, and - where a module store
/// was involved - the concrete paths that were probed or the origin that
/// produced the unit.
#[derive(Error, Debug)]
pub enum WireupError {
    /// No root or naming-convention fallback produced a unit for a name.
    ///
    /// Carries every probe attempted across all roots so the failure is
    /// reproducible from the message alone, plus an optional nearest-match
    /// suggestion when a similarly named registration exists.
    #[error(
        "Failed to locate dependency \"{name}\" requested by {consumer}, tried {}{}",
        .attempted.join(", "),
        suggestion_suffix(.suggestion)
    )]
    DependencyNotFound {
        /// The dependency name that could not be resolved.
        name: String,
        /// Who asked for it: a module, or the top-level load call.
        consumer: Consumer,
        /// Every probe path attempted, in search order.
        attempted: Vec<String>,
        /// Closest known registration name, if one is close enough to suggest.
        suggestion: Option<String>,
    },

    /// A name appeared in its own ancestor chain during resolution.
    #[error("Circular dependency for \"{name}\" found in {consumer}")]
    CircularDependency {
        /// The dependency that required itself, directly or transitively.
        name: String,
        /// The consumer on top of the chain at the point of detection.
        consumer: Consumer,
    },

    /// A module source located a unit but failed while loading it.
    ///
    /// This is the "anything other than not-found" half of the source contract:
    /// malformed content, unreadable files, and similar failures are propagated
    /// verbatim instead of being retried against the remaining roots.
    #[error("Failed to load \"{name}\" from {origin}")]
    SourceError {
        /// The dependency name being resolved when the source failed.
        name: String,
        /// The probe that failed (root label plus the attempted key).
        origin: String,
        /// The underlying source failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A module constructor returned an error, or an asynchronous module
    /// completed with one.
    #[error("Constructor for module \"{name}\" ({origin}) failed")]
    ConstructorFailed {
        /// The dependency name whose constructor failed.
        name: String,
        /// Resolved origin of the module definition.
        origin: String,
        /// The error the constructor produced.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An asynchronous module dropped its completion handle without invoking it.
    ///
    /// Only the detectable half of the async contract violation: a constructor
    /// that *parks* its handle forever stalls the load with no diagnostic.
    #[error(
        "Asynchronous module \"{name}\" ({origin}) dropped its completion handle without resolving"
    )]
    AsyncCompletionDropped {
        /// The dependency name of the asynchronous module.
        name: String,
        /// Resolved origin of the module definition.
        origin: String,
    },

    /// A module definition is internally inconsistent.
    ///
    /// Raised at registration time, before any resolution: for example a
    /// synchronous constructor declaring the `callback` sentinel, or an
    /// asynchronous constructor omitting it.
    #[error("Invalid module definition: {reason}")]
    InvalidModule {
        /// Why the definition was rejected.
        reason: String,
    },

    /// Catch-all for errors that do not fit other categories.
    #[error("{message}")]
    Other {
        /// Description of the error.
        message: String,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean \"{name}\"?)"),
        None => String::new(),
    }
}

/// User-friendly error wrapper with optional suggestion and details.
///
/// Wraps a [`WireupError`] for presentation: the error message in red, details
/// in yellow, and an actionable suggestion in green. Library code never prints;
/// embedders that want terminal output call [`ErrorContext::display`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: WireupError,
    /// Optional suggestion for resolving the error.
    pub suggestion: Option<String>,
    /// Optional additional details about the error.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no additional suggestion or details.
    #[must_use]
    pub const fn new(error: WireupError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable suggestion, displayed in green.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add explanatory details, displayed in yellow.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Typed [`WireupError`] values get a suggestion tailored to the variant;
/// anything else is wrapped as [`WireupError::Other`] with its display text
/// preserved.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    match error.downcast::<WireupError>() {
        Ok(wireup_error) => create_error_context(wireup_error),
        Err(other) => ErrorContext::new(WireupError::Other {
            message: other.to_string(),
        }),
    }
}

fn create_error_context(error: WireupError) -> ErrorContext {
    match &error {
        WireupError::DependencyNotFound {
            name,
            attempted,
            suggestion,
            ..
        } => {
            let detail = format!("Probes attempted for \"{name}\": {}", attempted.join(", "));
            let hint = match suggestion {
                Some(close) => format!("Did you mean \"{close}\"? Otherwise check the name and the roots passed to include()"),
                None => "Check the dependency name and the roots passed to include()".to_string(),
            };
            ErrorContext::new(error).with_suggestion(hint).with_details(detail)
        }
        WireupError::CircularDependency { name, consumer } => {
            let detail = format!("\"{name}\" is a prerequisite of resolving itself via {consumer}");
            ErrorContext::new(error)
                .with_suggestion("Break the cycle, or inject one of its modules ahead of time")
                .with_details(detail)
        }
        WireupError::SourceError { origin, .. } => {
            let detail = format!("The unit at {origin} was located but could not be loaded");
            ErrorContext::new(error)
                .with_suggestion("Fix the module content at the reported origin")
                .with_details(detail)
        }
        WireupError::ConstructorFailed { origin, .. } => {
            let detail = format!("Module origin: {origin}");
            ErrorContext::new(error)
                .with_suggestion("Inspect the constructor error in the chain below")
                .with_details(detail)
        }
        WireupError::AsyncCompletionDropped { .. } => ErrorContext::new(error).with_suggestion(
            "Ensure the asynchronous constructor stores or invokes its completion handle exactly once",
        ),
        WireupError::InvalidModule { .. } => ErrorContext::new(error).with_suggestion(
            "Declare the callback sentinel for asynchronous constructors, and only for them",
        ),
        WireupError::Other { .. } => ErrorContext::new(error),
    }
}
