//! Dependency-signature parsing.
//!
//! A module or handler declares the modules it needs as an ordered list of
//! dependency names. The explicit list form ([`crate::module::ModuleDef::with_dependencies`],
//! [`crate::container::Container::load`]) uses the supplied names verbatim; this
//! module covers the convention-friendly alternative, a signature *string*:
//!
//! ```rust
//! use wireup::signature::parse_signature;
//!
//! assert_eq!(parse_signature("db, log"), vec!["db", "log"]);
//! assert_eq!(parse_signature("|db, log|"), vec!["db", "log"]);
//! assert_eq!(parse_signature("fn build(db, log)"), vec!["db", "log"]);
//! assert_eq!(parse_signature(""), Vec::<String>::new());
//! ```
//!
//! # Accepted Grammar
//!
//! The signature is a comma-separated name list, optionally wrapped in one of the
//! header forms `(..)`, `|..|`, or `fn name(..)`. Whitespace (including newlines)
//! around names is trimmed and empty entries are dropped, so a declaration split
//! across lines parses the same as a single-line one. Names are not validated
//! beyond being non-empty: the resolver decides what a name means.

use regex::Regex;
use std::sync::LazyLock;

/// Strips an optional declaration header, capturing the bare name list.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:fn\s+[A-Za-z_][A-Za-z0-9_]*\s*)?(?:\(([^)]*)\)|\|([^|]*)\|)\s*$")
        .expect("header pattern is valid")
});

/// Parse a declared signature into its ordered dependency-name list.
///
/// Returns the names in declaration order, trimmed, with empty entries removed.
/// A blank signature (or an empty wrapper such as `"()"`) yields an empty list,
/// meaning the function has no dependencies.
#[must_use]
pub fn parse_signature(signature: &str) -> Vec<String> {
    let inner = match HEADER.captures(signature) {
        Some(captures) => captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default()
            .to_string(),
        None => signature.to_string(),
    };

    inner
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}
