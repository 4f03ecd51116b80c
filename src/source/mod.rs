//! Module sources and prioritized root lookup.
//!
//! A *root* is anywhere loadable units can come from. The core only relies on
//! the [`ModuleSource`] trait and its tri-state contract; two sources ship with
//! the crate:
//!
//! - [`RegistryRoot`] - in-memory registrations (values and constructors),
//!   with nested names forming directory namespaces
//! - [`FsRoot`] - a directory on disk whose JSON/TOML files are value units and
//!   whose subdirectories are directory units
//!
//! # Lookup Contract
//!
//! For a given key, a source reports exactly one of three outcomes:
//!
//! | Outcome | Meaning | Effect |
//! |---|---|---|
//! | `Ok(Resolution::Found(..))` | unit produced | short-circuits every remaining attempt and root |
//! | `Ok(Resolution::NotFound { .. })` | nothing at this key | next attempt, then next root |
//! | `Err(..)` | located but failed to load | hard error, propagated immediately |
//!
//! The distinction between the last two is load-bearing: a syntax error inside
//! a located value file must surface as that error, never as "dependency not
//! found".
//!
//! # Search Order
//!
//! [`RootSet::locate`] walks the included roots in priority order (most
//! recently included first), then the ambient source if one was configured.
//! Within each root it attempts the dependency name itself, then - when the
//! name contains the [`NAME_SEPARATOR`] - the name with separators replaced by
//! path separators, so the flat name `routes_admin` can address the nested
//! unit `routes/admin`.

pub mod fs;
pub mod registry;

pub use fs::FsRoot;
pub use registry::RegistryRoot;

use anyhow::Result;
use std::sync::Arc;
use tracing::trace;

use crate::core::{Consumer, WireupError};
use crate::module::LoadableUnit;

/// Separator inside flat dependency names that maps to nested path segments.
pub const NAME_SEPARATOR: char = '_';

/// Separator between path segments in nested unit names.
pub const PATH_SEPARATOR: char = '/';

/// Outcome of probing one source for one key.
#[derive(Debug)]
pub enum Resolution {
    /// The source produced a unit.
    Found(FoundUnit),
    /// Nothing lives at this key in this source.
    NotFound {
        /// The concrete probes tried, for diagnostics.
        attempted: Vec<String>,
    },
}

/// A located unit plus where it came from.
#[derive(Debug)]
pub struct FoundUnit {
    /// The unit itself.
    pub unit: LoadableUnit,
    /// Resolved origin (file path or registry label plus key); used as the
    /// consumer label for the unit's own dependencies.
    pub origin: String,
}

/// Anywhere loadable units can come from.
///
/// Implementations must be cheap to probe: `lookup` runs once per name variant
/// per unresolved dependency.
pub trait ModuleSource: Send + Sync {
    /// Short label identifying this root in diagnostics.
    fn label(&self) -> &str;

    /// Probe a single key. See the module docs for the tri-state contract.
    fn lookup(&self, key: &str) -> Result<Resolution>;

    /// Names this source could resolve, used only for "did you mean"
    /// suggestions. Sources that cannot enumerate cheaply return nothing.
    fn known_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The name variants attempted per root, in order.
///
/// The name itself always comes first. When it contains [`NAME_SEPARATOR`], a
/// second variant replaces every occurrence with [`PATH_SEPARATOR`], letting a
/// flat dependency name address a nested unit.
#[must_use]
pub fn name_variants(name: &str) -> Vec<String> {
    let mut variants = vec![name.to_string()];
    if name.contains(NAME_SEPARATOR) {
        variants.push(name.replace(NAME_SEPARATOR, &PATH_SEPARATOR.to_string()));
    }
    variants
}

/// Prioritized sequence of roots plus the optional ambient fallback.
#[derive(Clone, Default)]
pub struct RootSet {
    roots: Vec<Arc<dyn ModuleSource>>,
    ambient: Option<Arc<dyn ModuleSource>>,
}

impl RootSet {
    /// An empty root set with no ambient fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the ambient source searched after every included root.
    pub fn set_ambient(&mut self, source: Arc<dyn ModuleSource>) {
        self.ambient = Some(source);
    }

    /// Prepend roots, most recently declared first.
    ///
    /// Later arguments of one call take priority over earlier ones, and the
    /// whole batch takes priority over previously included roots, so
    /// `include([a, b])` followed by `include([c])` searches `c`, `b`, `a`.
    pub fn include<I>(&mut self, roots: I)
    where
        I: IntoIterator<Item = Arc<dyn ModuleSource>>,
    {
        let mut incoming: Vec<Arc<dyn ModuleSource>> = roots.into_iter().collect();
        incoming.reverse();
        incoming.append(&mut self.roots);
        self.roots = incoming;
    }

    /// The roots in search order, ambient last.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ModuleSource>> {
        self.roots.iter().chain(self.ambient.iter())
    }

    /// Number of included roots, not counting the ambient source.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether no roots were included (the ambient source may still exist).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Locate a dependency across all roots and name variants.
    ///
    /// On failure, returns [`WireupError::DependencyNotFound`] carrying the
    /// consumer, every probe attempted, and a nearest-match suggestion when one
    /// of the roots knows a similar name. Hard errors from a root are wrapped
    /// as [`WireupError::SourceError`] and returned immediately.
    pub fn locate(&self, name: &str, consumer: &Consumer) -> Result<FoundUnit> {
        let mut attempted = Vec::new();
        for root in self.iter() {
            for variant in name_variants(name) {
                trace!(name, variant = variant.as_str(), root = root.label(), "probing root");
                match root.lookup(&variant) {
                    Ok(Resolution::Found(found)) => {
                        trace!(name, origin = found.origin.as_str(), "dependency located");
                        return Ok(found);
                    }
                    Ok(Resolution::NotFound { attempted: probes }) => {
                        attempted.extend(probes);
                    }
                    Err(source) => {
                        return Err(WireupError::SourceError {
                            name: name.to_string(),
                            origin: format!("{}:{variant}", root.label()),
                            source: source.into(),
                        }
                        .into());
                    }
                }
            }
        }

        Err(WireupError::DependencyNotFound {
            name: name.to_string(),
            consumer: consumer.clone(),
            attempted,
            suggestion: self.suggest(name),
        }
        .into())
    }

    /// Nearest known name across all roots, if any is close enough to suggest.
    fn suggest(&self, name: &str) -> Option<String> {
        let mut best: Option<(f64, String)> = None;
        for root in self.iter() {
            for candidate in root.known_names() {
                if candidate == name {
                    continue;
                }
                let score = strsim::jaro_winkler(name, &candidate);
                if score >= 0.85 && best.as_ref().is_none_or(|(top, _)| score > *top) {
                    best = Some((score, candidate));
                }
            }
        }
        best.map(|(_, candidate)| candidate)
    }
}

impl std::fmt::Debug for RootSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.iter().map(|root| root.label()).collect();
        f.debug_struct("RootSet")
            .field("roots", &labels)
            .field("has_ambient", &self.ambient.is_some())
            .finish()
    }
}
