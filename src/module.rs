//! Loadable units and resolved values.
//!
//! Everything the resolver moves around lives here:
//!
//! - [`ModuleValue`] - a dynamically typed, cheaply clonable resolved payload
//! - [`Namespace`] - the resolved value of a directory unit (member name -> value)
//! - [`ResolvedModules`] - the declaration-ordered view handed to constructors
//!   and load handlers
//! - [`ModuleDef`] - a constructor plus its declared dependency list
//! - [`Completion`] - the exactly-once completion handle for asynchronous modules
//! - [`LoadableUnit`] / [`DirectoryUnit`] - what a module source produces
//!
//! # Declaring Dependencies
//!
//! Dependencies are declared explicitly, either as a list or as a signature
//! string parsed by [`crate::signature::parse_signature`]:
//!
//! ```rust
//! use wireup::module::{ModuleDef, ModuleValue};
//!
//! # fn demo() -> anyhow::Result<()> {
//! let greeting = ModuleDef::new("name", |modules| {
//!     let name: &String = modules.required("name")?.downcast_ref().unwrap();
//!     Ok(ModuleValue::new(format!("hello, {name}")))
//! })?;
//! assert_eq!(greeting.dependencies(), ["name"]);
//! # Ok(())
//! # }
//! ```
//!
//! A module whose dependency list contains the [`CALLBACK`] sentinel is
//! asynchronous: its constructor receives a [`Completion`] handle and the
//! resolver waits until the handle is invoked with a value or an error. The
//! sentinel and the constructor kind must agree; a mismatch is rejected at
//! definition time with [`WireupError::InvalidModule`].

use anyhow::Result;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::warn;

use crate::core::WireupError;
use crate::signature::parse_signature;

/// Reserved dependency name marking a module as asynchronous.
///
/// Never resolved against the roots: the resolver satisfies it with the
/// async-completion step instead.
pub const CALLBACK: &str = "callback";

/// A resolved module value.
///
/// Values are shared, not copied: cloning a `ModuleValue` clones an [`Arc`], so
/// every consumer of a cached dependency observes the exact same payload.
#[derive(Clone)]
pub struct ModuleValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ModuleValue {
    /// Wrap a payload as a resolved value.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the payload as `T`, if that is what it is.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// The Rust type name of the payload, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether two values share the same underlying payload.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for ModuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModuleValue").field(&self.type_name).finish()
    }
}

/// The resolved value of a directory unit: member base-name -> resolved value.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: BTreeMap<String, ModuleValue>,
}

impl Namespace {
    pub(crate) fn from_entries(entries: BTreeMap<String, ModuleValue>) -> Self {
        Self { entries }
    }

    /// Look up a member by base name.
    #[must_use]
    pub fn get(&self, member: &str) -> Option<&ModuleValue> {
        self.entries.get(member)
    }

    /// Whether the namespace contains a member.
    #[must_use]
    pub fn contains(&self, member: &str) -> bool {
        self.entries.contains_key(member)
    }

    /// Member base names, sorted.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate members and their values, sorted by member name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the namespace has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The dependencies resolved for one frame, in declaration order.
///
/// Handed to module constructors and load handlers. Blank names and the
/// [`CALLBACK`] sentinel are skipped during resolution and therefore have no
/// entry here.
#[derive(Debug, Clone)]
pub struct ResolvedModules {
    names: Vec<String>,
    values: HashMap<String, ModuleValue>,
}

impl ResolvedModules {
    pub(crate) fn new(names: Vec<String>) -> Self {
        Self {
            names,
            values: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: ModuleValue) {
        self.values.insert(name.into(), value);
    }

    /// Look up a resolved dependency by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModuleValue> {
        self.values.get(name)
    }

    /// Look up a resolved dependency, erroring if it is absent.
    ///
    /// Intended for constructor bodies, where every declared dependency is
    /// guaranteed to be present and an absence is a programming error worth a
    /// real message rather than a panic.
    pub fn required(&self, name: &str) -> Result<&ModuleValue> {
        self.values
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("dependency \"{name}\" was not declared by this module"))
    }

    /// The requested names, in declaration order (sentinel and blanks included).
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolved (name, value) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleValue)> {
        self.names
            .iter()
            .filter_map(|name| self.values.get(name).map(|value| (name.as_str(), value)))
    }

    /// Resolved values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &ModuleValue> {
        self.iter().map(|(_, value)| value)
    }

    /// Number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type CompletionSlot = Arc<Mutex<Option<oneshot::Sender<Result<ModuleValue>>>>>;

/// Exactly-once completion handle for an asynchronous module.
///
/// The constructor of an asynchronous module receives one of these instead of
/// returning its value. Resolution of the module completes when the handle is
/// invoked; invoking it again afterwards is a no-op. Dropping every clone of the
/// handle without invoking it fails the load with
/// [`WireupError::AsyncCompletionDropped`] - but a handle that is merely parked
/// (stored and never invoked) stalls the load forever, with no timeout.
#[derive(Clone)]
pub struct Completion {
    slot: CompletionSlot,
}

impl Completion {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Result<ModuleValue>>) {
        let (sender, receiver) = oneshot::channel();
        let completion = Self {
            slot: Arc::new(Mutex::new(Some(sender))),
        };
        (completion, receiver)
    }

    /// Complete the module with a value.
    pub fn resolve(&self, value: ModuleValue) {
        self.finish(Ok(value));
    }

    /// Complete the module with an error, failing the enclosing load.
    pub fn fail(&self, error: anyhow::Error) {
        self.finish(Err(error));
    }

    fn finish(&self, result: Result<ModuleValue>) {
        let sender = self.slot.lock().expect("completion slot poisoned").take();
        match sender {
            // The receiver only disappears when the load itself is gone.
            Some(sender) => drop(sender.send(result)),
            None => warn!("completion handle invoked more than once; ignoring"),
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false);
        f.debug_struct("Completion").field("pending", &pending).finish()
    }
}

/// Synchronous constructor: resolved dependencies in, value out.
pub type SyncConstructor = Arc<dyn Fn(&ResolvedModules) -> Result<ModuleValue> + Send + Sync>;

/// Asynchronous constructor: receives its dependencies and a [`Completion`].
pub type AsyncConstructor = Arc<dyn Fn(&ResolvedModules, Completion) -> Result<()> + Send + Sync>;

/// How a module is instantiated.
#[derive(Clone)]
pub enum Constructor {
    /// The constructor's return value is the resolved value.
    Sync(SyncConstructor),
    /// The resolved value arrives later through the [`Completion`] handle.
    Async(AsyncConstructor),
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Constructor::Sync"),
            Self::Async(_) => f.write_str("Constructor::Async"),
        }
    }
}

/// A module definition: an ordered dependency list plus a constructor.
///
/// The dependency list and the constructor kind are validated together at
/// definition time: the [`CALLBACK`] sentinel must appear in the list of an
/// asynchronous module and must not appear in the list of a synchronous one.
#[derive(Clone)]
pub struct ModuleDef {
    dependencies: Vec<String>,
    constructor: Constructor,
}

impl ModuleDef {
    /// Define a synchronous module from a signature string.
    pub fn new<F>(signature: &str, constructor: F) -> Result<Self>
    where
        F: Fn(&ResolvedModules) -> Result<ModuleValue> + Send + Sync + 'static,
    {
        Self::with_dependencies(parse_signature(signature), constructor)
    }

    /// Define a synchronous module from an explicit dependency list.
    ///
    /// The names are used verbatim - this is the escape hatch (and in Rust the
    /// primary form) that skips signature parsing entirely.
    pub fn with_dependencies<I, S, F>(dependencies: I, constructor: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ResolvedModules) -> Result<ModuleValue> + Send + Sync + 'static,
    {
        let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();
        if dependencies.iter().any(|name| name == CALLBACK) {
            return Err(WireupError::InvalidModule {
                reason: format!(
                    "synchronous constructor declares the \"{CALLBACK}\" sentinel"
                ),
            }
            .into());
        }
        Ok(Self {
            dependencies,
            constructor: Constructor::Sync(Arc::new(constructor)),
        })
    }

    /// Define an asynchronous module from a signature string.
    ///
    /// The signature must declare the [`CALLBACK`] sentinel.
    pub fn new_async<F>(signature: &str, constructor: F) -> Result<Self>
    where
        F: Fn(&ResolvedModules, Completion) -> Result<()> + Send + Sync + 'static,
    {
        Self::with_dependencies_async(parse_signature(signature), constructor)
    }

    /// Define an asynchronous module from an explicit dependency list.
    pub fn with_dependencies_async<I, S, F>(dependencies: I, constructor: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ResolvedModules, Completion) -> Result<()> + Send + Sync + 'static,
    {
        let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();
        if !dependencies.iter().any(|name| name == CALLBACK) {
            return Err(WireupError::InvalidModule {
                reason: format!(
                    "asynchronous constructor does not declare the \"{CALLBACK}\" sentinel"
                ),
            }
            .into());
        }
        Ok(Self {
            dependencies,
            constructor: Constructor::Async(Arc::new(constructor)),
        })
    }

    /// The declared dependency names, in order.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Whether the module resolves through a [`Completion`] handle.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self.constructor, Constructor::Async(_))
    }

    pub(crate) fn constructor(&self) -> &Constructor {
        &self.constructor
    }
}

impl fmt::Debug for ModuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDef")
            .field("dependencies", &self.dependencies)
            .field("constructor", &self.constructor)
            .finish()
    }
}

/// A directory unit: a namespace of member units, not a module itself.
///
/// Produced by a module source when a name resolves to a directory (or a nested
/// registration prefix). The aggregator loads each member as an independent
/// dependency named `<dir>/<member>` and assembles the results into a
/// [`Namespace`].
#[derive(Debug, Clone)]
pub struct DirectoryUnit {
    origin: String,
    members: Vec<String>,
}

impl DirectoryUnit {
    /// Create a directory unit; members are sorted and deduplicated.
    #[must_use]
    pub fn new<I, S>(origin: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut members: Vec<String> = members.into_iter().map(Into::into).collect();
        members.sort();
        members.dedup();
        Self {
            origin: origin.into(),
            members,
        }
    }

    /// Where the directory was found, for diagnostics and consumer labels.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Eligible member base names, sorted.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

/// What a module source produces for a dependency name.
#[derive(Debug, Clone)]
pub enum LoadableUnit {
    /// An already-resolved payload; a leaf with no further dependencies.
    Value(ModuleValue),
    /// A constructor with declared dependencies of its own.
    Module(ModuleDef),
    /// A namespace whose members are the resolvable units.
    Directory(DirectoryUnit),
}
