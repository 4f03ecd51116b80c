//! In-memory module registrations.

use anyhow::Result;
use std::any::Any;
use std::collections::BTreeMap;

use super::{FoundUnit, ModuleSource, PATH_SEPARATOR, Resolution};
use crate::module::{DirectoryUnit, LoadableUnit, ModuleDef, ModuleValue};

#[derive(Debug, Clone)]
enum RegistryEntry {
    Value(ModuleValue),
    Module(ModuleDef),
}

/// A root backed by explicit registrations.
///
/// Names containing `/` are nested registrations: looking up a strict prefix of
/// registered names yields a directory unit whose members are the immediate
/// children, so `with_value("routes/admin", ..)` makes both `routes/admin` and
/// the namespace `routes` resolvable. This is the registration-time analogue of
/// a directory scan: the namespace's membership is fixed by what was
/// registered, not by a filesystem listing.
///
/// # Examples
///
/// ```rust
/// use wireup::module::{ModuleDef, ModuleValue};
/// use wireup::source::RegistryRoot;
///
/// # fn demo() -> anyhow::Result<()> {
/// let root = RegistryRoot::new("app")
///     .with_value("config", 42u32)
///     .with_module("db", ModuleDef::new("config", |modules| {
///         let port: &u32 = modules.required("config")?.downcast_ref().unwrap();
///         Ok(ModuleValue::new(format!("db:{port}")))
///     })?);
/// # let _ = root;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RegistryRoot {
    label: String,
    entries: BTreeMap<String, RegistryEntry>,
}

impl RegistryRoot {
    /// Create an empty registry with a diagnostic label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Register an already-resolved value under a name.
    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.entries.insert(name.into(), RegistryEntry::Value(ModuleValue::new(value)));
        self
    }

    /// Register a module definition under a name.
    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>, def: ModuleDef) -> Self {
        self.entries.insert(name.into(), RegistryEntry::Module(def));
        self
    }

    fn origin_of(&self, key: &str) -> String {
        format!("{}:{key}", self.label)
    }

    /// Immediate children of `key`, treated as a namespace prefix.
    ///
    /// Entries nested deeper than one level belong to a nested namespace and
    /// are not members of this one.
    fn directory_members(&self, key: &str) -> Vec<String> {
        let prefix = format!("{key}{PATH_SEPARATOR}");
        let mut members: Vec<String> = self
            .entries
            .keys()
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter(|rest| !rest.contains(PATH_SEPARATOR))
            .map(ToString::to_string)
            .collect();
        members.dedup();
        members
    }
}

impl ModuleSource for RegistryRoot {
    fn label(&self) -> &str {
        &self.label
    }

    fn lookup(&self, key: &str) -> Result<Resolution> {
        if let Some(entry) = self.entries.get(key) {
            let unit = match entry {
                RegistryEntry::Value(value) => LoadableUnit::Value(value.clone()),
                RegistryEntry::Module(def) => LoadableUnit::Module(def.clone()),
            };
            return Ok(Resolution::Found(FoundUnit {
                unit,
                origin: self.origin_of(key),
            }));
        }

        let members = self.directory_members(key);
        let is_namespace = self
            .entries
            .keys()
            .any(|name| name.starts_with(&format!("{key}{PATH_SEPARATOR}")));
        if is_namespace {
            let origin = self.origin_of(key);
            return Ok(Resolution::Found(FoundUnit {
                unit: LoadableUnit::Directory(DirectoryUnit::new(origin.clone(), members)),
                origin,
            }));
        }

        Ok(Resolution::NotFound {
            attempted: vec![self.origin_of(key)],
        })
    }

    fn known_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
