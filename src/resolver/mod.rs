//! Dependency graph walking.
//!
//! The [`Resolver`] is the algorithmic heart of the crate: it takes a list of
//! requested dependency names and produces a fully resolved value for each,
//! recursively resolving every module's own declared dependencies first.
//!
//! # The Walk
//!
//! Per requested name, strictly in declaration order:
//!
//! 1. Blank names and the [`CALLBACK`] sentinel are skipped - the sentinel is
//!    satisfied by the async-completion step, not by lookup.
//! 2. A cached name is reused as-is; its constructor never runs again.
//! 3. A name already on the ancestor chain fails with
//!    [`WireupError::CircularDependency`]. The check covers only the recursion
//!    path: sibling branches may resolve the same name independently.
//! 4. Otherwise the name is located across the roots. Values (and aggregated
//!    directories) are leaves; module units have their dependency list
//!    resolved depth-first - with the current name appended to the ancestor
//!    chain and the unit's origin as the consumer label - before their
//!    constructor runs. The resolved value is published to the cache before
//!    the frame's remaining siblings continue, so later siblings observe it
//!    instead of re-instantiating.
//!
//! Siblings never fan out: each one completes (including any nested loads)
//! before the next starts, with a cooperative yield in between. The yield keeps
//! one very wide dependency list from monopolizing the single-threaded
//! scheduler, and it keeps observable side-effect ordering equal to declaration
//! order. The first failing sibling aborts the rest of its frame and the error
//! propagates to the caller; nothing is retried.

mod aggregate;

use anyhow::Result;
use futures::future::BoxFuture;
use tracing::debug;

use crate::cache::InstanceCache;
use crate::core::{Consumer, WireupError};
use crate::module::{
    CALLBACK, Completion, Constructor, LoadableUnit, ModuleDef, ModuleValue, ResolvedModules,
};
use crate::source::RootSet;

/// Recursive dependency walker over a root set and an instance cache.
///
/// Stateless apart from the borrowed container state: a `Resolver` is built
/// per top-level load call and thrown away afterwards. Graphs are never
/// persisted across calls; only instances are, through the cache.
pub struct Resolver<'a> {
    roots: &'a RootSet,
    cache: &'a InstanceCache,
}

impl<'a> Resolver<'a> {
    /// Borrow a resolver over the given roots and cache.
    #[must_use]
    pub fn new(roots: &'a RootSet, cache: &'a InstanceCache) -> Self {
        Self { roots, cache }
    }

    /// Resolve `names` against the cache, the roots, and the ancestor chain.
    ///
    /// `ancestors` is the chain of names currently being resolved, root-down;
    /// top-level calls pass an empty chain and [`Consumer::Root`]. Returns the
    /// resolved mapping, or the first failure encountered.
    pub fn resolve(
        &self,
        names: Vec<String>,
        ancestors: Vec<String>,
        consumer: Consumer,
    ) -> BoxFuture<'_, Result<ResolvedModules>> {
        Box::pin(async move {
            let mut loaded = ResolvedModules::new(names.clone());
            for name in &names {
                if name.trim().is_empty() || name == CALLBACK {
                    continue;
                }
                let value = self.resolve_one(name, &ancestors, &consumer).await?;
                loaded.insert(name.clone(), value);
                // Suspension point between siblings; keeps ordering
                // deterministic and the scheduler responsive.
                tokio::task::yield_now().await;
            }
            Ok(loaded)
        })
    }

    async fn resolve_one(
        &self,
        name: &str,
        ancestors: &[String],
        consumer: &Consumer,
    ) -> Result<ModuleValue> {
        if let Some(value) = self.cache.get(name) {
            debug!(name, "reusing cached instance");
            return Ok(value);
        }

        if ancestors.iter().any(|ancestor| ancestor == name) {
            return Err(WireupError::CircularDependency {
                name: name.to_string(),
                consumer: consumer.clone(),
            }
            .into());
        }

        let found = self.roots.locate(name, consumer)?;
        match found.unit {
            LoadableUnit::Value(value) => {
                debug!(name, origin = found.origin.as_str(), "resolved value unit");
                Ok(self.publish(name, value))
            }
            LoadableUnit::Directory(directory) => {
                debug!(name, origin = found.origin.as_str(), "aggregating directory unit");
                let value =
                    aggregate::aggregate_directory(self, name, &directory, ancestors).await?;
                Ok(self.publish(name, value))
            }
            LoadableUnit::Module(def) => {
                debug!(
                    name,
                    origin = found.origin.as_str(),
                    dependencies = ?def.dependencies(),
                    "resolving module dependencies"
                );
                let mut chain = ancestors.to_vec();
                chain.push(name.to_string());
                let resolved = self
                    .resolve(
                        def.dependencies().to_vec(),
                        chain,
                        Consumer::Module(found.origin.clone()),
                    )
                    .await?;
                let value = Self::construct(name, &found.origin, &def, &resolved).await?;
                Ok(self.publish(name, value))
            }
        }
    }

    /// Publish a resolved value under `name`.
    ///
    /// Write-once: if another frame got there first, the earlier binding wins
    /// and is what this frame observes too.
    fn publish(&self, name: &str, value: ModuleValue) -> ModuleValue {
        if self.cache.insert(name, value.clone()) {
            value
        } else {
            self.cache.get(name).unwrap_or(value)
        }
    }

    /// Run a module's constructor with its resolved dependencies.
    async fn construct(
        name: &str,
        origin: &str,
        def: &ModuleDef,
        resolved: &ResolvedModules,
    ) -> Result<ModuleValue> {
        match def.constructor() {
            Constructor::Sync(factory) => factory(resolved).map_err(|source| {
                WireupError::ConstructorFailed {
                    name: name.to_string(),
                    origin: origin.to_string(),
                    source: source.into(),
                }
                .into()
            }),
            Constructor::Async(factory) => {
                let (completion, receiver) = Completion::channel();
                factory(resolved, completion).map_err(|source| {
                    anyhow::Error::from(WireupError::ConstructorFailed {
                        name: name.to_string(),
                        origin: origin.to_string(),
                        source: source.into(),
                    })
                })?;
                // Resolution parks here until the module completes. There is
                // no timeout: a constructor that holds its handle forever
                // stalls the load permanently.
                match receiver.await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(source)) => Err(WireupError::ConstructorFailed {
                        name: name.to_string(),
                        origin: origin.to_string(),
                        source: source.into(),
                    }
                    .into()),
                    Err(_closed) => Err(WireupError::AsyncCompletionDropped {
                        name: name.to_string(),
                        origin: origin.to_string(),
                    }
                    .into()),
                }
            }
        }
    }
}
