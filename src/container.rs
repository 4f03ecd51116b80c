//! The container façade: configuration plus `include` / `inject` / `load`.
//!
//! A [`Container`] owns the prioritized root list and the write-once instance
//! cache, and translates a top-level load request into one resolver walk.
//! Containers are created per application (or per test):
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wireup::container::Container;
//! use wireup::source::{FsRoot, ModuleSource};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut container = Container::new();
//! container
//!     .include([Arc::new(FsRoot::new("/srv/app/modules")) as Arc<dyn ModuleSource>])
//!     .inject_value("environment", "production".to_string());
//!
//! container
//!     .load(["environment", "config"], |modules| {
//!         let env: &String = modules.required("environment")?.downcast_ref().unwrap();
//!         println!("running in {env}");
//!         Ok::<_, anyhow::Error>(())
//!     })
//!     .await??;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Delivery
//!
//! `load` and `resolve` are `async` and their futures are inert until polled:
//! the caller always holds the handle before resolution begins, and observes
//! success or the typed failure by awaiting it. One channel, no error events,
//! no error-first arguments, nothing silently dropped.
//!
//! # One-Shot Helpers
//!
//! The module-level [`include`] and [`inject`] functions build a fresh
//! container and apply the first call, so short-lived wiring reads as one
//! chain: `container::include(roots).load(names, handler).await`.

use anyhow::Result;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::cache::InstanceCache;
use crate::core::Consumer;
use crate::module::{ModuleValue, ResolvedModules};
use crate::resolver::Resolver;
use crate::signature::parse_signature;
use crate::source::{FsRoot, ModuleSource, RootSet};

/// Construction-time configuration for a [`Container`].
///
/// The only knob is the ambient source: an explicitly provided fallback root
/// searched after every included root. There is no implicit default - a
/// container built without one searches nothing but its included roots.
#[derive(Default)]
pub struct ContainerBuilder {
    ambient: Option<Arc<dyn ModuleSource>>,
}

impl ContainerBuilder {
    /// Provide the ambient source searched after every included root.
    #[must_use]
    pub fn ambient(mut self, source: Arc<dyn ModuleSource>) -> Self {
        self.ambient = Some(source);
        self
    }

    /// Build the container.
    #[must_use]
    pub fn build(self) -> Container {
        let mut roots = RootSet::new();
        if let Some(ambient) = self.ambient {
            roots.set_ambient(ambient);
        }
        Container {
            roots,
            cache: InstanceCache::new(),
        }
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("has_ambient", &self.ambient.is_some())
            .finish()
    }
}

/// Search roots plus instance cache, with the loader call surface.
#[derive(Debug, Default)]
pub struct Container {
    roots: RootSet,
    cache: InstanceCache,
}

impl Container {
    /// A container with no roots and no ambient fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring a container.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Prepend search roots, most recently declared first.
    ///
    /// Roots from earlier `include` calls remain as lower-priority fallbacks:
    /// `include([a, b])` then `include([c])` searches `c`, `b`, `a`.
    pub fn include<I>(&mut self, roots: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn ModuleSource>>,
    {
        self.roots.include(roots);
        debug!(roots = self.roots.len(), "root list updated");
        self
    }

    /// Prepend a single root.
    pub fn include_root(&mut self, source: impl ModuleSource + 'static) -> &mut Self {
        self.include([Arc::new(source) as Arc<dyn ModuleSource>])
    }

    /// Prepend a filesystem root for the given base directory.
    pub fn include_path(&mut self, base: impl Into<PathBuf>) -> &mut Self {
        self.include_root(FsRoot::new(base))
    }

    /// Seed cache entries ahead of any load.
    ///
    /// Injected values are indistinguishable from loaded modules to the
    /// resolver. A name that is already bound keeps its first binding; the
    /// duplicate is logged, never silently applied.
    pub fn inject<I, N>(&mut self, mapping: I) -> &mut Self
    where
        I: IntoIterator<Item = (N, ModuleValue)>,
        N: Into<String>,
    {
        self.cache.seed(mapping);
        self
    }

    /// Seed a single cache entry from any payload.
    pub fn inject_value<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> &mut Self {
        self.inject([(name.into(), ModuleValue::new(value))])
    }

    /// The configured roots, in search order.
    #[must_use]
    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    /// The instance cache shared by injection and resolution.
    #[must_use]
    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    /// Resolve the named dependencies.
    ///
    /// Resolution never starts in the caller's frame: the future is inert
    /// until polled and yields to the scheduler once before walking.
    pub async fn resolve<I, S>(&self, names: I) -> Result<ResolvedModules>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        debug!(?names, "load requested");
        tokio::task::yield_now().await;
        Resolver::new(&self.roots, &self.cache).resolve(names, Vec::new(), Consumer::Root).await
    }

    /// Resolve the dependencies declared by a signature string.
    pub async fn resolve_signature(&self, signature: &str) -> Result<ResolvedModules> {
        self.resolve(parse_signature(signature)).await
    }

    /// Resolve the named dependencies, then invoke `handler` with them.
    ///
    /// The handler runs only on success; a failed resolution surfaces as the
    /// returned error and the handler is never invoked.
    pub async fn load<I, S, H, R>(&self, names: I, handler: H) -> Result<R>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        H: FnOnce(&ResolvedModules) -> R,
    {
        let resolved = self.resolve(names).await?;
        Ok(handler(&resolved))
    }

    /// [`Container::load`] with the dependency list parsed from a signature.
    pub async fn load_signature<H, R>(&self, signature: &str, handler: H) -> Result<R>
    where
        H: FnOnce(&ResolvedModules) -> R,
    {
        self.load(parse_signature(signature), handler).await
    }
}

/// Build a fresh container and include the given roots.
#[must_use]
pub fn include<I>(roots: I) -> Container
where
    I: IntoIterator<Item = Arc<dyn ModuleSource>>,
{
    let mut container = Container::new();
    container.include(roots);
    container
}

/// Build a fresh container and seed the given cache entries.
#[must_use]
pub fn inject<I, N>(mapping: I) -> Container
where
    I: IntoIterator<Item = (N, ModuleValue)>,
    N: Into<String>,
{
    let mut container = Container::new();
    container.inject(mapping);
    container
}
