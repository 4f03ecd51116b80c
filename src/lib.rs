//! wireup - a convention-based dependency-injection module loader.
//!
//! Callers declare the ordered list of dependency names a handler needs; the
//! loader resolves, instantiates, and caches those modules before invoking the
//! handler, recursively resolving each module's own declared dependencies
//! first. Lookup walks a prioritized list of roots with a naming-convention
//! fallback, instantiation may be synchronous or asynchronous, and every name
//! is instantiated at most once per container.
//!
//! # Architecture Overview
//!
//! A load call flows through four layers:
//! - the [`container`] façade holds the configuration (roots, cache) and
//!   translates `include` / `inject` / `load` into one resolver walk;
//! - the [`resolver`] walks the requested names depth-first, in declaration
//!   order, detecting cycles on the recursion path and aggregating directory
//!   namespaces;
//! - the [`source`] layer locates loadable units across the roots under a
//!   tri-state found / not-found / hard-error contract;
//! - the [`cache`] publishes each resolved value, write-once, so siblings and
//!   later loads reuse instances instead of re-instantiating them.
//!
//! ## Key Properties
//!
//! - **At-most-once instantiation**: a resolved name is never constructed
//!   again within the same container, whether it was loaded or injected
//! - **Deterministic ordering**: siblings resolve strictly in declaration
//!   order with cooperative yields in between; no fan-out parallelism
//! - **Typed failures**: missing dependencies, cycles, source errors, and
//!   async contract violations surface as [`core::WireupError`] values on one
//!   result channel - nothing is emitted, retried, or silently dropped
//! - **Explicit configuration**: search roots and the ambient fallback are
//!   injected, never implied
//!
//! # Core Modules
//!
//! - [`container`] - `Container`, `ContainerBuilder`, and the one-shot helpers
//! - [`resolver`] - the dependency graph walker
//! - [`source`] - `ModuleSource` trait, `RegistryRoot`, `FsRoot`, root search
//! - [`cache`] - the write-once instance cache
//! - [`module`] - loadable units, values, completion handles
//! - [`signature`] - dependency-signature parsing
//! - [`core`] - shared types and error handling
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wireup::container::Container;
//! use wireup::module::{ModuleDef, ModuleValue};
//! use wireup::source::{ModuleSource, RegistryRoot};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let registry = RegistryRoot::new("app")
//!     .with_value("port", 8080u16)
//!     .with_module("server", ModuleDef::new("port", |modules| {
//!         let port: &u16 = modules.required("port")?.downcast_ref().unwrap();
//!         Ok(ModuleValue::new(format!("listening on :{port}")))
//!     })?);
//!
//! let mut container = Container::new();
//! container.include([Arc::new(registry) as Arc<dyn ModuleSource>]);
//!
//! let banner = container
//!     .load(["server"], |modules| {
//!         modules.required("server").unwrap().downcast_ref::<String>().unwrap().clone()
//!     })
//!     .await?;
//! assert_eq!(banner, "listening on :8080");
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod cache;
pub mod container;
pub mod core;
pub mod resolver;
pub mod source;

// Data model and declaration parsing
pub mod module;
pub mod signature;
