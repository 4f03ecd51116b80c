//! Failure attribution and propagation.

use anyhow::Result;

use wireup::container::Container;
use wireup::core::{Consumer, WireupError, user_friendly_error};
use wireup::module::{ModuleDef, ModuleValue};
use wireup::source::{FsRoot, RegistryRoot};

use crate::common::{as_source, init_tracing};

fn downcast(err: &anyhow::Error) -> &WireupError {
    err.downcast_ref::<WireupError>().expect("loader failures are typed")
}

#[tokio::test]
async fn missing_root_dependency_names_the_top_level_consumer() -> Result<()> {
    init_tracing();
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app"))]);

    let err = container.load(["nonexistent"], |_| ()).await.unwrap_err();
    match downcast(&err) {
        WireupError::DependencyNotFound { name, consumer, attempted, .. } => {
            assert_eq!(name, "nonexistent");
            assert_eq!(*consumer, Consumer::Root);
            assert_eq!(attempted.as_slice(), ["app:nonexistent"]);
        }
        other => panic!("expected DependencyNotFound, got {other}"),
    }
    assert!(err.to_string().contains("nonexistent"));
    Ok(())
}

#[tokio::test]
async fn missing_nested_dependency_names_the_requesting_module() -> Result<()> {
    let foo = ModuleDef::new("bar", |modules| Ok(modules.required("bar")?.clone()))?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("foo", foo))]);

    let err = container.load(["foo"], |_| ()).await.unwrap_err();
    match downcast(&err) {
        WireupError::DependencyNotFound { name, consumer, .. } => {
            assert_eq!(name, "bar");
            assert_eq!(consumer.origin(), Some("app:foo"));
        }
        other => panic!("expected DependencyNotFound, got {other}"),
    }
    assert!(err.to_string().contains("\"bar\""));
    assert!(err.to_string().contains("app:foo"));
    Ok(())
}

#[tokio::test]
async fn direct_cycles_are_reported_with_the_dependency_name() -> Result<()> {
    let foo = ModuleDef::new("foo", |_| Ok(ModuleValue::new(())))?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("foo", foo))]);

    let err = container.load(["foo"], |_| ()).await.unwrap_err();
    assert!(err.to_string().contains("Circular dependency"));
    assert!(err.to_string().contains("\"foo\""));
    Ok(())
}

#[tokio::test]
async fn nested_cycles_are_reported_at_the_point_of_detection() -> Result<()> {
    let foo = ModuleDef::new("bar", |_| Ok(ModuleValue::new(())))?;
    let bar = ModuleDef::new("foo", |_| Ok(ModuleValue::new(())))?;
    let mut container = Container::new();
    container.include([as_source(
        RegistryRoot::new("app").with_module("foo", foo).with_module("bar", bar),
    )]);

    let err = container.load(["foo"], |_| ()).await.unwrap_err();
    match downcast(&err) {
        WireupError::CircularDependency { name, consumer } => {
            assert_eq!(name, "foo");
            assert_eq!(consumer.origin(), Some("app:bar"));
        }
        other => panic!("expected CircularDependency, got {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn same_name_in_sibling_branches_is_not_a_cycle() -> Result<()> {
    let shared = ModuleDef::new("", |_| Ok(ModuleValue::new("shared".to_string())))?;
    let left = ModuleDef::new("shared", |m| Ok(m.required("shared")?.clone()))?;
    let right = ModuleDef::new("shared", |m| Ok(m.required("shared")?.clone()))?;
    let mut container = Container::new();
    container.include([as_source(
        RegistryRoot::new("app")
            .with_module("shared", shared)
            .with_module("left", left)
            .with_module("right", right),
    )]);

    assert!(container.load(["left", "right"], |_| ()).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn malformed_source_content_is_a_hard_error_not_a_miss() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("broken.json"), "{ definitely not json")?;

    // A lower-priority root also knows "broken"; the hard error must win
    // instead of falling through to it.
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("fallback").with_value("broken", 1u8))]);
    container.include_path(dir.path());

    let err = container.load(["broken"], |_| ()).await.unwrap_err();
    match downcast(&err) {
        WireupError::SourceError { name, .. } => assert_eq!(name, "broken"),
        other => panic!("expected SourceError, got {other}"),
    }
    let chain = format!("{err:#}");
    assert!(chain.contains("invalid JSON"));
    Ok(())
}

#[tokio::test]
async fn not_found_collects_attempts_across_all_roots() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("reg"))]);
    container.include([std::sync::Arc::new(FsRoot::new(dir.path()))
        as std::sync::Arc<dyn wireup::source::ModuleSource>]);

    let err = container.load(["missing_thing"], |_| ()).await.unwrap_err();
    match downcast(&err) {
        WireupError::DependencyNotFound { attempted, .. } => {
            assert!(attempted.iter().any(|probe| probe.ends_with("missing_thing.json")));
            assert!(attempted.iter().any(|probe| probe.ends_with("missing/thing")));
            assert!(attempted.contains(&"reg:missing_thing".to_string()));
            assert!(attempted.contains(&"reg:missing/thing".to_string()));
        }
        other => panic!("expected DependencyNotFound, got {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn near_miss_names_produce_a_suggestion() -> Result<()> {
    let mut container = Container::new();
    container
        .include([as_source(RegistryRoot::new("app").with_value("database", 1u8))]);

    let err = container.load(["databse"], |_| ()).await.unwrap_err();
    assert!(err.to_string().contains("did you mean \"database\"?"));

    let ctx = user_friendly_error(err);
    assert!(ctx.suggestion.unwrap().contains("database"));
    Ok(())
}

#[tokio::test]
async fn constructor_errors_carry_the_module_identity() -> Result<()> {
    let failing = ModuleDef::new("", |_| Err(anyhow::anyhow!("refused to start")))?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("svc", failing))]);

    let err = container.load(["svc"], |_| ()).await.unwrap_err();
    match downcast(&err) {
        WireupError::ConstructorFailed { name, origin, .. } => {
            assert_eq!(name, "svc");
            assert_eq!(origin, "app:svc");
        }
        other => panic!("expected ConstructorFailed, got {other}"),
    }
    let chain = format!("{err:#}");
    assert!(chain.contains("refused to start"));
    Ok(())
}
