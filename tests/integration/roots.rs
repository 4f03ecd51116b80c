//! Root search order: include priority and the ambient fallback.

use anyhow::Result;
use std::sync::Arc;

use wireup::container::Container;
use wireup::source::RegistryRoot;

use crate::common::{as_source, get_string, init_tracing};

fn labeled_root(label: &str, names: &[&str]) -> Arc<dyn wireup::source::ModuleSource> {
    let mut root = RegistryRoot::new(label);
    for name in names {
        root = root.with_value(*name, format!("{label}:{name}"));
    }
    as_source(root)
}

#[tokio::test]
async fn later_includes_take_priority_over_earlier_ones() -> Result<()> {
    init_tracing();
    let mut container = Container::new();
    container.include([labeled_root("a", &["dep"]), labeled_root("b", &["dep"])]);
    container.include([labeled_root("c", &["dep"])]);

    // include([a, b]) then include([c]) searches c, then b, then a.
    let dep = container.load(["dep"], |m| get_string(m, "dep")).await?;
    assert_eq!(dep, "c:dep");
    Ok(())
}

#[tokio::test]
async fn within_one_include_the_most_recent_root_wins() -> Result<()> {
    let mut container = Container::new();
    container.include([labeled_root("a", &["dep"]), labeled_root("b", &["dep"])]);

    let dep = container.load(["dep"], |m| get_string(m, "dep")).await?;
    assert_eq!(dep, "b:dep");
    Ok(())
}

#[tokio::test]
async fn earlier_includes_remain_as_fallbacks() -> Result<()> {
    let mut container = Container::new();
    container.include([labeled_root("a", &["dep", "base_only"])]);
    container.include([labeled_root("c", &["dep"])]);

    let (dep, base) = container
        .load(["dep", "base_only"], |m| {
            (get_string(m, "dep"), get_string(m, "base_only"))
        })
        .await?;
    assert_eq!(dep, "c:dep");
    assert_eq!(base, "a:base_only");
    Ok(())
}

#[tokio::test]
async fn ambient_source_is_searched_after_every_root() -> Result<()> {
    let mut container = Container::builder()
        .ambient(labeled_root("ambient", &["dep", "ambient_only"]))
        .build();
    container.include([labeled_root("app", &["dep"])]);

    let (dep, ambient_only) = container
        .load(["dep", "ambient_only"], |m| {
            (get_string(m, "dep"), get_string(m, "ambient_only"))
        })
        .await?;
    assert_eq!(dep, "app:dep");
    assert_eq!(ambient_only, "ambient:ambient_only");
    Ok(())
}

#[tokio::test]
async fn containers_have_no_implicit_ambient_source() -> Result<()> {
    let mut container = Container::new();
    container.include([labeled_root("app", &[])]);

    let err = container.load(["ambient_only"], |_| ()).await.unwrap_err();
    assert!(err.to_string().contains("\"ambient_only\""));
    Ok(())
}
