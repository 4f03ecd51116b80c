//! Injection: pre-seeded cache entries and write-once semantics.

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wireup::container::{self, Container};
use wireup::module::ModuleValue;
use wireup::source::RegistryRoot;

use crate::common::{as_source, counting_module, get_string, init_tracing};

#[tokio::test]
async fn injected_values_bypass_the_module_source() -> Result<()> {
    init_tracing();
    let count = Arc::new(AtomicUsize::new(0));
    // The registry also knows "bar"; injection must win without touching it.
    let root = RegistryRoot::new("app")
        .with_module("bar", counting_module(Arc::clone(&count), "from-source"));

    let injected = ModuleValue::new("from-injection".to_string());
    let mut container = Container::new();
    container.include([as_source(root)]).inject([("bar", injected.clone())]);

    let loaded = container.load(["bar"], |m| m.get("bar").unwrap().clone()).await?;
    assert!(loaded.same_instance(&injected));
    assert_eq!(count.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn injected_and_loaded_modules_are_indistinguishable() -> Result<()> {
    let uses_config = wireup::module::ModuleDef::new("config", |modules| {
        let config: &String = modules.required("config")?.downcast_ref().unwrap();
        Ok(ModuleValue::new(format!("wired:{config}")))
    })?;
    let root = RegistryRoot::new("app").with_module("service", uses_config);

    let mut container = Container::new();
    container.include([as_source(root)]).inject_value("config", "injected".to_string());

    let service = container.load(["service"], |m| get_string(m, "service")).await?;
    assert_eq!(service, "wired:injected");
    Ok(())
}

#[tokio::test]
async fn duplicate_injection_keeps_the_first_binding() -> Result<()> {
    let mut container = Container::new();
    container.inject_value("flag", "first".to_string());
    container.inject_value("flag", "second".to_string());

    let flag = container.load(["flag"], |m| get_string(m, "flag")).await?;
    assert_eq!(flag, "first");
    Ok(())
}

#[tokio::test]
async fn injection_after_a_load_does_not_rebind() -> Result<()> {
    let count = Arc::new(AtomicUsize::new(0));
    let root = RegistryRoot::new("app")
        .with_module("config", counting_module(Arc::clone(&count), "constructed"));
    let mut container = Container::new();
    container.include([as_source(root)]);

    let constructed = container.load(["config"], |m| get_string(m, "config")).await?;
    assert_eq!(constructed, "constructed");

    container.inject_value("config", "late".to_string());
    let still = container.load(["config"], |m| get_string(m, "config")).await?;
    assert_eq!(still, "constructed");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn one_shot_inject_chains_like_the_original_surface() -> Result<()> {
    let answer = container::inject([("answer", ModuleValue::new(42u8))])
        .load(["answer"], |m| *m.get("answer").unwrap().downcast_ref::<u8>().unwrap())
        .await?;
    assert_eq!(answer, 42);
    Ok(())
}
