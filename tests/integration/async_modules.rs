//! Asynchronous modules and the completion contract.

use anyhow::Result;
use std::time::Duration;

use wireup::container::Container;
use wireup::core::WireupError;
use wireup::module::{ModuleDef, ModuleValue};
use wireup::source::RegistryRoot;

use crate::common::{as_source, get_string, init_tracing};

#[tokio::test]
async fn async_modules_resolve_to_the_completed_value() -> Result<()> {
    init_tracing();
    let answering = ModuleDef::new_async("callback", |_, completion| {
        completion.resolve(ModuleValue::new("value".to_string()));
        Ok(())
    })?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("answer", answering))]);

    let answer = container.load(["answer"], |m| get_string(m, "answer")).await?;
    assert_eq!(answer, "value");
    Ok(())
}

#[tokio::test]
async fn async_completion_errors_reach_the_caller_without_the_handler() -> Result<()> {
    let failing = ModuleDef::new_async("callback", |_, completion| {
        completion.fail(anyhow::anyhow!("backend unavailable"));
        Ok(())
    })?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("svc", failing))]);

    let mut handled = false;
    let err = container.load(["svc"], |_| handled = true).await.unwrap_err();
    assert!(!handled, "the handler must not run on failure");
    match err.downcast_ref::<WireupError>().unwrap() {
        WireupError::ConstructorFailed { name, .. } => assert_eq!(name, "svc"),
        other => panic!("expected ConstructorFailed, got {other}"),
    }
    assert!(format!("{err:#}").contains("backend unavailable"));
    Ok(())
}

#[tokio::test]
async fn async_modules_receive_their_dependencies_first() -> Result<()> {
    let doubler = ModuleDef::new_async("seed, callback", |modules, completion| {
        let seed: &u32 = modules.required("seed")?.downcast_ref().unwrap();
        completion.resolve(ModuleValue::new(seed * 2));
        Ok(())
    })?;
    let mut container = Container::new();
    container.include([as_source(
        RegistryRoot::new("app").with_value("seed", 21u32).with_module("doubled", doubler),
    )]);

    let doubled = container
        .load(["doubled"], |m| *m.get("doubled").unwrap().downcast_ref::<u32>().unwrap())
        .await?;
    assert_eq!(doubled, 42);
    Ok(())
}

#[tokio::test]
async fn completion_may_arrive_from_a_spawned_task() -> Result<()> {
    let deferred = ModuleDef::new_async("callback", |_, completion| {
        let completion = completion.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            completion.resolve(ModuleValue::new("late".to_string()));
        });
        Ok(())
    })?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("slow", deferred))]);

    let late = container.load(["slow"], |m| get_string(m, "slow")).await?;
    assert_eq!(late, "late");
    Ok(())
}

#[tokio::test]
async fn dropping_every_completion_handle_fails_the_load() -> Result<()> {
    let forgetful = ModuleDef::new_async("callback", |_, completion| {
        drop(completion);
        Ok(())
    })?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("svc", forgetful))]);

    let err = container.load(["svc"], |_| ()).await.unwrap_err();
    match err.downcast_ref::<WireupError>().unwrap() {
        WireupError::AsyncCompletionDropped { name, origin } => {
            assert_eq!(name, "svc");
            assert_eq!(origin, "app:svc");
        }
        other => panic!("expected AsyncCompletionDropped, got {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn second_completion_invocations_are_ignored() -> Result<()> {
    let eager = ModuleDef::new_async("callback", |_, completion| {
        completion.resolve(ModuleValue::new("first".to_string()));
        completion.resolve(ModuleValue::new("second".to_string()));
        Ok(())
    })?;
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("svc", eager))]);

    let value = container.load(["svc"], |m| get_string(m, "svc")).await?;
    assert_eq!(value, "first");
    Ok(())
}

#[tokio::test]
async fn async_results_are_cached_like_sync_ones() -> Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let count = Arc::new(AtomicUsize::new(0));
    let counted = {
        let count = Arc::clone(&count);
        ModuleDef::new_async("callback", move |_, completion| {
            count.fetch_add(1, Ordering::SeqCst);
            completion.resolve(ModuleValue::new("once".to_string()));
            Ok(())
        })?
    };
    let mut container = Container::new();
    container.include([as_source(RegistryRoot::new("app").with_module("svc", counted))]);

    let first = container.load(["svc"], |m| get_string(m, "svc")).await?;
    let second = container.load(["svc"], |m| get_string(m, "svc")).await?;
    assert_eq!(first, "once");
    assert_eq!(second, "once");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    Ok(())
}
