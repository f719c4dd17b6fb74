//! Lifecycle tests for `HookRuntime`.
//!
//! These tests verify initialize-once / destroy-once semantics, startup
//! rollback, and best-effort shutdown.


use hookline_system::prelude::*;
use test_utils::{CallLog, Recorder};

#[test]
fn startup_initializes_in_registration_order() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(Recorder::new("a", &log), Binding::resource("actor"))
        .unwrap();
    runtime
        .register(Recorder::new("b", &log), Binding::AllResources)
        .unwrap();

    runtime.startup().unwrap();

    assert_eq!(runtime.state(), LifecycleState::Initialized);
    assert_eq!(log.calls(), ["initialize:a", "initialize:b"]);
}

#[test]
fn shutdown_destroys_in_reverse_order() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    for name in ["a", "b", "c"] {
        runtime
            .register(Recorder::new(name, &log), Binding::AllResources)
            .unwrap();
    }

    runtime.startup().unwrap();
    runtime.shutdown().unwrap();

    assert_eq!(runtime.state(), LifecycleState::Destroyed);
    assert_eq!(
        log.calls(),
        [
            "initialize:a",
            "initialize:b",
            "initialize:c",
            "destroy:c",
            "destroy:b",
            "destroy:a"
        ]
    );
}

#[test]
fn second_startup_fails_with_invalid_transition() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(Recorder::new("a", &log), Binding::AllResources)
        .unwrap();
    runtime.startup().unwrap();

    let err = runtime.startup().unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            state: LifecycleState::Initialized,
            ..
        }
    ));
    assert_eq!(log.count("initialize:a"), 1);
    assert_eq!(runtime.state(), LifecycleState::Initialized);
}

#[test]
fn shutdown_before_startup_fails_with_invalid_transition() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(Recorder::new("a", &log), Binding::AllResources)
        .unwrap();

    let err = runtime.shutdown().unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            state: LifecycleState::Uninitialized,
            ..
        }
    ));
    assert!(log.calls().is_empty());
    assert_eq!(runtime.state(), LifecycleState::Uninitialized);
}

#[test]
fn second_shutdown_does_not_destroy_again() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(Recorder::new("a", &log), Binding::AllResources)
        .unwrap();
    runtime.startup().unwrap();
    runtime.shutdown().unwrap();

    assert!(runtime.shutdown().is_err());
    assert!(runtime.startup().is_err());
    assert_eq!(log.count("destroy:a"), 1);
    assert_eq!(log.count("initialize:a"), 1);
}

#[test]
fn failed_initialize_rolls_back_previous_extensions_once() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(Recorder::new("e1", &log), Binding::AllResources)
        .unwrap();
    runtime
        .register(
            Recorder::new("e2", &log).failing_initialize(),
            Binding::AllResources,
        )
        .unwrap();
    runtime
        .register(Recorder::new("e3", &log), Binding::AllResources)
        .unwrap();

    let err = runtime.startup().unwrap_err();

    match err {
        LifecycleError::StartupFailure {
            extension_id,
            cause,
        } => {
            assert_eq!(extension_id, "e2");
            assert_eq!(cause.to_string(), "e2 cannot start");
        }
        other => panic!("expected startup failure, got {other:?}"),
    }
    assert_eq!(log.count("destroy:e1"), 1);
    assert_eq!(log.count("initialize:e3"), 0);
    assert_eq!(log.count("destroy:e2"), 0);
    assert_eq!(runtime.state(), LifecycleState::Uninitialized);
}

#[test]
fn startup_can_be_retried_after_failure() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(
            Recorder::new("broken", &log).failing_initialize(),
            Binding::AllResources,
        )
        .unwrap();
    assert!(runtime.startup().is_err());

    // Registration stays open while uninitialized.
    runtime
        .register(Recorder::new("late", &log), Binding::AllResources)
        .unwrap();
    assert!(runtime.startup().is_err());
    assert_eq!(log.count("initialize:broken"), 2);
    assert_eq!(runtime.state(), LifecycleState::Uninitialized);
}

#[test]
fn shutdown_failures_are_batched_and_non_fatal() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(
            Recorder::new("a", &log).failing_destroy(),
            Binding::AllResources,
        )
        .unwrap();
    runtime
        .register(Recorder::new("b", &log), Binding::AllResources)
        .unwrap();
    runtime
        .register(
            Recorder::new("c", &log).failing_destroy(),
            Binding::AllResources,
        )
        .unwrap();
    runtime.startup().unwrap();

    let err = runtime.shutdown().unwrap_err();

    let LifecycleError::ShutdownFailure { failures } = err else {
        panic!("expected shutdown failure");
    };
    let failed: Vec<_> = failures.iter().map(|f| f.extension_id.to_string()).collect();
    assert_eq!(failed, ["c", "a"]);
    assert_eq!(log.count("destroy:a"), 1);
    assert_eq!(log.count("destroy:b"), 1);
    assert_eq!(log.count("destroy:c"), 1);
    assert_eq!(runtime.state(), LifecycleState::Destroyed);
}

#[test]
fn empty_runtime_lifecycle() {
    let runtime = HookRuntime::new();
    assert!(runtime.is_empty());
    runtime.startup().unwrap();
    runtime.shutdown().unwrap();
    assert_eq!(runtime.state(), LifecycleState::Destroyed);
}

#[test]
fn rollback_continues_past_destroy_failures() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(
            Recorder::new("e1", &log).failing_destroy(),
            Binding::AllResources,
        )
        .unwrap();
    runtime
        .register(Recorder::new("e2", &log), Binding::AllResources)
        .unwrap();
    runtime
        .register(
            Recorder::new("e3", &log).failing_initialize(),
            Binding::AllResources,
        )
        .unwrap();

    let err = runtime.startup().unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::StartupFailure { ref extension_id, .. } if extension_id == "e3"
    ));
    assert_eq!(
        log.calls(),
        [
            "initialize:e1",
            "initialize:e2",
            "initialize:e3",
            "destroy:e2",
            "destroy:e1"
        ]
    );
    assert_eq!(runtime.state(), LifecycleState::Uninitialized);
}

#[test]
fn panicking_initialize_rolls_back_like_a_failure() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(Recorder::new("a", &log), Binding::AllResources)
        .unwrap();
    runtime
        .register(
            Recorder::new("boom", &log).panicking_initialize(),
            Binding::AllResources,
        )
        .unwrap();

    let err = runtime.startup().unwrap_err();

    match err {
        LifecycleError::StartupFailure {
            extension_id,
            cause: ExtensionError::Panicked(msg),
        } => {
            assert_eq!(extension_id, "boom");
            assert_eq!(msg, "boom panicked on start");
        }
        other => panic!("expected contained panic, got {other:?}"),
    }
    assert_eq!(log.count("destroy:a"), 1);
    assert_eq!(runtime.state(), LifecycleState::Uninitialized);
}

#[test]
fn panicking_destroy_still_reaches_destroyed() {
    let log = CallLog::new();
    let runtime = HookRuntime::new();
    runtime
        .register(Recorder::new("a", &log), Binding::AllResources)
        .unwrap();
    runtime
        .register(
            Recorder::new("boom", &log).panicking_destroy(),
            Binding::AllResources,
        )
        .unwrap();
    runtime
        .register(Recorder::new("c", &log), Binding::AllResources)
        .unwrap();
    runtime.startup().unwrap();

    let err = runtime.shutdown().unwrap_err();

    let LifecycleError::ShutdownFailure { failures } = err else {
        panic!("expected shutdown failure");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].extension_id, "boom");
    assert!(matches!(failures[0].cause, ExtensionError::Panicked(_)));
    assert_eq!(runtime.state(), LifecycleState::Destroyed);

    // A retried shutdown is rejected and destroys nothing twice.
    assert!(runtime.shutdown().is_err());
    for name in ["destroy:a", "destroy:boom", "destroy:c"] {
        assert_eq!(log.count(name), 1, "{name}");
    }
}
