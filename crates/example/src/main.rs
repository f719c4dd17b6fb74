//! Example queue-draining host.
//!
//! Reads newline-delimited JSON resource events, runs each through a small
//! extension chain, and logs the state that would be persisted.
//!
//! # Usage
//!
//! ```bash
//! drain [events.jsonl]
//! ```
//!
//! Without an argument a few built-in sample events are used. The failure
//! policy is read from `HOOKLINE_FAILURE_POLICY` (`abort` or `skip`), and a
//! `.env` file is honored. Exits with status 2 if any event failed.
//!
//! # Example
//!
//! ```bash
//! HOOKLINE_FAILURE_POLICY=skip drain ./events.jsonl
//! ```

use example::{EventQueue, drain_into, revision_counter};
use hookline_core::{DefaultExtensions, StampExtension, TracingConfig, TracingExtension};
use hookline_system::prelude::*;
use std::path::PathBuf;
use tracing::Level;

const SAMPLE_EVENTS: &str = r#"
{"resource_type":"indicator","new_state":{"title":"c2 beacon","tlp":"green"}}
{"resource_type":"actor","new_state":{"name":"APT-0"},"prior_state":{"name":"unknown","revision":3}}
{"resource_type":"indicator","new_state":{}}
"#;

fn main() {
    let _ = dotenvy::dotenv();

    TracingConfig::default().with_level(Level::DEBUG).install();

    let input = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => std::fs::read_to_string(&path).unwrap_or_else(|e| {
            eprintln!("Error: cannot read {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => SAMPLE_EVENTS.to_string(),
    };

    let config = RuntimeConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let runtime = HookRuntime::with_config(config);
    if let Err(e) = register_extensions(&runtime) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = runtime.startup() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let mut queue = EventQueue::from_lines(&input);
    let report = drain_into(&mut queue, &runtime);
    for processed in &report.processed {
        tracing::info!(
            resource_type = %processed.resource_type,
            state = %processed.state,
            "ready to persist"
        );
    }

    if let Err(e) = runtime.shutdown() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if report.failed > 0 {
        std::process::exit(2);
    }
}

fn register_extensions(runtime: &HookRuntime) -> Result<(), RegistryError> {
    runtime.register_group(
        DefaultExtensions
            .build()
            .add_after(
                TracingExtension::NAME,
                StampExtension::new("source", "queue").keep_existing(),
                Binding::AllResources,
            ),
    )?;
    runtime.register(revision_counter(), Binding::resource("actor"))?;
    runtime.register(
        FnExtension::new("require-title", |_ty, state: ResourceState, _prior| {
            if state.contains("title") {
                Ok(state)
            } else {
                Err(ExtensionError::message("indicator has no title"))
            }
        }),
        Binding::resource("indicator"),
    )?;
    Ok(())
}
