//! Example host feeding queued resource events through hookline.
//!
//! Events arrive as JSON messages on a list-backed queue. The host pops them
//! from the head one at a time, decodes each into a [`ResourceEvent`], and
//! runs it through the [`HookRuntime`] before it would be persisted.
//!
//! ```text
//! ┌──────────────┐  pop   ┌────────┐  invoke_event  ┌─────────────┐
//! │  EventQueue  │───────▶│ decode │───────────────▶│ HookRuntime │──▶ persist
//! └──────────────┘        └────────┘                └─────────────┘
//! ```

use hookline_system::extension::{Extension, FnExtension};
use hookline_system::pipeline::PipelineError;
use hookline_system::runtime::HookRuntime;
use hookline_system::state::{ResourceEvent, ResourceState};
use std::collections::VecDeque;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// EventQueue
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory list of raw event messages.
///
/// `push` appends to the tail and `pop` removes from the head, so events are
/// processed in arrival order.
#[derive(Debug, Default)]
pub struct EventQueue {
    messages: VecDeque<String>,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue from newline-separated messages. Blank lines are ignored.
    #[must_use]
    pub fn from_lines(input: &str) -> Self {
        input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Appends a raw message to the tail.
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push_back(message.into());
    }

    /// Serializes `event` and appends it to the tail.
    pub fn push_event(&mut self, event: &ResourceEvent) -> Result<(), serde_json::Error> {
        self.push(serde_json::to_string(event)?);
        Ok(())
    }

    /// Removes and returns the message at the head, if any.
    pub fn pop(&mut self) -> Option<String> {
        self.messages.pop_front()
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no messages are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl FromIterator<String> for EventQueue {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draining
// ─────────────────────────────────────────────────────────────────────────────

/// Reasons a queued event could not be processed.
#[derive(Debug, Error)]
pub enum EventError {
    /// The message is not a valid resource event.
    #[error("malformed event: {0}")]
    Decode(#[from] serde_json::Error),

    /// The pipeline rejected the event.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// A processed event ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    /// Kind of resource the event was about.
    pub resource_type: String,
    /// Final state returned by the chain.
    pub state: ResourceState,
}

/// Outcome of draining a queue.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Events that passed through the chain, in queue order.
    pub processed: Vec<Processed>,
    /// Number of events that failed to decode or were rejected.
    pub failed: usize,
}

impl DrainReport {
    /// Total number of events popped from the queue.
    #[must_use]
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed
    }
}

/// Decodes one message and runs it through `runtime`.
pub fn process(runtime: &HookRuntime, message: &str) -> Result<Processed, EventError> {
    let event: ResourceEvent = serde_json::from_str(message)?;
    let resource_type = event.resource_type.clone();
    let state = runtime.invoke_event(event)?;
    Ok(Processed {
        resource_type,
        state,
    })
}

/// Pops every queued message and runs it through `runtime`.
///
/// A failing event is logged and counted; draining continues with the next
/// one.
pub fn drain_into(queue: &mut EventQueue, runtime: &HookRuntime) -> DrainReport {
    let mut report = DrainReport::default();
    while let Some(message) = queue.pop() {
        match process(runtime, &message) {
            Ok(processed) => {
                tracing::debug!(resource_type = %processed.resource_type, "event processed");
                report.processed.push(processed);
            }
            Err(err) => {
                tracing::warn!(error = %err, "event failed");
                report.failed += 1;
            }
        }
    }
    tracing::info!(
        processed = report.processed.len(),
        failed = report.failed,
        "queue drained"
    );
    report
}

// ─────────────────────────────────────────────────────────────────────────────
// Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Sets `revision` to one more than the prior state's, starting at 1.
///
/// A missing or non-numeric prior revision counts as 0; the counter
/// saturates at `u64::MAX`.
pub fn revision_counter() -> impl Extension {
    FnExtension::new("revision", |_ty, state: ResourceState, prior| {
        let revision = prior
            .and_then(|p| p.get("revision"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        Ok(state.with("revision", revision.saturating_add(1)))
    })
}
