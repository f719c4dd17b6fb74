//! Chained invocation of extensions over a resource mutation.
//!
//! The pipeline threads the candidate state through the resolved chain:
//!
//! ```text
//! state₀ = new_state
//! stateᵢ = eᵢ.transform(resource_type, stateᵢ₋₁, prior_state)
//! ```
//!
//! Extension `i + 1` never starts before extension `i` returns. The prior
//! state is only ever lent out by shared reference.
//!
//! # Failure Handling
//!
//! A failing `transform` is handled by the uniform [`FailurePolicy`]:
//!
//! - [`Abort`](FailurePolicy::Abort): no further extension runs and the
//!   failure is returned.
//! - [`Skip`](FailurePolicy::Skip): the failure is logged and recorded in the
//!   [`Invocation`] and the chain continues with `stateᵢ₋₁`.
//!
//! When panic isolation is enabled, a panicking `transform` is treated as a
//! failure carrying [`ExtensionError::Panicked`].

use thiserror::Error;

use crate::config::{FailurePolicy, RuntimeConfig};
use crate::extension::{ExtensionError, ExtensionId};
use crate::lifecycle::LifecycleState;
use crate::registry::RegisteredExtension;
use crate::state::ResourceState;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A failed `transform` call.
#[derive(Debug, Error)]
#[error("extension '{extension_id}' failed to transform '{resource_type}': {cause}")]
pub struct TransformFailure {
    /// The failing extension.
    pub extension_id: ExtensionId,
    /// The resource type being invoked.
    pub resource_type: String,
    /// The reported cause.
    #[source]
    pub cause: ExtensionError,
}

/// Errors returned by an invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The runtime is not `Initialized`.
    #[error("pipeline is not ready: runtime is {state}")]
    NotReady {
        /// The state the runtime was in.
        state: LifecycleState,
    },

    /// An extension failed under [`FailurePolicy::Abort`].
    #[error(transparent)]
    Transform(#[from] TransformFailure),
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a completed invocation.
#[derive(Debug)]
pub struct Invocation {
    /// The final threaded state to persist.
    pub state: ResourceState,
    /// Failures that were skipped under [`FailurePolicy::Skip`], in chain order.
    pub skipped: Vec<TransformFailure>,
}

impl Invocation {
    /// Returns true if every extension in the chain succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chain execution
// ─────────────────────────────────────────────────────────────────────────────

/// Runs `chain` over `new_state` according to `config`.
pub(crate) fn run_chain<'a>(
    chain: impl Iterator<Item = &'a RegisteredExtension>,
    config: &RuntimeConfig,
    resource_type: &str,
    new_state: ResourceState,
    prior_state: Option<&ResourceState>,
) -> Result<Invocation, TransformFailure> {
    let mut state = new_state;
    let mut skipped = Vec::new();

    for entry in chain {
        tracing::trace!(extension = %entry.id(), resource_type, "applying extension");

        let result = match config.failure_policy {
            FailurePolicy::Abort => apply(entry, config, resource_type, state, prior_state),
            FailurePolicy::Skip => {
                let input = state.clone();
                match apply(entry, config, resource_type, input, prior_state) {
                    Ok(next) => Ok(next),
                    Err(cause) => {
                        let failure = TransformFailure {
                            extension_id: entry.id().clone(),
                            resource_type: resource_type.to_string(),
                            cause,
                        };
                        tracing::warn!(
                            extension = %failure.extension_id,
                            resource_type,
                            error = %failure.cause,
                            "extension failed, skipping"
                        );
                        skipped.push(failure);
                        continue;
                    }
                }
            }
        };

        state = match result {
            Ok(next) => next,
            Err(cause) => {
                tracing::warn!(
                    extension = %entry.id(),
                    resource_type,
                    error = %cause,
                    "extension failed, aborting chain"
                );
                return Err(TransformFailure {
                    extension_id: entry.id().clone(),
                    resource_type: resource_type.to_string(),
                    cause,
                });
            }
        };
    }

    Ok(Invocation { state, skipped })
}

fn apply(
    entry: &RegisteredExtension,
    config: &RuntimeConfig,
    resource_type: &str,
    state: ResourceState,
    prior_state: Option<&ResourceState>,
) -> Result<ResourceState, ExtensionError> {
    let extension = entry.extension();
    ExtensionError::guard(config.catch_panics, || {
        extension.transform(resource_type, state, prior_state)
    })
}
