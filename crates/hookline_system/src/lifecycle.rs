//! Initialize-once / destroy-once lifecycle of registered extensions.
//!
//! The lifecycle is a monotonic state machine:
//!
//! ```text
//! Uninitialized ──startup()──▶ Initialized ──shutdown()──▶ Destroyed
//! ```
//!
//! A failed `startup()` rolls back every extension it already initialized and
//! leaves the state at `Uninitialized`, so the host can fix its configuration
//! and retry. `shutdown()` is best-effort: every extension is destroyed even if
//! some of them fail, and the failures are reported together.

use core::fmt;

use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::extension::{ExtensionError, ExtensionId};
use crate::registry::ExtensionRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// LifecycleState
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide lifecycle state of a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Accepting registrations; nothing initialized yet.
    #[default]
    Uninitialized,
    /// All extensions initialized; invocations are accepted.
    Initialized,
    /// All extensions destroyed. Terminal.
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LifecycleError
// ─────────────────────────────────────────────────────────────────────────────

/// A single `destroy()` failure collected during shutdown.
#[derive(Debug, Error)]
#[error("extension '{extension_id}' failed to destroy: {cause}")]
pub struct DestroyFailure {
    /// The extension whose `destroy()` failed.
    pub extension_id: ExtensionId,
    /// The reported cause.
    #[source]
    pub cause: ExtensionError,
}

/// Errors surfaced by lifecycle transitions.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `startup()` or `shutdown()` was called from the wrong state.
    #[error("cannot {operation} a runtime that is {state}")]
    InvalidTransition {
        /// The attempted operation.
        operation: &'static str,
        /// The state the runtime was in.
        state: LifecycleState,
    },

    /// An extension failed to initialize; startup was rolled back.
    #[error("extension '{extension_id}' failed to initialize: {cause}")]
    StartupFailure {
        /// The extension whose `initialize()` failed.
        extension_id: ExtensionId,
        /// The reported cause.
        #[source]
        cause: ExtensionError,
    },

    /// One or more extensions failed to destroy. The runtime is still
    /// `Destroyed`.
    #[error("{} extension(s) failed to destroy during shutdown", failures.len())]
    ShutdownFailure {
        /// Every collected failure, in destroy order.
        failures: Vec<DestroyFailure>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state machine driving `initialize()`/`destroy()` over a registry.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// Creates a lifecycle in the `Uninitialized` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Initializes every extension in registration order.
    ///
    /// On failure, already-initialized extensions are destroyed in reverse
    /// order and the state stays `Uninitialized`. With
    /// [`catch_panics`](RuntimeConfig::catch_panics) set, a panic in either
    /// call counts as a failure.
    pub fn startup(
        &mut self,
        registry: &mut ExtensionRegistry,
        config: &RuntimeConfig,
    ) -> Result<(), LifecycleError> {
        self.expect_state(LifecycleState::Uninitialized, "start")?;

        let entries = registry.entries_mut();
        for index in 0..entries.len() {
            let entry = &mut entries[index];
            tracing::debug!(extension = %entry.id(), "initializing extension");

            let extension = entry.extension_mut();
            if let Err(cause) = ExtensionError::guard(config.catch_panics, || extension.initialize()) {
                let extension_id = entry.id().clone();
                tracing::error!(
                    extension = %extension_id,
                    error = %cause,
                    "extension failed to initialize, rolling back startup"
                );

                for initialized in entries[..index].iter_mut().rev() {
                    let extension = initialized.extension_mut();
                    if let Err(err) = ExtensionError::guard(config.catch_panics, || extension.destroy()) {
                        tracing::warn!(
                            extension = %initialized.id(),
                            error = %err,
                            "extension failed to destroy during startup rollback"
                        );
                    }
                }

                return Err(LifecycleError::StartupFailure {
                    extension_id,
                    cause,
                });
            }
        }

        self.state = LifecycleState::Initialized;
        tracing::info!(extensions = entries.len(), "extensions initialized");
        Ok(())
    }

    /// Destroys every extension in reverse registration order.
    ///
    /// Always transitions to `Destroyed` once started; individual failures are
    /// returned as [`LifecycleError::ShutdownFailure`].
    pub fn shutdown(
        &mut self,
        registry: &mut ExtensionRegistry,
        config: &RuntimeConfig,
    ) -> Result<(), LifecycleError> {
        self.expect_state(LifecycleState::Initialized, "shut down")?;

        let mut failures = Vec::new();
        for entry in registry.entries_mut().iter_mut().rev() {
            tracing::debug!(extension = %entry.id(), "destroying extension");

            let extension = entry.extension_mut();
            if let Err(cause) = ExtensionError::guard(config.catch_panics, || extension.destroy()) {
                tracing::warn!(
                    extension = %entry.id(),
                    error = %cause,
                    "extension failed to destroy"
                );
                failures.push(DestroyFailure {
                    extension_id: entry.id().clone(),
                    cause,
                });
            }
        }

        self.state = LifecycleState::Destroyed;
        tracing::info!(failures = failures.len(), "extensions destroyed");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::ShutdownFailure { failures })
        }
    }

    fn expect_state(
        &self,
        expected: LifecycleState,
        operation: &'static str,
    ) -> Result<(), LifecycleError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }
}
