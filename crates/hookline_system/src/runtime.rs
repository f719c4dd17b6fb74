//! The runtime context that owns extensions and runs the pipeline.
//!
//! A [`HookRuntime`] is constructed once at process start and threaded to
//! every call site that registers extensions, drives the lifecycle, or invokes
//! the pipeline. There is no global instance.
//!
//! # Phases
//!
//! The runtime moves through three phases that never overlap:
//!
//! 1. **Registration** - [`register`](HookRuntime::register) while
//!    `Uninitialized`
//! 2. **Serving** - [`invoke`](HookRuntime::invoke) while `Initialized`
//! 3. **Shutdown** - [`shutdown`](HookRuntime::shutdown) into `Destroyed`
//!
//! Registration and lifecycle transitions take the runtime's write lock, so
//! they are mutually exclusive with each other and with in-flight invocations.
//! Invocations share the read lock and run concurrently.
//!
//! # Example
//!
//! ```
//! use hookline_system::prelude::*;
//! use serde_json::json;
//!
//! let runtime = HookRuntime::new();
//! runtime
//!     .register(
//!         FnExtension::new("stamp", |_ty, state: ResourceState, _prior| {
//!             Ok(state.with("source", "hookline"))
//!         }),
//!         Binding::AllResources,
//!     )
//!     .unwrap();
//! runtime.startup().unwrap();
//!
//! let state = runtime
//!     .invoke("indicator", ResourceState::new(), None)
//!     .unwrap();
//! assert_eq!(state.get("source"), Some(&json!("hookline")));
//!
//! runtime.shutdown().unwrap();
//! ```

use core::fmt;

use hashbrown::HashSet;
use parking_lot::RwLock;

use crate::config::RuntimeConfig;
use crate::extension::{Extension, ExtensionId};
use crate::group::ExtensionGroup;
use crate::lifecycle::{Lifecycle, LifecycleError, LifecycleState};
use crate::pipeline::{self, Invocation, PipelineError};
use crate::registry::{Binding, ExtensionRegistry, RegistryError};
use crate::state::{ResourceEvent, ResourceState};

/// State guarded by the runtime lock.
#[derive(Default)]
struct Inner {
    registry: ExtensionRegistry,
    lifecycle: Lifecycle,
}

/// Registry, lifecycle, and invocation pipeline behind one context object.
///
/// `HookRuntime` is `Send + Sync`; share it across threads with an `Arc`.
#[derive(Default)]
pub struct HookRuntime {
    inner: RwLock<Inner>,
    config: RuntimeConfig,
}

impl fmt::Debug for HookRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("HookRuntime")
            .field("state", &inner.lifecycle.state())
            .field("extensions", &inner.registry.ids())
            .field("config", &self.config)
            .finish()
    }
}

impl HookRuntime {
    /// Creates an empty runtime with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates an empty runtime with the given configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            config,
        }
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers an extension under its [`name`](Extension::name).
    ///
    /// Registration order determines invocation order within a binding group.
    pub fn register(&self, extension: impl Extension, binding: Binding) -> Result<(), RegistryError> {
        let id = ExtensionId::new(extension.name());
        self.register_boxed(id, Box::new(extension), binding)
    }

    /// Registers an extension under an explicit id.
    pub fn register_as(
        &self,
        id: impl Into<ExtensionId>,
        extension: impl Extension,
        binding: Binding,
    ) -> Result<(), RegistryError> {
        self.register_boxed(id.into(), Box::new(extension), binding)
    }

    /// Registers a pre-boxed extension.
    ///
    /// This is the lower-level method used by [`register`](Self::register),
    /// [`register_as`](Self::register_as), and
    /// [`register_group`](Self::register_group).
    pub fn register_boxed(
        &self,
        id: ExtensionId,
        extension: Box<dyn Extension>,
        binding: Binding,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        if inner.lifecycle.state() != LifecycleState::Uninitialized {
            return Err(RegistryError::RegistrationClosed);
        }

        tracing::debug!(extension = %id, %binding, "registering extension");
        inner.registry.insert(id, extension, binding)
    }

    /// Registers every extension of a group, in group order.
    ///
    /// All or nothing: if any member is a duplicate, of an existing
    /// registration or of an earlier member, nothing is registered.
    pub fn register_group(&self, group: impl ExtensionGroup) -> Result<(), RegistryError> {
        let pending = group.build().extensions;

        let mut inner = self.inner.write();
        if inner.lifecycle.state() != LifecycleState::Uninitialized {
            return Err(RegistryError::RegistrationClosed);
        }

        let mut seen = HashSet::with_capacity(pending.len());
        for member in &pending {
            inner.registry.check(&member.id, &member.binding)?;
            if !seen.insert((&member.id, &member.binding)) {
                return Err(RegistryError::DuplicateRegistration {
                    id: member.id.clone(),
                    binding: member.binding.clone(),
                });
            }
        }
        drop(seen);

        tracing::debug!(extensions = pending.len(), "registering extension group");
        for member in pending {
            inner
                .registry
                .insert(member.id, member.extension, member.binding)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Initializes every registered extension and opens the pipeline.
    ///
    /// See [`Lifecycle::startup`].
    pub fn startup(&self) -> Result<(), LifecycleError> {
        let mut inner = self.inner.write();
        let Inner {
            registry,
            lifecycle,
        } = &mut *inner;
        lifecycle.startup(registry, &self.config)
    }

    /// Destroys every registered extension and closes the pipeline.
    ///
    /// See [`Lifecycle::shutdown`].
    pub fn shutdown(&self) -> Result<(), LifecycleError> {
        let mut inner = self.inner.write();
        let Inner {
            registry,
            lifecycle,
        } = &mut *inner;
        lifecycle.shutdown(registry, &self.config)
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.read().lifecycle.state()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invocation
    // ─────────────────────────────────────────────────────────────────────────

    /// Runs the chain for `resource_type` and returns the state to persist.
    ///
    /// Under [`FailurePolicy::Skip`](crate::config::FailurePolicy::Skip),
    /// skipped failures are logged; use
    /// [`invoke_with_report`](Self::invoke_with_report) to receive them.
    pub fn invoke(
        &self,
        resource_type: &str,
        new_state: ResourceState,
        prior_state: Option<&ResourceState>,
    ) -> Result<ResourceState, PipelineError> {
        self.invoke_with_report(resource_type, new_state, prior_state)
            .map(|invocation| invocation.state)
    }

    /// Runs the chain and returns the final state with any skipped failures.
    pub fn invoke_with_report(
        &self,
        resource_type: &str,
        new_state: ResourceState,
        prior_state: Option<&ResourceState>,
    ) -> Result<Invocation, PipelineError> {
        // Recursive read so an extension may invoke the runtime re-entrantly
        // even while a writer is queued.
        let inner = self.inner.read_recursive();
        let state = inner.lifecycle.state();
        if state != LifecycleState::Initialized {
            return Err(PipelineError::NotReady { state });
        }

        let span = tracing::debug_span!(
            "invoke",
            resource_type,
            chain = inner.registry.lookup(resource_type).count()
        );
        let _enter = span.enter();

        let invocation = pipeline::run_chain(
            inner.registry.lookup(resource_type),
            &self.config,
            resource_type,
            new_state,
            prior_state,
        )?;
        tracing::trace!(skipped = invocation.skipped.len(), "invocation complete");
        Ok(invocation)
    }

    /// Runs the chain for a [`ResourceEvent`].
    pub fn invoke_event(&self, event: ResourceEvent) -> Result<ResourceState, PipelineError> {
        let ResourceEvent {
            resource_type,
            new_state,
            prior_state,
        } = event;
        self.invoke(&resource_type, new_state, prior_state.as_ref())
    }

    /// Returns the ids of the chain `resource_type` resolves to, in order.
    #[must_use]
    pub fn chain(&self, resource_type: &str) -> Vec<ExtensionId> {
        self.inner
            .read()
            .registry
            .lookup(resource_type)
            .map(|entry| entry.id().clone())
            .collect()
    }

    /// Number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().registry.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().registry.is_empty()
    }
}
