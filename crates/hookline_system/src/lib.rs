//! The hook registry and invocation pipeline of hookline.
//!
//! `hookline_system` provides the primitives for running a set of pluggable
//! transformers over a resource mutation:
//!
//! - [`extension`] - The extension contract (initialize, transform, destroy)
//! - [`registry`] - Ordered storage keyed by resource-type binding
//! - [`lifecycle`] - Initialize-once / destroy-once state machine
//! - [`pipeline`] - Chained, failure-isolated state threading
//! - [`runtime`] - The context object tying the above together
//! - [`group`] - Ordered extension sets from discovery collaborators
//! - [`config`] - Failure policy and panic isolation settings
//! - [`state`] - Resource state snapshots and events
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
//!         FnExtension::new("a", |_ty, state: ResourceState, _prior| Ok(state.with("a", 1))),
//!         Binding::AllResources,
//!     )
//!     .unwrap();
//! runtime
//!     .register(
//!         FnExtension::new("b", |_ty, state: ResourceState, _prior| Ok(state.with("b", 2))),
//!         Binding::resource("indicator"),
//!     )
//!     .unwrap();
//! runtime.startup().unwrap();
//!
//! let state = runtime.invoke("indicator", ResourceState::new(), None).unwrap();
//! assert_eq!(state.into_value(), json!({ "a": 1, "b": 2 }));
//!
//! runtime.shutdown().unwrap();
//! ```

/// Runtime configuration.
pub mod config;

/// The extension contract.
pub mod extension;

/// Ordered extension groups.
pub mod group;

/// Extension lifecycle state machine.
pub mod lifecycle;

/// Chained invocation.
pub mod pipeline;

/// Extension storage and chain resolution.
pub mod registry;

/// The runtime context.
pub mod runtime;

/// Resource state and events.
pub mod state;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::{FailurePolicy, RuntimeConfig};
    pub use crate::extension::{Extension, ExtensionError, ExtensionId, FnExtension};
    pub use crate::group::{ExtensionGroup, ExtensionGroupBuilder};
    pub use crate::lifecycle::{DestroyFailure, LifecycleError, LifecycleState};
    pub use crate::pipeline::{Invocation, PipelineError, TransformFailure};
    pub use crate::registry::{Binding, RegistryError};
    pub use crate::runtime::HookRuntime;
    pub use crate::state::{Mutation, ResourceEvent, ResourceState};
}
