//! The extension contract.
//!
//! Extensions are the unit of composition in hookline. Every hook that runs
//! at a resource mutation implements [`Extension`], whether it is a stateless
//! enrichment step or a stateful one holding connections opened in
//! [`initialize`](Extension::initialize).
//!
//! # Lifecycle
//!
//! Extensions follow a strict lifecycle managed by the
//! [`HookRuntime`](crate::runtime::HookRuntime):
//!
//! 1. **Initialize** - `initialize()` is called once, in registration order
//! 2. **Transform** - `transform()` is called for every matching invocation
//! 3. **Destroy** - `destroy()` is called once, in reverse registration order
//!
//! # Example
//!
//! ```
//! use hookline_system::extension::{Extension, ExtensionError};
//! use hookline_system::state::ResourceState;
//!
//! struct Source {
//!     name: String,
//! }
//!
//! impl Extension for Source {
//!     fn initialize(&mut self) -> Result<(), ExtensionError> {
//!         self.name.push_str(" - initialized");
//!         Ok(())
//!     }
//!
//!     fn transform(
//!         &self,
//!         _resource_type: &str,
//!         mut new_state: ResourceState,
//!         _prior_state: Option<&ResourceState>,
//!     ) -> Result<ResourceState, ExtensionError> {
//!         new_state.insert("source", self.name.as_str());
//!         Ok(new_state)
//!     }
//! }
//! ```

use core::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;

use crate::state::ResourceState;

// ─────────────────────────────────────────────────────────────────────────────
// ExtensionId
// ─────────────────────────────────────────────────────────────────────────────

/// Registration key of an extension.
///
/// Defaults to [`Extension::name`] and can be overridden with
/// [`HookRuntime::register_as`](crate::runtime::HookRuntime::register_as).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId(String);

impl ExtensionId {
    /// Creates an id from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ExtensionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for ExtensionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ExtensionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExtensionError
// ─────────────────────────────────────────────────────────────────────────────

/// Failure raised by an extension from any of its contract operations.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Free-form failure description.
    #[error("{0}")]
    Message(String),

    /// JSON conversion failed inside the extension.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The extension panicked and the panic was contained.
    #[error("extension panicked: {0}")]
    Panicked(String),

    /// Any other error type.
    #[error(transparent)]
    Other(Box<dyn core::error::Error + Send + Sync>),
}

impl ExtensionError {
    /// Creates a [`Message`](Self::Message).
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Wraps an arbitrary error as [`Other`](Self::Other).
    pub fn other(err: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(err))
    }

    /// Builds a [`Panicked`](Self::Panicked) from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn core::any::Any + Send)) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(msg)
    }

    /// Runs `call`, turning a panic into [`ExtensionError::Panicked`] when
    /// `catch_panics` is set.
    pub(crate) fn guard<T>(
        catch_panics: bool,
        call: impl FnOnce() -> Result<T, Self>,
    ) -> Result<T, Self> {
        if !catch_panics {
            return call();
        }
        catch_unwind(AssertUnwindSafe(call))
            .unwrap_or_else(|payload| Err(Self::from_panic(payload.as_ref())))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extension Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A pluggable transformer invoked at resource mutations.
///
/// `initialize` and `destroy` take `&mut self`: the runtime calls them with
/// exclusive access, never concurrently with each other or with `transform`.
/// `transform` takes `&self` and may be called concurrently from overlapping
/// invocations, so extensions with mutable state must synchronize internally.
pub trait Extension: Send + Sync + 'static {
    /// Acquires resources. Called exactly once before any invocation.
    fn initialize(&mut self) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Releases resources acquired in [`initialize`](Self::initialize).
    ///
    /// Called exactly once after invocations have ceased, or as a rollback
    /// when a later extension fails to initialize.
    fn destroy(&mut self) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Returns the state to hand to the next extension in the chain.
    ///
    /// `prior_state` is `None` when the resource is being created.
    fn transform(
        &self,
        resource_type: &str,
        new_state: ResourceState,
        prior_state: Option<&ResourceState>,
    ) -> Result<ResourceState, ExtensionError>;

    /// Returns the extension's name, used as its default registration key.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FnExtension
// ─────────────────────────────────────────────────────────────────────────────

/// Stateless extension backed by a closure.
///
/// # Example
///
/// ```
/// use hookline_system::extension::FnExtension;
///
/// let tagger = FnExtension::new("tagger", |_ty, mut state, _prior| {
///     state.insert("tagged", true);
///     Ok(state)
/// });
/// ```
pub struct FnExtension<F> {
    name: String,
    transform: F,
}

impl<F> FnExtension<F>
where
    F: Fn(&str, ResourceState, Option<&ResourceState>) -> Result<ResourceState, ExtensionError>
        + Send
        + Sync
        + 'static,
{
    /// Wraps `transform` under the given name.
    pub fn new(name: impl Into<String>, transform: F) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }
}

impl<F> Extension for FnExtension<F>
where
    F: Fn(&str, ResourceState, Option<&ResourceState>) -> Result<ResourceState, ExtensionError>
        + Send
        + Sync
        + 'static,
{
    fn transform(
        &self,
        resource_type: &str,
        new_state: ResourceState,
        prior_state: Option<&ResourceState>,
    ) -> Result<ResourceState, ExtensionError> {
        (self.transform)(resource_type, new_state, prior_state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
