//! Core infrastructure for hookline.
//!
//! This crate provides the pieces most hosts need next to the runtime:
//!
//! - [`TracingConfig`] - Installs the `tracing` subscriber
//! - [`TracingExtension`] - Logs every mutation passing through a chain
//! - [`StampExtension`] - Writes a fixed field value
//! - [`DefaultExtensions`] - Convenient bundle of the built-in extensions
//!
//! # Example
//!
//! ```
//! use hookline_core::{DefaultExtensions, TracingConfig};
//! use hookline_system::prelude::*;
//! use tracing::Level;
//!
//! TracingConfig::default().with_level(Level::WARN).install();
//!
//! let runtime = HookRuntime::new();
//! runtime.register_group(DefaultExtensions).unwrap();
//! runtime.startup().unwrap();
//!
//! let state = ResourceState::new().with("title", "beacon");
//! let out = runtime.invoke("indicator", state.clone(), None).unwrap();
//! assert_eq!(out, state);
//! ```

mod stamp;
mod tracing_config;
mod tracing_extension;

pub use stamp::StampExtension;
pub use tracing_config::{TracingConfig, TracingFormat};
pub use tracing_extension::TracingExtension;

use hookline_system::group::{ExtensionGroup, ExtensionGroupBuilder};
use hookline_system::registry::Binding;

/// Default extensions for most hosts.
///
/// Includes:
/// - [`TracingExtension`] - bound to every resource type
///
/// # Customization
///
/// ```
/// use hookline_core::{DefaultExtensions, StampExtension, TracingExtension};
/// use hookline_system::prelude::*;
///
/// let group = DefaultExtensions
///     .build()
///     .add_after(
///         TracingExtension::NAME,
///         StampExtension::new("pipeline", "hookline"),
///         Binding::AllResources,
///     );
/// assert_eq!(group.ids(), ["hookline::tracing", "stamp:pipeline"]);
/// ```
pub struct DefaultExtensions;

impl ExtensionGroup for DefaultExtensions {
    fn build(self) -> ExtensionGroupBuilder {
        ExtensionGroupBuilder::new().add(TracingExtension::default(), Binding::AllResources)
    }
}
