//! Ordered groups of extensions handed over by a discovery collaborator.
//!
//! Discovery (static configuration, a scan of loadable modules, a test
//! fixture) happens outside the runtime. Whatever performs it packages the
//! instances it found into an [`ExtensionGroupBuilder`], which the host can
//! customize before registering it in one call.
//!
//! # Example
//!
//! ```
//! use hookline_system::extension::FnExtension;
//! use hookline_system::group::{ExtensionGroup, ExtensionGroupBuilder};
//! use hookline_system::registry::Binding;
//! use hookline_system::runtime::HookRuntime;
//!
//! struct Defaults;
//!
//! impl ExtensionGroup for Defaults {
//!     fn build(self) -> ExtensionGroupBuilder {
//!         ExtensionGroupBuilder::new()
//!             .add(FnExtension::new("audit", |_, s, _| Ok(s)), Binding::AllResources)
//!             .add(FnExtension::new("enrich", |_, s, _| Ok(s)), Binding::resource("actor"))
//!     }
//! }
//!
//! let runtime = HookRuntime::new();
//! runtime
//!     .register_group(Defaults.build().disable("enrich"))
//!     .unwrap();
//! assert_eq!(runtime.len(), 1);
//! ```

use crate::extension::{Extension, ExtensionId};
use crate::registry::Binding;

/// A set of extensions that can be registered together.
pub trait ExtensionGroup {
    /// Returns the extensions in this group.
    fn build(self) -> ExtensionGroupBuilder;
}

/// An extension waiting to be registered.
pub(crate) struct PendingExtension {
    pub(crate) id: ExtensionId,
    pub(crate) binding: Binding,
    pub(crate) extension: Box<dyn Extension>,
}

/// Builder for customizing extension groups.
///
/// Allows adding, removing, and reordering extensions before registration.
/// Positions are looked up by [`ExtensionId`].
#[derive(Default)]
pub struct ExtensionGroupBuilder {
    /// The extensions in this group, in order.
    pub(crate) extensions: Vec<PendingExtension>,
}

impl ExtensionGroupBuilder {
    /// Creates a new empty group builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Adds an extension to the end of the group, keyed by its name.
    #[must_use]
    pub fn add(self, extension: impl Extension, binding: Binding) -> Self {
        let id = ExtensionId::new(extension.name());
        self.add_as(id, extension, binding)
    }

    /// Adds an extension to the end of the group under an explicit id.
    #[must_use]
    pub fn add_as(
        mut self,
        id: impl Into<ExtensionId>,
        extension: impl Extension,
        binding: Binding,
    ) -> Self {
        self.extensions.push(PendingExtension {
            id: id.into(),
            binding,
            extension: Box::new(extension),
        });
        self
    }

    /// Adds an extension before the first extension with id `target`.
    ///
    /// If `target` is not found, the extension is added at the beginning.
    #[must_use]
    pub fn add_before(mut self, target: &str, extension: impl Extension, binding: Binding) -> Self {
        let position = self.position(target).unwrap_or(0);
        self.extensions
            .insert(position, Self::pending(extension, binding));
        self
    }

    /// Adds an extension after the first extension with id `target`.
    ///
    /// If `target` is not found, the extension is added at the end.
    #[must_use]
    pub fn add_after(mut self, target: &str, extension: impl Extension, binding: Binding) -> Self {
        let position = self
            .position(target)
            .map_or(self.extensions.len(), |i| i + 1);
        self.extensions
            .insert(position, Self::pending(extension, binding));
        self
    }

    /// Removes every extension with id `target`. No-op if absent.
    #[must_use]
    pub fn disable(mut self, target: &str) -> Self {
        self.extensions.retain(|pending| pending.id != *target);
        self
    }

    /// Returns the ids in group order.
    #[must_use]
    pub fn ids(&self) -> Vec<ExtensionId> {
        self.extensions
            .iter()
            .map(|pending| pending.id.clone())
            .collect()
    }

    /// Returns the number of extensions in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Returns true if the group contains no extensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    fn position(&self, target: &str) -> Option<usize> {
        self.extensions
            .iter()
            .position(|pending| pending.id == *target)
    }

    fn pending(extension: impl Extension, binding: Binding) -> PendingExtension {
        PendingExtension {
            id: ExtensionId::new(extension.name()),
            binding,
            extension: Box::new(extension),
        }
    }
}

impl ExtensionGroup for ExtensionGroupBuilder {
    fn build(self) -> ExtensionGroupBuilder {
        self
    }
}
