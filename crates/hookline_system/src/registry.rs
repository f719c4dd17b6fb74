//! Ordered storage of registered extensions.
//!
//! The [`ExtensionRegistry`] owns every extension instance for the lifetime of
//! the runtime. It only orders and stores what it is given: how an extension
//! was obtained (static list, discovery scan, test fixture) is the caller's
//! concern.
//!
//! # Chain Order
//!
//! [`lookup`](ExtensionRegistry::lookup) yields, in registration order, every
//! extension bound to [`Binding::AllResources`] followed by every extension
//! bound to the exact resource type. Cross-cutting extensions therefore always
//! run before resource-specific ones.

use core::fmt;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extension::{Extension, ExtensionId};

// ─────────────────────────────────────────────────────────────────────────────
// Binding
// ─────────────────────────────────────────────────────────────────────────────

/// The resource types an extension applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Runs for every resource type.
    AllResources,
    /// Runs only when the resource type matches exactly (case-sensitive).
    Resource(String),
}

impl Binding {
    /// Binds to a single resource type.
    #[must_use]
    pub fn resource(resource_type: impl Into<String>) -> Self {
        Self::Resource(resource_type.into())
    }

    /// Returns true if this binding applies to `resource_type`.
    #[must_use]
    pub fn matches(&self, resource_type: &str) -> bool {
        match self {
            Self::AllResources => true,
            Self::Resource(bound) => bound == resource_type,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllResources => f.write_str("*"),
            Self::Resource(resource_type) => write!(f, "resource:{resource_type}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RegistryError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during extension registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registration was attempted after startup.
    #[error("registration is closed: the runtime has already been started")]
    RegistrationClosed,

    /// An extension with this id is already registered for the binding.
    #[error("extension '{id}' already registered for binding '{binding}'")]
    DuplicateRegistration {
        /// The duplicate id.
        id: ExtensionId,
        /// The binding it was registered under.
        binding: Binding,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// RegisteredExtension
// ─────────────────────────────────────────────────────────────────────────────

/// An extension together with its registration key and binding.
pub struct RegisteredExtension {
    id: ExtensionId,
    binding: Binding,
    extension: Box<dyn Extension>,
}

impl RegisteredExtension {
    /// Returns the registration key.
    #[must_use]
    pub fn id(&self) -> &ExtensionId {
        &self.id
    }

    /// Returns the binding.
    #[must_use]
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Returns the extension instance.
    #[must_use]
    pub fn extension(&self) -> &dyn Extension {
        self.extension.as_ref()
    }

    pub(crate) fn extension_mut(&mut self) -> &mut dyn Extension {
        self.extension.as_mut()
    }
}

impl fmt::Debug for RegisteredExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredExtension")
            .field("id", &self.id)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExtensionRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Insertion-ordered collection of registered extensions.
///
/// The registry itself has no notion of lifecycle; the
/// [`HookRuntime`](crate::runtime::HookRuntime) closes it for registration
/// once started.
#[derive(Default)]
pub struct ExtensionRegistry {
    /// Extensions in registration order.
    entries: Vec<RegisteredExtension>,
    /// `(id, binding)` pairs already registered.
    keys: HashSet<(ExtensionId, Binding)>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Appends an extension under `id` and `binding`.
    pub fn insert(
        &mut self,
        id: ExtensionId,
        extension: Box<dyn Extension>,
        binding: Binding,
    ) -> Result<(), RegistryError> {
        self.check(&id, &binding)?;

        self.keys.insert((id.clone(), binding.clone()));
        self.entries.push(RegisteredExtension {
            id,
            binding,
            extension,
        });
        Ok(())
    }

    /// Fails if `id` is already registered under `binding`.
    pub fn check(&self, id: &ExtensionId, binding: &Binding) -> Result<(), RegistryError> {
        if self.keys.contains(&(id.clone(), binding.clone())) {
            return Err(RegistryError::DuplicateRegistration {
                id: id.clone(),
                binding: binding.clone(),
            });
        }
        Ok(())
    }

    /// Returns the chain for `resource_type`.
    ///
    /// All-resource extensions come first, then resource-specific ones, each
    /// group in registration order.
    pub fn lookup<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a RegisteredExtension> + 'a {
        let generic = self
            .entries
            .iter()
            .filter(|entry| entry.binding == Binding::AllResources);
        let specific = self.entries.iter().filter(move |entry| {
            matches!(&entry.binding, Binding::Resource(bound) if bound == resource_type)
        });
        generic.chain(specific)
    }

    /// Iterates over all entries in registration order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RegisteredExtension> {
        self.entries.iter()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [RegisteredExtension] {
        &mut self.entries
    }

    /// Returns registration keys in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<ExtensionId> {
        self.entries.iter().map(|entry| entry.id.clone()).collect()
    }

    /// Returns true if an extension with this id is registered under any binding.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == *id)
    }

    /// Number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::FnExtension;

    fn noop(name: &str) -> Box<dyn Extension> {
        Box::new(FnExtension::new(name, |_ty, state, _prior| Ok(state)))
    }

    fn chain_ids(registry: &ExtensionRegistry, resource_type: &str) -> Vec<String> {
        registry
            .lookup(resource_type)
            .map(|entry| entry.id().to_string())
            .collect()
    }

    #[test]
    fn binding_matches_exactly() {
        assert!(Binding::AllResources.matches("anything"));
        assert!(Binding::resource("actor").matches("actor"));
        assert!(!Binding::resource("actor").matches("Actor"));
        assert!(!Binding::resource("actor").matches("actors"));
    }

    #[test]
    fn lookup_puts_generic_before_specific() {
        let mut registry = ExtensionRegistry::new();
        registry
            .insert("s1".into(), noop("s1"), Binding::resource("actor"))
            .unwrap();
        registry
            .insert("g1".into(), noop("g1"), Binding::AllResources)
            .unwrap();
        registry
            .insert("s2".into(), noop("s2"), Binding::resource("actor"))
            .unwrap();
        registry
            .insert("g2".into(), noop("g2"), Binding::AllResources)
            .unwrap();

        assert_eq!(chain_ids(&registry, "actor"), ["g1", "g2", "s1", "s2"]);
    }

    #[test]
    fn lookup_filters_other_resource_types() {
        let mut registry = ExtensionRegistry::new();
        registry
            .insert("g".into(), noop("g"), Binding::AllResources)
            .unwrap();
        registry
            .insert("a".into(), noop("a"), Binding::resource("actor"))
            .unwrap();
        registry
            .insert("i".into(), noop("i"), Binding::resource("indicator"))
            .unwrap();

        assert_eq!(chain_ids(&registry, "indicator"), ["g", "i"]);
        assert_eq!(chain_ids(&registry, "sighting"), ["g"]);
    }

    #[test]
    fn lookup_on_empty_registry_is_empty() {
        let registry = ExtensionRegistry::new();
        assert_eq!(registry.lookup("actor").count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_duplicate_id_for_same_binding() {
        let mut registry = ExtensionRegistry::new();
        registry
            .insert("audit".into(), noop("audit"), Binding::AllResources)
            .unwrap();
        let err = registry
            .insert("audit".into(), noop("audit"), Binding::AllResources)
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateRegistration {
                id: "audit".into(),
                binding: Binding::AllResources,
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_id_under_different_bindings_is_allowed() {
        let mut registry = ExtensionRegistry::new();
        registry
            .insert("enrich".into(), noop("enrich"), Binding::resource("actor"))
            .unwrap();
        registry
            .insert("enrich".into(), noop("enrich"), Binding::resource("indicator"))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("enrich"));
        assert_eq!(registry.ids(), vec![ExtensionId::from("enrich"); 2]);
    }

    #[test]
    fn binding_display() {
        assert_eq!(Binding::AllResources.to_string(), "*");
        assert_eq!(Binding::resource("actor").to_string(), "resource:actor");
        assert_eq!(Binding::resource("*").to_string(), "resource:*");
    }

    #[test]
    fn duplicate_message_distinguishes_specific_star_binding() {
        let err = RegistryError::DuplicateRegistration {
            id: "audit".into(),
            binding: Binding::resource("*"),
        };
        assert_eq!(
            err.to_string(),
            "extension 'audit' already registered for binding 'resource:*'"
        );
    }

    #[test]
    fn check_reports_duplicates_without_inserting() {
        let mut registry = ExtensionRegistry::new();
        registry
            .insert("audit".into(), noop("audit"), Binding::AllResources)
            .unwrap();

        assert!(registry.check(&"audit".into(), &Binding::AllResources).is_err());
        assert!(registry.check(&"audit".into(), &Binding::resource("actor")).is_ok());
        assert_eq!(registry.len(), 1);
    }
}
