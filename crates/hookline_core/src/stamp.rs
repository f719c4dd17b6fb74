//! Extension that writes a fixed value into every state it sees.
//!
//! Stamps are the simplest useful extension: mark which pipeline a resource
//! went through, attach a source label, or set a default on create.
//!
//! # Example
//!
//! ```
//! use hookline_core::StampExtension;
//! use hookline_system::prelude::*;
//!
//! let runtime = HookRuntime::new();
//! runtime
//!     .register(
//!         StampExtension::new("source", "feed-ingest").on_create_only(),
//!         Binding::resource("indicator"),
//!     )
//!     .unwrap();
//! runtime.startup().unwrap();
//!
//! let created = runtime.invoke("indicator", ResourceState::new(), None).unwrap();
//! assert_eq!(created.get("source").and_then(|v| v.as_str()), Some("feed-ingest"));
//!
//! let prior = created.clone();
//! let updated = runtime.invoke("indicator", ResourceState::new(), Some(&prior)).unwrap();
//! assert!(!updated.contains("source"));
//! ```

use hookline_system::extension::{Extension, ExtensionError};
use hookline_system::state::{Mutation, ResourceState};
use serde_json::Value;

/// Sets `field` to a fixed value.
#[derive(Debug, Clone)]
pub struct StampExtension {
    name: String,
    field: String,
    value: Value,
    create_only: bool,
    overwrite: bool,
}

impl StampExtension {
    /// Creates a stamp named `stamp:<field>`.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        Self {
            name: format!("stamp:{field}"),
            field,
            value: value.into(),
            create_only: false,
            overwrite: true,
        }
    }

    /// Overrides the registration name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stamps only when there is no prior state.
    #[must_use]
    pub fn on_create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    /// Leaves the field alone if the incoming state already sets it.
    #[must_use]
    pub fn keep_existing(mut self) -> Self {
        self.overwrite = false;
        self
    }

    /// The field this stamp writes.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Extension for StampExtension {
    fn transform(
        &self,
        _resource_type: &str,
        mut new_state: ResourceState,
        prior_state: Option<&ResourceState>,
    ) -> Result<ResourceState, ExtensionError> {
        if self.create_only && Mutation::from_prior(prior_state) == Mutation::Update {
            return Ok(new_state);
        }
        if self.overwrite || !new_state.contains(&self.field) {
            new_state.insert(self.field.clone(), self.value.clone());
        }
        Ok(new_state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
