//! Resource state and mutation events.
//!
//! A [`ResourceState`] is an owned mapping from field name to JSON value. The
//! pipeline moves the candidate state through each extension by value and
//! hands out the prior state only by shared reference, so an extension can
//! never alias or mutate the state a mutation started from.
//!
//! # Example
//!
//! ```
//! use hookline_system::state::{Mutation, ResourceEvent, ResourceState};
//! use serde_json::json;
//!
//! let prior = ResourceState::from_value(json!({ "title": "old" })).unwrap();
//! let event = ResourceEvent::new("indicator", ResourceState::new()).with_prior(prior);
//!
//! assert_eq!(event.mutation(), Mutation::Update);
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// ResourceState
// ─────────────────────────────────────────────────────────────────────────────

/// Owned snapshot of a resource's fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceState {
    fields: Map<String, Value>,
}

impl ResourceState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Builds a state from a JSON value.
    ///
    /// Returns `None` unless the value is a JSON object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets a field, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes a field, returning its value if it was present.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the state has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Borrows the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the state, returning it as a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for ResourceState {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<ResourceState> for Value {
    fn from(state: ResourceState) -> Self {
        state.into_value()
    }
}

impl FromIterator<(String, Value)> for ResourceState {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.fields) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("{..}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of mutation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// No prior state exists.
    Create,
    /// The resource existed before the mutation.
    Update,
}

impl Mutation {
    /// Classifies a mutation by whether a prior state exists.
    #[must_use]
    pub fn from_prior(prior_state: Option<&ResourceState>) -> Self {
        match prior_state {
            Some(_) => Self::Update,
            None => Self::Create,
        }
    }

    /// Returns the lowercase name of this mutation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resource mutation passed through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEvent {
    /// Kind of resource, e.g. `"indicator"` or `"actor"`.
    pub resource_type: String,
    /// Candidate state being created or updated.
    pub new_state: ResourceState,
    /// State before the mutation, absent for a create.
    #[serde(default)]
    pub prior_state: Option<ResourceState>,
}

impl ResourceEvent {
    /// Creates an event with no prior state.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, new_state: ResourceState) -> Self {
        Self {
            resource_type: resource_type.into(),
            new_state,
            prior_state: None,
        }
    }

    /// Sets the prior state.
    #[must_use]
    pub fn with_prior(mut self, prior_state: ResourceState) -> Self {
        self.prior_state = Some(prior_state);
        self
    }

    /// Returns whether this event creates or updates a resource.
    #[must_use]
    pub fn mutation(&self) -> Mutation {
        Mutation::from_prior(self.prior_state.as_ref())
    }
}
