//! Pass-through extension that logs every invocation it takes part in.
//!
//! Register it under [`Binding::AllResources`](hookline_system::registry::Binding)
//! first to see each mutation before any other extension touches it, or last
//! (under a specific binding) to see what is about to be persisted.

use hookline_system::extension::{Extension, ExtensionError};
use hookline_system::state::{Mutation, ResourceState};
use tracing::Level;

/// Logs each transform call without modifying the state.
#[derive(Debug, Clone)]
pub struct TracingExtension {
    level: Level,
    log_fields: bool,
}

impl Default for TracingExtension {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            log_fields: false,
        }
    }
}

impl TracingExtension {
    /// Registration name used by [`Extension::name`].
    pub const NAME: &'static str = "hookline::tracing";

    /// Creates a `TracingExtension` logging at debug level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level mutations are logged at.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Includes the full new state in each log record.
    #[must_use]
    pub fn with_fields(mut self, enabled: bool) -> Self {
        self.log_fields = enabled;
        self
    }

    fn record(&self, resource_type: &str, mutation: Mutation, state: &ResourceState) {
        let fields = state.len();
        // `tracing` levels must be static at each callsite.
        macro_rules! emit {
            ($lvl:expr) => {
                if self.log_fields {
                    tracing::event!($lvl, resource_type, %mutation, fields, state = %state, "resource mutation");
                } else {
                    tracing::event!($lvl, resource_type, %mutation, fields, "resource mutation");
                }
            };
        }
        match self.level {
            Level::ERROR => emit!(Level::ERROR),
            Level::WARN => emit!(Level::WARN),
            Level::INFO => emit!(Level::INFO),
            Level::DEBUG => emit!(Level::DEBUG),
            _ => emit!(Level::TRACE),
        }
    }
}

impl Extension for TracingExtension {
    fn initialize(&mut self) -> Result<(), ExtensionError> {
        tracing::info!(level = %self.level, "TracingExtension initialized");
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), ExtensionError> {
        tracing::info!("TracingExtension shutting down");
        Ok(())
    }

    fn transform(
        &self,
        resource_type: &str,
        new_state: ResourceState,
        prior_state: Option<&ResourceState>,
    ) -> Result<ResourceState, ExtensionError> {
        self.record(resource_type, Mutation::from_prior(prior_state), &new_state);
        Ok(new_state)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_level_is_debug() {
        let ext = TracingExtension::default();
        assert_eq!(ext.level, Level::DEBUG);
        assert!(!ext.log_fields);
    }

    #[test]
    fn builder_sets_fields() {
        let ext = TracingExtension::new()
            .with_level(Level::INFO)
            .with_fields(true);
        assert_eq!(ext.level, Level::INFO);
        assert!(ext.log_fields);
    }

    #[test]
    fn transform_passes_state_through() {
        let ext = TracingExtension::new().with_level(Level::TRACE).with_fields(true);
        let state = ResourceState::new().with("title", "c2 beacon");
        let prior = ResourceState::new().with("title", "beacon");

        let out = ext.transform("indicator", state.clone(), Some(&prior)).unwrap();

        assert_eq!(out, state);
        assert_eq!(prior.get("title"), Some(&json!("beacon")));
    }

    #[test]
    fn lifecycle_hooks_succeed() {
        let mut ext = TracingExtension::new();
        assert!(ext.initialize().is_ok());
        assert!(ext.destroy().is_ok());
        assert_eq!(ext.name(), "hookline::tracing");
    }
}
