//! An extension-point runtime for resource-processing pipelines.
//!

pub use hookline_core;
pub use hookline_system;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use hookline_core::{
        DefaultExtensions, StampExtension, TracingConfig, TracingExtension, TracingFormat,
    };
    pub use hookline_system::prelude::*;
}
