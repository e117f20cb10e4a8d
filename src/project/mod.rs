//! Project: configuration, model building and the end-to-end pipeline.
//!
//! ```text
//! PipelineConfig ─► Pipeline::run ─► ModelBuilder::build ─► IdentityAssigner ─► canonicalize ─► XMI
//!                   Pipeline::run_ir ─┘ (IR → units + carried relations)
//! ```

pub mod builder;
pub mod config;
pub mod pipeline;

pub use builder::{EXTERNAL_PACKAGE, ModelBuilder, PRIMITIVES_PACKAGE};
pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{Pipeline, PipelineOutput};
