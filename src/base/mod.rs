//! Foundation types for the j2x pipeline.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Location`] - Human-readable source positions for diagnostics
//! - Qualified-name helpers ([`simple_name`], [`package_of`], [`join_qualified`])
//! - Identifier classification ([`is_identifier`])
//!
//! This module has NO dependencies on other j2x modules.

mod names;
mod position;

pub use names::{
    is_identifier, is_identifier_continue, is_identifier_start, join_qualified,
    normalize_binary_name, package_of, simple_name,
};
pub use position::Location;
