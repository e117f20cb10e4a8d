//! End-to-end pipeline behavior: determinism, identity stability, IR input,
//! configuration and written output.

pub mod tests_config;
pub mod tests_determinism;
pub mod tests_identity;
pub mod tests_ir;
pub mod tests_output;
