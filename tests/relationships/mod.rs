//! Multiplicity, relationship inference and association merging, observed
//! through the built model.

pub mod tests_associations;
pub mod tests_multiplicity;
