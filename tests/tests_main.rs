#[path = "helpers/mod.rs"]
mod helpers;

#[path = "resolution/mod.rs"]
mod resolution;

#[path = "relationships/mod.rs"]
mod relationships;

#[path = "pipeline/mod.rs"]
mod pipeline;
