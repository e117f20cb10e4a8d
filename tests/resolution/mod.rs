//! Name resolution against a whole project.

pub mod tests_precedence;
