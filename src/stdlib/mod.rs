//! Standard library knowledge

pub mod builtins;

pub use builtins::{standard_functions, BuiltinFunc};
