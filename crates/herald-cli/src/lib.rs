//! CLI argument model and validation for the herald binary.
//!
//! Every flag falls back to the CI action input environment (`INPUT_*`) so the
//! same binary works as a workflow step and from a shell.

pub mod cli_args;
pub mod validation;

pub use cli_args::Cli;
pub use validation::*;
