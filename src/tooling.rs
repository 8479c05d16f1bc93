//! Tooling: command-line surface.

pub mod cli;
