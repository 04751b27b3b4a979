//! API Module
//!
//! Entry points shared by the CLI and any embedding front end.
//! - `commands.rs`: scan, presets, history, fit-encoders, evaluate, schema

pub mod commands;

pub use commands::*;
