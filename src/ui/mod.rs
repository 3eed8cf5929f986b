//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting, verbosity, and tree rendering
//!
//! # Design
//!
//! All user-facing output goes through this module so that `--quiet` is
//! honored in one place. Diagnostics for developers go through `tracing`
//! instead.

pub mod output;
