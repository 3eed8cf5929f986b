//! cstore - staged hierarchical configuration store
//!
//! A configuration is a tree of named nodes. Edits go to a *working* tree
//! inside an edit session; `commit` derives the ordered changes between
//! the working tree and the *active* tree, validates them, and applies
//! them all-or-nothing.
//!
//! # Architecture
//!
//! The codebase is layered:
//!
//! - [`core`] - Paths, nodes, trees, schema, configuration, on-disk locations
//! - [`engine`] - Diff, commit planning, validated copy-on-write apply
//! - [`store`] - Active/working trees and the session; persistence; batch
//! - [`binding`] - Stable handle API with typed status codes
//! - [`cli`] - Command-line interface (parses args, delegates to the store)
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! 1. A failed edit leaves the working tree exactly as it was
//! 2. A failed commit leaves both trees exactly as they were
//! 3. Only commit changes the active tree
//! 4. Parents are created before children and deleted after them

pub mod binding;
pub mod cli;
pub mod core;
pub mod engine;
pub mod store;
pub mod ui;
