//! core
//!
//! Core domain types for the configuration store.
//!
//! # Modules
//!
//! - [`path`] - Validated paths and raw argument lists
//! - [`node`] - Tree nodes and their flags
//! - [`tree`] - The configuration tree and its structural operations
//! - [`change`] - Change operations derived from two trees
//! - [`schema`] - The schema collaborator
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Store directory layout
//! - [`lock`] - Exclusive store lock
//!
//! # Design Principles
//!
//! - Paths are validated once, at the boundary
//! - Every tree mutator has a side-effect-free validator
//! - A failed operation leaves the tree unchanged

pub mod change;
pub mod config;
pub mod lock;
pub mod node;
pub mod path;
pub mod paths;
pub mod schema;
pub mod tree;
