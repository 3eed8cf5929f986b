//! engine
//!
//! The commit engine: Diff -> Plan -> Validate -> Apply.
//!
//! # Architecture
//!
//! 1. **Diff**: walk active and working in lock-step, producing ChangeOps
//! 2. **Plan**: order them (deletions deepest first, the rest shallowest
//!    first) and fingerprint the result
//! 3. **Validate**: ask the schema about every op before touching anything
//! 4. **Apply**: replay the plan on a copy of active
//!
//! # Invariants
//!
//! - The engine never mutates the trees it is given
//! - A commit either lands every op or none
//! - Plans are pure data and can be previewed without applying
//!
//! # Example
//!
//! ```
//! use cstore::core::node::NodeFlags;
//! use cstore::core::path::ConfigPath;
//! use cstore::core::schema::OpenSchema;
//! use cstore::core::tree::ConfigTree;
//! use cstore::engine::CommitEngine;
//!
//! let active = ConfigTree::new();
//! let mut working = ConfigTree::new();
//! let path = ConfigPath::parse("interfaces/eth0/address").unwrap();
//! working.set(&path, Some("10.0.0.1"), &|_: &ConfigPath| NodeFlags::default()).unwrap();
//!
//! let schema = OpenSchema;
//! let (next, report) = CommitEngine::new(&schema).run(&active, &working).unwrap();
//! assert_eq!(next, working);
//! assert_eq!(report.applied, 3);
//! ```

pub mod diff;
pub mod exec;
pub mod plan;

#[cfg(any(test, feature = "fault_injection"))]
pub mod engine_hooks;

pub use diff::diff;
pub use exec::{CommitEngine, CommitError, CommitReport, CommitState, Executor};
pub use plan::{CommitPlan, PlanId};
