//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Turns raw words into paths
//! 2. Opens the store directory through [`Context::open_store`]
//! 3. Runs one [`crate::store::Store`] operation
//! 4. Saves and reports the outcome
//!
//! A failed edit leaves the store untouched, so nothing is saved on the
//! error path.

mod batch;
mod completion;
mod edit;
mod inspect;
mod session;

pub use batch::batch;
pub use completion::completion;
pub use edit::{activate, comment, copy, deactivate, delete, move_node, rename, set};
pub use inspect::{compare, show, status};
pub use session::{commit, discard};

use anyhow::Result;

use crate::cli::args::Command;
use crate::cli::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        // Editing
        Command::Set { path, value } => set(ctx, &path, value.as_deref()),
        Command::Delete { path, value } => delete(ctx, &path, value.as_deref()),
        Command::Activate { path } => activate(ctx, &path),
        Command::Deactivate { path } => deactivate(ctx, &path),
        Command::Rename { words } => rename(ctx, &words),
        Command::Copy { words } => copy(ctx, &words),
        Command::Move { words } => move_node(ctx, &words),
        Command::Comment { path, text } => comment(ctx, &path, text.as_deref()),

        // Session
        Command::Discard => discard(ctx),
        Command::Commit => commit(ctx),
        Command::Batch { op, file } => batch(ctx, op, &file),

        // Inspection
        Command::Show {
            path,
            active,
            effective,
            json,
        } => show(ctx, &path, active, effective, json),
        Command::Compare { json } => compare(ctx, json),
        Command::Status => status(ctx),
        Command::Completion { shell } => completion(shell),
    }
}
