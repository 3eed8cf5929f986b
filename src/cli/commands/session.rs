//! Session commands: `discard` and `commit`.

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::store::StoreError;
use crate::ui::output::{self, Verbosity};

/// Drop pending edits and close the session.
pub fn discard(ctx: &Context) -> Result<()> {
    let (dir, mut store) = ctx.open_store()?;
    store.discard().context("Discard failed")?;
    dir.save(&store)
        .map_err(StoreError::from)
        .context("Failed to save store")?;
    output::print("Changes discarded", ctx.verbosity);
    Ok(())
}

/// Apply pending edits to the active configuration.
///
/// On failure nothing is saved: both trees and the session stay as they
/// were on disk.
pub fn commit(ctx: &Context) -> Result<()> {
    let (dir, mut store) = ctx.open_store()?;
    let report = store.commit().context("Commit failed")?;
    dir.save(&store)
        .map_err(StoreError::from)
        .context("Failed to save store")?;

    if report.applied == 0 {
        output::print("No changes to commit", ctx.verbosity);
        return Ok(());
    }
    output::print(
        format!("Committed {} change(s)", report.applied),
        ctx.verbosity,
    );
    if ctx.verbosity == Verbosity::Debug {
        output::debug(&report.digest, ctx.verbosity);
        output::debug(output::format_list(&report.changes, "  "), ctx.verbosity);
    }
    Ok(())
}
