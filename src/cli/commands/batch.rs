//! batch command - apply set or delete to every path in a file
//!
//! Lines that apply are saved even when others fail. Each failure is
//! reported on stdout as `<Op> '<path>' failed`, and the command exits
//! non-zero with `Error in <op>` if any line failed.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::args::BatchAction;
use crate::cli::Context;
use crate::store::batch::{run_batch, BatchOp};
use crate::store::StoreError;
use crate::ui::output;

/// Run a batch file.
pub fn batch(ctx: &Context, action: BatchAction, file: &Path) -> Result<()> {
    let input = fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file {}", file.display()))?;
    let op = match action {
        BatchAction::Set => BatchOp::Set,
        BatchAction::Delete => BatchOp::Delete,
    };

    let (dir, mut store) = ctx.open_store()?;
    let report = run_batch(&mut store, op, &input, ctx.config.batch_stop_on_error());
    if report.applied > 0 {
        dir.save(&store)
            .map_err(StoreError::from)
            .context("Failed to save store")?;
    }

    for failure in &report.failures {
        output::print(format!("{op} '{}' failed", failure.path), ctx.verbosity);
        output::debug(
            format!("line {}: {}", failure.line_no, failure.error),
            ctx.verbosity,
        );
    }
    output::print(
        format!("Applied {} line(s)", report.applied),
        ctx.verbosity,
    );

    if report.has_failures() {
        bail!("Error in {}", op.to_string().to_lowercase());
    }
    Ok(())
}
