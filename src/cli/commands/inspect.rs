//! Read-only commands: `show`, `compare` and `status`.
//!
//! These still take the store lock so they never observe a half-saved
//! directory.

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::path::{ConfigPath, PathArgs};
use crate::core::tree::ConfigTree;
use crate::ui::output;

/// Print the working (or active) configuration.
pub fn show(ctx: &Context, words: &[String], active: bool, effective: bool, json: bool) -> Result<()> {
    let (_dir, store) = ctx.open_store()?;
    let path = if words.is_empty() {
        ConfigPath::root()
    } else {
        PathArgs::new(words)?.into_path()?
    };

    let source = if active {
        store.active()
    } else {
        store.working()
    };
    let pruned;
    let tree: &ConfigTree = if effective {
        pruned = source.effective();
        &pruned
    } else {
        source
    };

    let node = tree
        .node(&path)
        .with_context(|| format!("Path '{path}' does not exist"))?;

    if json {
        let rendered =
            serde_json::to_string_pretty(node).context("Failed to serialize configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    if node.has_children() || node.has_values() {
        print!("{}", output::render_subtree(node));
    } else if path.is_root() {
        output::print("Configuration is empty", ctx.verbosity);
    }
    Ok(())
}

/// List the changes a commit would apply, in application order.
pub fn compare(ctx: &Context, json: bool) -> Result<()> {
    let (_dir, store) = ctx.open_store()?;
    let plan = store.pending();

    if json {
        let rendered =
            serde_json::to_string_pretty(plan.ops()).context("Failed to serialize changes")?;
        println!("{rendered}");
        return Ok(());
    }

    if plan.is_empty() {
        output::print("No changes", ctx.verbosity);
        return Ok(());
    }
    print!("{plan}");
    output::debug(plan.digest(), ctx.verbosity);
    Ok(())
}

/// Describe the session.
pub fn status(ctx: &Context) -> Result<()> {
    let (_dir, store) = ctx.open_store()?;
    match store.session() {
        Some(session) => {
            println!(
                "Edit session {} open since {}",
                session.id,
                session.started_at.to_rfc3339()
            );
            println!("{} pending change(s)", store.pending().len());
        }
        None => println!("No edit session"),
    }
    output::debug(
        format!("store: {}", ctx.store_dir.display()),
        ctx.verbosity,
    );
    Ok(())
}
