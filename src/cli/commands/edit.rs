//! Editing commands
//!
//! `set`, `delete`, `activate`, `deactivate`, `rename`, `copy`, `move` and
//! `comment`. Each runs one working-tree edit under the store lock. The
//! first successful edit opens a session.

use anyhow::{anyhow, bail, Context as _, Result};

use crate::cli::args::split_at_to;
use crate::cli::Context;
use crate::core::path::{validate_component, ConfigPath, PathArgs};
use crate::store::{Store, StoreError};
use crate::ui::output;

/// Run `op` against the store and save on success.
fn edit<F>(ctx: &Context, failure: String, op: F) -> Result<()>
where
    F: FnOnce(&mut Store) -> Result<(), StoreError>,
{
    let (dir, mut store) = ctx.open_store()?;
    op(&mut store).context(failure)?;
    dir.save(&store)
        .map_err(StoreError::from)
        .context("Failed to save store")?;
    Ok(())
}

fn parse_path(words: &[String]) -> Result<ConfigPath> {
    Ok(PathArgs::new(words)?.into_path()?)
}

/// Split `PATH.. to PATH..` words.
fn two_paths(words: &[String], usage: &str) -> Result<(ConfigPath, ConfigPath)> {
    let (left, right) = split_at_to(words).ok_or_else(|| anyhow!("expected {usage}"))?;
    Ok((parse_path(left)?, parse_path(right)?))
}

/// Create a path or set a value.
pub fn set(ctx: &Context, words: &[String], value: Option<&str>) -> Result<()> {
    let args = PathArgs::new(words)?;
    let shown = args.to_string();
    edit(ctx, format!("Set '{shown}' failed"), |store| match value {
        Some(value) => store.set_path(&args.into_path()?, Some(value)),
        None => store.set(args),
    })?;
    output::debug(format!("set {shown}"), ctx.verbosity);
    Ok(())
}

/// Delete a subtree or a single value.
pub fn delete(ctx: &Context, words: &[String], value: Option<&str>) -> Result<()> {
    let args = PathArgs::new(words)?;
    let shown = args.to_string();
    edit(ctx, format!("Delete '{shown}' failed"), |store| match value {
        Some(value) => store.delete_path(&args.into_path()?, Some(value)),
        None => store.delete(args),
    })?;
    output::debug(format!("deleted {shown}"), ctx.verbosity);
    Ok(())
}

/// Clear the deactivated mark.
pub fn activate(ctx: &Context, words: &[String]) -> Result<()> {
    let path = parse_path(words)?;
    edit(ctx, format!("Activate '{path}' failed"), |store| {
        store.activate(&path)
    })
}

/// Set the deactivated mark.
pub fn deactivate(ctx: &Context, words: &[String]) -> Result<()> {
    let path = parse_path(words)?;
    edit(ctx, format!("Deactivate '{path}' failed"), |store| {
        store.deactivate(&path)
    })
}

/// `rename PATH.. to NAME`
pub fn rename(ctx: &Context, words: &[String]) -> Result<()> {
    let (left, right) =
        split_at_to(words).ok_or_else(|| anyhow!("expected PATH.. to NAME"))?;
    let [new_name] = right else {
        bail!("expected a single new name after 'to'");
    };
    validate_component(new_name)?;
    let path = parse_path(left)?;
    edit(ctx, format!("Rename '{path}' failed"), |store| {
        store.rename(&path, new_name)
    })
}

/// `copy SRC.. to DST..`
pub fn copy(ctx: &Context, words: &[String]) -> Result<()> {
    let (src, dst) = two_paths(words, "SRC.. to DST..")?;
    edit(ctx, format!("Copy '{src}' to '{dst}' failed"), |store| {
        store.copy(&src, &dst)
    })
}

/// `move PATH.. to PARENT..`
pub fn move_node(ctx: &Context, words: &[String]) -> Result<()> {
    let (path, parent) = two_paths(words, "PATH.. to PARENT..")?;
    edit(ctx, format!("Move '{path}' to '{parent}' failed"), |store| {
        store.move_to(&path, &parent)
    })
}

/// Attach or clear a comment.
pub fn comment(ctx: &Context, words: &[String], text: Option<&str>) -> Result<()> {
    let path = parse_path(words)?;
    edit(ctx, format!("Comment '{path}' failed"), |store| {
        store.comment(&path, text)
    })
}
