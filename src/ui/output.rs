//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, output is machine-readable JSON.
//!
//! Trees render in a brace-delimited layout, one node per line:
//!
//! ```text
//! interfaces {
//!     ethernet eth0 {
//!         address 10.0.0.1
//!     }
//! }
//! ```
//!
//! Children of a tag node are printed on the tag node's line. Deactivated
//! nodes carry an `inactive:` prefix and comments precede their node as
//! `/* ... */`.

use std::fmt::{Display, Write as _};

use crate::core::node::ConfigNode;
use crate::core::path::quote;

const INDENT: &str = "    ";

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the children of `node` as text.
///
/// The node itself is not printed; pass the root to render a whole tree.
///
/// # Example
///
/// ```
/// use cstore::core::path::ConfigPath;
/// use cstore::core::node::NodeFlags;
/// use cstore::core::tree::ConfigTree;
/// use cstore::ui::output::render_tree;
///
/// let mut tree = ConfigTree::new();
/// let path = ConfigPath::parse("system/host-name").unwrap();
/// tree.set(&path, Some("r1"), &|_: &ConfigPath| NodeFlags::default()).unwrap();
/// assert_eq!(render_tree(tree.root()), "system {\n    host-name r1\n}\n");
/// ```
pub fn render_tree(node: &ConfigNode) -> String {
    let mut out = String::new();
    for child in node.children() {
        render_node(&mut out, child, None, false, 0);
    }
    out
}

/// Render `node` as the target of a `show`: its own values, one per line,
/// followed by its children.
pub fn render_subtree(node: &ConfigNode) -> String {
    let mut out = String::new();
    for value in node.values() {
        let _ = writeln!(out, "{}", quote(value));
    }
    out.push_str(&render_tree(node));
    out
}

fn render_node(out: &mut String, node: &ConfigNode, tag: Option<&str>, inactive: bool, depth: usize) {
    let pad = INDENT.repeat(depth);
    let name = quote(node.name().unwrap_or_default());
    let label = match tag {
        Some(tag) => format!("{tag} {name}"),
        None => name,
    };
    let inactive = inactive || node.is_deactivated();

    if let Some(text) = node.comment() {
        let _ = writeln!(out, "{pad}/* {text} */");
    }

    // Instances of a tag node share its line and depth.
    if node.is_tag_node() && !node.has_values() && node.has_children() {
        for child in node.children() {
            render_node(out, child, Some(&label), inactive, depth);
        }
        return;
    }

    let prefix = if inactive { "inactive: " } else { "" };
    if node.has_children() {
        let _ = writeln!(out, "{pad}{prefix}{label} {{");
        for value in node.values() {
            let _ = writeln!(out, "{pad}{INDENT}{}", quote(value));
        }
        for child in node.children() {
            render_node(out, child, None, false, depth + 1);
        }
        let _ = writeln!(out, "{pad}}}");
    } else if node.has_values() {
        for value in node.values() {
            let _ = writeln!(out, "{pad}{prefix}{label} {}", quote(value));
        }
    } else {
        let _ = writeln!(out, "{pad}{prefix}{label}");
    }
}
