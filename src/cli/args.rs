//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--store <dir>`: Use this store directory instead of the configured one
//! - `--config <file>`: Load configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! # Path Arguments
//!
//! Paths are given as separate words (`interfaces ethernet eth0`). Commands
//! that take two paths separate them with the word `to`; the last `to` on
//! the line is the separator, so a component may itself be named `to`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// cstore - staged hierarchical configuration store
#[derive(Parser, Debug)]
#[command(name = "cstore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store directory (overrides `store_dir` from the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Configuration file (overrides the standard search locations)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Editing ==========
    /// Create a path or set a value
    #[command(
        name = "set",
        long_about = "Create a path in the working configuration, or set a value on it.\n\n\
            Missing intermediate nodes are created. When the path names a leaf in \
            the configured schema, the last word is taken as its value. Setting a \
            value on a multi-valued leaf appends; on any other leaf it replaces. \
            The first edit opens an edit session.",
        after_help = "\
EXAMPLES:
    # Create a container path
    cstore set interfaces ethernet eth0

    # Set a leaf value (last word, when the schema marks the path a leaf)
    cstore set system host-name r1

    # Set a value explicitly
    cstore set interfaces ethernet eth0 description --value 'uplink to core'"
    )]
    Set {
        /// Path components
        #[arg(required = true, num_args = 1..)]
        path: Vec<String>,

        /// Value to set (instead of taking it from the last word)
        #[arg(long)]
        value: Option<String>,
    },

    /// Delete a path or a single value
    #[command(
        name = "delete",
        long_about = "Delete a subtree from the working configuration.\n\n\
            With a value (trailing word on a leaf, or --value), removes just that \
            value. Deleting a path that does not exist fails and changes nothing.",
        after_help = "\
EXAMPLES:
    # Remove a whole subtree
    cstore delete interfaces ethernet eth1

    # Remove one value of a multi-valued leaf
    cstore delete system name-server --value 10.0.0.53"
    )]
    Delete {
        /// Path components
        #[arg(required = true, num_args = 1..)]
        path: Vec<String>,

        /// Single value to remove
        #[arg(long)]
        value: Option<String>,
    },

    /// Re-activate a deactivated node
    #[command(name = "activate")]
    Activate {
        /// Path components
        #[arg(required = true, num_args = 1..)]
        path: Vec<String>,
    },

    /// Deactivate a node without deleting it
    #[command(
        name = "deactivate",
        long_about = "Mark a node deactivated.\n\n\
            A deactivated subtree stays in the configuration but is excluded from \
            the effective configuration (see `show --effective`)."
    )]
    Deactivate {
        /// Path components
        #[arg(required = true, num_args = 1..)]
        path: Vec<String>,
    },

    /// Rename the last component of a path
    #[command(
        name = "rename",
        after_help = "\
EXAMPLES:
    cstore rename service http to webserver"
    )]
    Rename {
        /// `PATH.. to NAME`
        #[arg(required = true, num_args = 3..)]
        words: Vec<String>,
    },

    /// Deep-copy a subtree
    #[command(
        name = "copy",
        long_about = "Deep-copy a subtree to a new path.\n\n\
            The destination must not exist and its parent must.",
        after_help = "\
EXAMPLES:
    cstore copy firewall rule 10 to firewall rule 20"
    )]
    Copy {
        /// `SRC.. to DST..`
        #[arg(required = true, num_args = 3..)]
        words: Vec<String>,
    },

    /// Move a subtree under a new parent
    #[command(
        name = "move",
        after_help = "\
EXAMPLES:
    cstore move interfaces ethernet eth0 vif 10 to interfaces ethernet eth1 vif"
    )]
    Move {
        /// `PATH.. to PARENT..`
        #[arg(required = true, num_args = 3..)]
        words: Vec<String>,
    },

    /// Attach or clear a comment
    #[command(
        name = "comment",
        long_about = "Attach a comment to a node, or clear it when --text is omitted."
    )]
    Comment {
        /// Path components
        #[arg(required = true, num_args = 1..)]
        path: Vec<String>,

        /// Comment text
        #[arg(long)]
        text: Option<String>,
    },

    // ========== Session ==========
    /// Drop all pending edits
    #[command(name = "discard")]
    Discard,

    /// Apply pending edits to the active configuration
    #[command(
        name = "commit",
        long_about = "Apply pending edits to the active configuration.\n\n\
            Changes are derived by comparing the working and active configurations, \
            validated, and applied all-or-nothing. On failure neither configuration \
            changes and the session stays open."
    )]
    Commit,

    /// Apply set or delete to every path in a file
    #[command(
        name = "batch",
        long_about = "Apply one operation to every path listed in a file.\n\n\
            One path per line, words separated by whitespace; single quotes group \
            words. Blank lines and lines starting with '#' are skipped. Failing \
            lines are reported and processing continues.",
        after_help = "\
EXAMPLES:
    cstore batch set changes.txt
    cstore batch delete old-rules.txt"
    )]
    Batch {
        /// Operation applied to every line
        #[arg(value_enum)]
        op: BatchAction,

        /// File with one path per line
        file: PathBuf,
    },

    // ========== Inspection ==========
    /// Show the configuration
    #[command(
        name = "show",
        after_help = "\
EXAMPLES:
    # Whole working configuration
    cstore show

    # One subtree of the active configuration
    cstore show interfaces --active

    # What is actually in force
    cstore show --active --effective --json"
    )]
    Show {
        /// Subtree to show
        path: Vec<String>,

        /// Show the active configuration instead of the working one
        #[arg(long)]
        active: bool,

        /// Omit deactivated subtrees
        #[arg(long)]
        effective: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the changes a commit would apply
    #[command(name = "compare")]
    Compare {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show session state
    #[command(name = "status")]
    Status,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    cstore completion bash > ~/.local/share/bash-completion/completions/cstore

    # Zsh
    cstore completion zsh > ~/.zfunc/_cstore"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Operation for `batch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchAction {
    Set,
    Delete,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Split `words` at the last `to`.
///
/// Returns `None` if there is no `to` with words on both sides.
pub fn split_at_to(words: &[String]) -> Option<(&[String], &[String])> {
    let at = words.iter().rposition(|w| w == "to")?;
    let (left, right) = (&words[..at], &words[at + 1..]);
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left, right))
}
