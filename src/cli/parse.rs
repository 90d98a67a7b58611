//! CLI parse: clap types for treesync. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// treesync CLI - replication tooling for versioned content trees
#[derive(Parser, Debug)]
#[command(name = "treesync")]
#[command(about = "Path translation, fingerprints, snapshot diffs and reference rewriting for content replication")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate paths between the source and target namespace
    Translate {
        /// Paths to translate
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        mapping: MappingArgs,

        /// Translate from the target namespace back to the source
        #[arg(long)]
        inverse: bool,

        /// Staging prefix prepended to (or stripped from) target paths
        #[arg(long)]
        staging: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Collect a snapshot of version-tracked nodes from a content dump
    Snapshot {
        /// Content dump (JSON)
        #[arg(long)]
        content: PathBuf,

        /// Search roots (default: the dump root)
        #[arg(long = "root")]
        roots: Vec<String>,

        /// Record paths relative to this prefix
        #[arg(long)]
        relative_to: Option<String>,

        /// Do not descend below tracked nodes
        #[arg(long)]
        stop_at_versioned: bool,

        /// Write the snapshot to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare a foreign snapshot with the local state
    Diff {
        /// Foreign snapshot (JSON)
        #[arg(long)]
        foreign: PathBuf,

        /// Prefix stripped from foreign paths
        #[arg(long)]
        foreign_prefix: Option<String>,

        /// Local snapshot (JSON)
        #[arg(long, conflicts_with = "content", required_unless_present = "content")]
        local: Option<PathBuf>,

        /// Content dump to collect the local snapshot from
        #[arg(long)]
        content: Option<PathBuf>,

        /// Search roots for --content (default: the dump root)
        #[arg(long = "root", requires = "content")]
        roots: Vec<String>,

        /// Prefix stripped from local paths
        #[arg(long)]
        local_prefix: Option<String>,

        /// Restrict the comparison to this relative subtree
        #[arg(long)]
        scope: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compute the property fingerprint of a node
    Fingerprint {
        /// Content dump (JSON)
        #[arg(long)]
        content: PathBuf,

        /// Node path
        #[arg(long)]
        path: String,

        /// Prefix stripped from the node path
        #[arg(long)]
        strip_prefix: Option<String>,
    },
    /// Rewrite references in a staging copy after a move
    Rewrite {
        /// Content dump (JSON)
        #[arg(long)]
        content: PathBuf,

        /// Root of the subtree to rewrite
        #[arg(long)]
        path: String,

        /// Old location of the moved content
        #[arg(long)]
        source: String,

        /// New location of the moved content
        #[arg(long)]
        dest: String,

        /// Write the rewritten subtree as a content dump
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the replication status of a stage
    Status {
        /// Runtime records of the replication processes (JSON)
        #[arg(long)]
        state: PathBuf,

        /// Release stage
        #[arg(long, default_value = "public")]
        stage: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration
    Config,
}

/// Namespace mapping: a configured process or explicit roots
#[derive(Args, Debug, Clone)]
pub struct MappingArgs {
    /// Configured replication process id
    #[arg(long, conflicts_with_all = ["source_root", "source_scope", "target_root"])]
    pub process: Option<String>,

    /// Source release root
    #[arg(long, required_unless_present = "process")]
    pub source_root: Option<String>,

    /// Part of the release being translated
    #[arg(long)]
    pub source_scope: Option<String>,

    /// Target root
    #[arg(long)]
    pub target_root: Option<String>,
}
