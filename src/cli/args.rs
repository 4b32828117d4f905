//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::SelectionMode;

/// Transaction requirement trees: author condition/requirement rules and evaluate them
#[derive(Parser, Debug)]
#[command(name = "reqtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Store directory (default: settings store_dir)
    #[arg(short, long, global = true, value_hint = ValueHint::DirPath)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage transactions
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },

    /// Edit nodes of a transaction tree
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Evaluate requirements for a taxpayer's situation
    Eval {
        #[command(subcommand)]
        command: EvalCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Selection mode as accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Single,
    Multi,
}

impl From<ModeArg> for SelectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => SelectionMode::Single,
            ModeArg::Multi => SelectionMode::Multi,
        }
    }
}

/// Transaction metadata kept on the root
#[derive(Args, Debug, Clone, Default)]
pub struct MetaArgs {
    /// Fee amount
    #[arg(long)]
    pub fee: Option<f64>,
    /// Processing duration, e.g. "3 days"
    #[arg(long)]
    pub duration: Option<String>,
    /// Service name
    #[arg(long)]
    pub service: Option<String>,
    /// Category label
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TxCommands {
    /// List transaction keys
    List,

    /// Create a transaction with an empty root
    Init {
        /// Transaction key
        key: String,
        #[command(flatten)]
        meta: MetaArgs,
    },

    /// Show the requirement tree
    Show {
        /// Transaction key
        key: String,
        /// Print the stored JSON tree
        #[arg(long)]
        json: bool,
    },

    /// Change root metadata (unspecified fields are kept)
    Meta {
        /// Transaction key
        key: String,
        #[command(flatten)]
        meta: MetaArgs,
    },

    /// Mark the transaction as published
    Publish {
        /// Transaction key
        key: String,
        /// Withdraw instead of publish
        #[arg(long)]
        unpublish: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// Add a condition under a parent condition
    AddCondition {
        /// Transaction key
        key: String,
        /// Parent node id ("root" for the top level)
        parent: String,
        /// Condition name
        name: String,
        /// How many children may be picked
        #[arg(short, long, value_enum, default_value_t = ModeArg::Multi)]
        mode: ModeArg,
    },

    /// Add a requirement under a parent condition
    AddRequirement {
        /// Transaction key
        key: String,
        /// Parent node id ("root" for the top level)
        parent: String,
        /// Requirement name
        name: String,
        /// Free-text note
        #[arg(long, default_value = "")]
        note: String,
        /// Alternatives group label
        #[arg(short, long)]
        group: Option<String>,
        /// Not counted towards completeness
        #[arg(long)]
        optional: bool,
        /// Where to obtain the document
        #[arg(long, requires = "source_link")]
        source_label: Option<String>,
        /// Link to the source
        #[arg(long, requires = "source_label")]
        source_link: Option<String>,
    },

    /// Change scalar fields of a node (children are kept)
    Update {
        /// Transaction key
        key: String,
        /// Node id
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Condition only
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
        /// Requirement only
        #[arg(long)]
        note: Option<String>,
        /// Requirement only
        #[arg(short, long, conflicts_with = "clear_group")]
        group: Option<String>,
        /// Requirement only: drop the group label
        #[arg(long)]
        clear_group: bool,
        /// Requirement only
        #[arg(long)]
        optional: Option<bool>,
    },

    /// Remove a node and its subtree
    Remove {
        /// Transaction key
        key: String,
        /// Node id
        id: String,
    },

    /// Show the parent of a node
    Parent {
        /// Transaction key
        key: String,
        /// Node id
        id: String,
    },

    /// Show a node
    Get {
        /// Transaction key
        key: String,
        /// Node id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum EvalCommands {
    /// Scripted evaluation: pick conditions, check documents, report what is missing
    Run {
        /// Transaction key
        key: String,
        /// Condition id to pick (repeatable, applied level by level)
        #[arg(short, long = "pick")]
        picks: Vec<String>,
        /// Requirement id already provided (repeatable)
        #[arg(short, long = "check")]
        checked: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive drill-down and checklist (fzf)
    Wizard {
        /// Transaction key
        key: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Write the config template (local store config by default)
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
