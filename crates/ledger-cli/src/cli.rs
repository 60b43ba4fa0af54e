//! CLI argument definitions for the ledger.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "ledger",
    version,
    about = "Contribution ledger - audited team contribution tables",
    long_about = "Edit shared contribution tables with a field-level audit trail,\n\
                  and consolidate many tables into one view."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ledger.toml in the user config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Store file, overriding `store_path` from the config.
    #[arg(long = "store", value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a table from thematic labels unless it already exists.
    Init(InitArgs),

    /// Show a table, filtered, sorted and paginated.
    Show(ShowArgs),

    /// Set a text field or a team contribution of one row.
    Set(SetArgs),

    /// Append a row to a table.
    AddRow(AddRowArgs),

    /// Set your comment on a row; an empty text removes it.
    Comment(CommentArgs),

    /// List the audit trail of a table, newest first.
    Audit(AuditArgs),

    /// Consolidate several tables by thematic label.
    Aggregate(AggregateArgs),

    /// Export a table, or the consolidated view, as CSV.
    Export(ExportArgs),

    /// Delete the audit trail of a table, in chunks.
    PurgeAudit(PurgeArgs),

    /// Write the effective configuration to the config path.
    WriteConfig,
}

/// Acting user, recorded in audit entries.
#[derive(Args)]
pub struct UserArgs {
    #[arg(long = "user", short = 'u', value_name = "USER")]
    pub user: String,
}

#[derive(Args)]
pub struct InitArgs {
    pub table: String,

    /// Thematic labels of the initial rows.
    #[arg(value_name = "LABEL")]
    pub labels: Vec<String>,
}

/// Filter, sort and page options shared by `show` and `aggregate`.
#[derive(Args)]
pub struct ViewArgs {
    /// Case-insensitive search over every text field.
    #[arg(long = "search", short = 's')]
    pub search: Option<String>,

    /// Keep rows whose nature is exactly this value ("all" keeps every row).
    #[arg(long = "nature")]
    pub nature: Option<String>,

    /// Keep rows whose origine is exactly this value ("all" keeps every row).
    #[arg(long = "origine")]
    pub origine: Option<String>,

    /// Keep rows where this team contributed (repeatable).
    #[arg(long = "team", value_name = "TEAM")]
    pub teams: Vec<String>,

    /// Sort column: id, total, a text field or a team.
    #[arg(long = "sort", value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort in descending order.
    #[arg(long = "desc", requires = "sort")]
    pub descending: bool,

    /// Page to show (1-based).
    #[arg(long = "page", short = 'p', default_value_t = 1)]
    pub page: usize,

    /// Rows per page (default from the config).
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub table: String,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Args)]
pub struct SetArgs {
    pub table: String,

    /// Row id.
    pub row: u64,

    /// Text field (thematique, origine, ...) or team name.
    pub field: String,

    pub value: String,

    #[command(flatten)]
    pub user: UserArgs,
}

#[derive(Args)]
pub struct AddRowArgs {
    pub table: String,

    /// Thematic label of the new row.
    pub thematique: String,

    #[command(flatten)]
    pub user: UserArgs,
}

#[derive(Args)]
pub struct CommentArgs {
    pub table: String,

    /// Row id.
    pub row: u64,

    /// Comment text; empty removes your comment.
    #[arg(default_value = "")]
    pub text: String,

    #[command(flatten)]
    pub user: UserArgs,
}

#[derive(Args)]
pub struct AuditArgs {
    pub table: String,

    /// Show at most this many entries.
    #[arg(long = "limit", short = 'n')]
    pub limit: Option<usize>,

    /// Print entries as JSON lines.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct AggregateArgs {
    /// Tables to merge (default: every table in the config).
    #[arg(value_name = "TABLE")]
    pub tables: Vec<String>,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Table to export; omit with --aggregate.
    #[arg(required_unless_present = "aggregate")]
    pub table: Option<String>,

    /// Export the consolidated view of the configured tables.
    #[arg(long = "aggregate", conflicts_with = "table")]
    pub aggregate: bool,

    /// Output file (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PurgeArgs {
    pub table: String,

    /// Delete the table document as well.
    #[arg(long = "delete-table")]
    pub delete_table: bool,

    /// Confirm the deletion.
    #[arg(long = "yes")]
    pub yes: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
