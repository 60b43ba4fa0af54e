//! Contribution ledger CLI.

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};

use anyhow::{Context, Result, bail};
use clap::{ColorChoice, Parser};
use ledger_cli::commands::{Ledger, parse_sort_key, team_slot};
use ledger_cli::config::LedgerConfig;
use ledger_cli::logging::{LogConfig, LogFormat, init_logging};
use ledger_core::SaveOutcome;
use ledger_model::{RowId, TableKey, TextField, UserId};
use ledger_query::{Filter, Sort, SortDirection, query};
use tracing::level_filters::LevelFilter;

mod cli;
mod render;

use crate::cli::{
    AggregateArgs, AuditArgs, Cli, Command, ExportArgs, LogFormatArg, LogLevelArg, PurgeArgs,
    ViewArgs,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(LedgerConfig::default_path);
    let mut config = LedgerConfig::load(Some(&config_path))?;
    if let Some(store) = cli.store.clone() {
        config.store_path = Some(store);
    }

    if let Command::WriteConfig = cli.command {
        config.save_to(&config_path)?;
        println!("Configuration written to {}", config_path.display());
        return Ok(());
    }

    let ledger = Ledger::open(config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(dispatch(&ledger, cli.command))
}

async fn dispatch(ledger: &Ledger, command: Command) -> Result<()> {
    match command {
        Command::Init(args) => {
            let key = table_key(&args.table)?;
            let session = ledger.init_table(&key, &args.labels).await?;
            render::print_origin(key.as_str(), session.origin(), session.rows().len());
        }
        Command::Show(args) => {
            let key = table_key(&args.table)?;
            let session = ledger.open_table(&key).await?;
            let (filters, sort, page_size) = view(ledger, &args.view)?;
            let page = query(session.rows(), &filters, sort, args.view.page, page_size);
            let title = format!("{} ({})", ledger.config().label_of(&key), key);
            render::print_rows(&title, &page, ledger.roster(), separator(ledger)?);
        }
        Command::Set(args) => {
            let key = table_key(&args.table)?;
            let user = user(&args.user.user)?;
            let outcome = ledger
                .set_field(&key, RowId::new(args.row), &args.field, &args.value, &user)
                .await?;
            report_save(&outcome);
        }
        Command::AddRow(args) => {
            let key = table_key(&args.table)?;
            let user = user(&args.user.user)?;
            let (id, outcome) = ledger.add_row(&key, &args.thematique, &user).await?;
            println!("Row {id} added to {key}.");
            report_save(&outcome);
        }
        Command::Comment(args) => {
            let key = table_key(&args.table)?;
            let user = user(&args.user.user)?;
            let outcome = ledger
                .comment(&key, RowId::new(args.row), &args.text, &user)
                .await?;
            report_save(&outcome);
        }
        Command::Audit(args) => audit(ledger, &args).await?,
        Command::Aggregate(args) => aggregate(ledger, &args).await?,
        Command::Export(args) => export(ledger, &args).await?,
        Command::PurgeAudit(args) => purge(ledger, &args).await?,
        Command::WriteConfig => {}
    }
    Ok(())
}

async fn audit(ledger: &Ledger, args: &AuditArgs) -> Result<()> {
    let key = table_key(&args.table)?;
    let mut entries = ledger.audit(&key).await?;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    if args.json {
        let mut out = io::stdout().lock();
        for entry in &entries {
            serde_json::to_writer(&mut out, entry)?;
            writeln!(out)?;
        }
    } else {
        render::print_audit(&entries);
    }
    Ok(())
}

async fn aggregate(ledger: &Ledger, args: &AggregateArgs) -> Result<()> {
    let keys = args
        .tables
        .iter()
        .map(|table| table_key(table))
        .collect::<Result<Vec<_>>>()?;
    let aggregation = ledger.aggregate(&keys).await?;
    let (filters, sort, page_size) = view(ledger, &args.view)?;
    let page = query(&aggregation.rows, &filters, sort, args.view.page, page_size);
    render::print_aggregation(&aggregation, &page, ledger.roster(), separator(ledger)?);
    Ok(())
}

async fn export(ledger: &Ledger, args: &ExportArgs) -> Result<()> {
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    match &args.table {
        Some(table) => {
            let key = table_key(table)?;
            let session = ledger.open_table(&key).await?;
            ledger.export(session.rows(), writer)?;
        }
        None => {
            let aggregation = ledger.aggregate(&[]).await?;
            for failure in &aggregation.failures {
                eprintln!("warning: {}", failure.error.user_message());
            }
            ledger.export(&aggregation.rows, writer)?;
        }
    }
    if let Some(path) = &args.output {
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}

async fn purge(ledger: &Ledger, args: &PurgeArgs) -> Result<()> {
    let key = table_key(&args.table)?;
    if !args.yes {
        bail!("purging {key} cannot be undone; pass --yes to confirm");
    }
    let report = ledger.purge(&key, args.delete_table).await?;
    render::print_purge(key.as_str(), report, args.delete_table);
    Ok(())
}

/// Builds filters, sort and page size from the shared view flags.
fn view(ledger: &Ledger, args: &ViewArgs) -> Result<(Vec<Filter>, Option<Sort>, usize)> {
    let roster = ledger.roster();
    let mut filters = Vec::new();
    if let Some(needle) = &args.search {
        filters.push(Filter::search(needle.as_str()));
    }
    for (field, value) in [
        (TextField::Nature, &args.nature),
        (TextField::Origine, &args.origine),
    ] {
        if let Some(value) = value {
            filters.push(Filter::Equals {
                field,
                value: value.parse()?,
            });
        }
    }
    for team in &args.teams {
        let slot = team_slot(team, roster).with_context(|| format!("unknown team: {team}"))?;
        filters.push(Filter::SlotPositive(slot));
    }

    let sort = match &args.sort {
        Some(column) => {
            let key = parse_sort_key(column, roster)
                .with_context(|| format!("unknown sort column: {column}"))?;
            let direction = if args.descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            Some(Sort { key, direction })
        }
        None => None,
    };
    let page_size = args.page_size.unwrap_or(ledger.config().page_size);
    if page_size == 0 {
        bail!("--page-size must be at least 1");
    }
    Ok((filters, sort, page_size))
}

fn separator(ledger: &Ledger) -> Result<Option<char>> {
    Ok(ledger.config().export_options()?.thousands_separator)
}

fn report_save(outcome: &SaveOutcome) {
    match outcome {
        SaveOutcome::Saved { entries } => {
            println!("Saved ({} change(s) recorded).", entries.len());
        }
        SaveOutcome::NoChanges => println!("Nothing to save."),
    }
}

fn table_key(raw: &str) -> Result<TableKey> {
    TableKey::new(raw).with_context(|| format!("invalid table name: {raw:?}"))
}

fn user(raw: &str) -> Result<UserId> {
    UserId::new(raw).context("a user is required (--user)")
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
