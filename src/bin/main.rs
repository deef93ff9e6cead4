//! Quarry CLI - compile JSON query descriptors to SQL
//!
//! Usage:
//!   quarry compile --query <q.json> [--dialect <dialect>] [--config <quarry.toml>] [--count | --where]
//!   quarry dialects
//!   quarry tables [--config <quarry.toml>]
//!
//! Examples:
//!   quarry compile --query users.json --dialect postgres
//!   quarry compile --query users.json --count
//!   quarry tables --config ./quarry.toml

use clap::{Parser, Subcommand};
use quarry::config::Settings;
use quarry::sql::{Compiler, Conditions, Dialect, Select, SqlDialect};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Quarry - compile a condition DSL to dialect-correct SQL")]
#[command(version)]
struct Cli {
    /// Log schema registration and config discovery
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON query descriptor to SQL
    Compile {
        /// Path to the query descriptor (JSON)
        #[arg(short, long)]
        query: PathBuf,

        /// SQL dialect to generate (defaults to the config's dialect)
        #[arg(short, long)]
        dialect: Option<Dialect>,

        /// Path to quarry.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit the row-count wrapper instead of the statement
        #[arg(long, conflicts_with = "where_only")]
        count: bool,

        /// Emit only the WHERE fragment
        #[arg(long = "where")]
        where_only: bool,
    },

    /// List supported dialects
    Dialects,

    /// List tables and joins from the config
    Tables {
        /// Path to quarry.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// JSON form of a SELECT descriptor.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuerySpec {
    table: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default, rename = "where")]
    conditions: Conditions,
    #[serde(default)]
    group_by: Vec<String>,
    #[serde(default)]
    having: Conditions,
    #[serde(default)]
    order_by: Vec<String>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    distinct: bool,
    #[serde(default)]
    for_update: bool,
}

impl QuerySpec {
    fn into_select(self) -> Result<Select, String> {
        let mut select = Select::from(self.table)
            .fields(self.fields)
            .filter(self.conditions)
            .group_by(self.group_by)
            .having(self.having)
            .order_by(self.order_by);
        if let Some(alias) = self.alias {
            select = select.alias(alias);
        }
        select = match (self.limit, self.offset) {
            (Some(count), Some(offset)) => select.page(offset, count),
            (Some(count), None) => select.limit(count),
            (None, Some(_)) => return Err("`offset` requires `limit`".to_string()),
            (None, None) => select,
        };
        if self.distinct {
            select = select.distinct();
        }
        if self.for_update {
            select = select.for_update();
        }
        Ok(select)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            query,
            dialect,
            config,
            count,
            where_only,
        } => cmd_compile(&query, dialect, config.as_deref(), count, where_only),
        Commands::Dialects => cmd_dialects(),
        Commands::Tables { config } => cmd_tables(config.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "quarry=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_compile(
    query: &Path,
    dialect: Option<Dialect>,
    config: Option<&Path>,
    count: bool,
    where_only: bool,
) -> ExitCode {
    let settings = match Settings::load(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let registry = match settings.registry() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error building schema: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = match fs::read_to_string(query) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", query.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let select = match serde_json::from_str::<QuerySpec>(&source)
        .map_err(|e| e.to_string())
        .and_then(QuerySpec::into_select)
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid query descriptor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut options = settings.compiler_options();
    if let Some(dialect) = dialect {
        options.dialect = dialect;
    }
    let compiler = Compiler::new(&registry, options);

    let compiled = match compiler.compile(&select) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Compilation error ({}): {}", e.kind(), e);
            return ExitCode::FAILURE;
        }
    };
    if count {
        println!("{}", compiled.to_count_sql());
    } else if where_only {
        println!("{}", compiled.to_where_sql());
    } else {
        println!("{}", compiled.to_sql());
    }
    ExitCode::SUCCESS
}

fn cmd_dialects() -> ExitCode {
    for dialect in Dialect::ALL {
        let profile = dialect.profile();
        println!(
            "{:<12} {}ident{}  full join: {}  replace: {}",
            dialect.name(),
            profile.ident_open,
            profile.ident_close,
            if dialect.supports_full_outer_join() { "yes" } else { "no" },
            if dialect.supports_replace() { "yes" } else { "no" },
        );
    }
    ExitCode::SUCCESS
}

fn cmd_tables(config: Option<&Path>) -> ExitCode {
    let settings = match Settings::load(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let registry = match settings.registry() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error building schema: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut any = false;
    for table in registry.tables() {
        any = true;
        println!("{} ({})", table.name, table.model);
        println!("  columns: {}", table.columns.join(", "));
        if let Some(pk) = &table.primary_key {
            println!("  primary key: {}", pk);
        }
        if !table.unique_keys.is_empty() {
            println!("  unique keys: {}", table.unique_keys.join(", "));
        }
        for join in registry.joins_of(&table.name) {
            let on = join
                .on
                .iter()
                .map(|(s, t)| format!("{}={}", s, t))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  join {} -> {} [{}] on {}", join.tag, join.target, join.kind, on);
        }
    }
    if !any {
        println!("No tables configured.");
    }
    ExitCode::SUCCESS
}
