//! `catalog`: inspect the product catalog schema and manage its migrations.

mod config;

use camino::Utf8PathBuf;
use catalog::meta::DEFAULT_META_TABLE;
use catalog::{MigrationRunner, Schema, SchemaCodegen, SchemaDiffExt};
use clap::{Parser, Subcommand};
use config::{Config, ConfigError};
use owo_colors::OwoColorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Schema and migrations for the product catalog.
#[derive(Parser, Debug)]
#[command(name = "catalog", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the schema descriptor
    Schema,
    /// Print CREATE TABLE statements for the schema
    Sql,
    /// Write the schema as JSON
    Snapshot {
        /// File to write; stdout if omitted
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },
    /// Compare the schema to a JSON snapshot
    Diff {
        /// Snapshot written by `catalog snapshot`
        #[arg(long)]
        from: Utf8PathBuf,
    },
    /// Print the SQL of every migration
    Migrations,
    /// Show which migrations have been applied
    Status {
        /// Database connection URL
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
    },
    /// Apply pending migrations
    Migrate {
        /// Database connection URL
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] catalog::Error),

    #[error(transparent)]
    Schema(#[from] catalog::SchemaError),

    #[error("failed to connect to database: {0}")]
    Connect(#[from] tokio_postgres::Error),

    #[error("failed to access {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "no database URL: pass --database-url, set DATABASE_URL, or add database_url to .config/catalog.toml"
    )]
    MissingDatabaseUrl,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli, || config::load().map(|(config, _)| config)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Run one command. `load_config` is only called by commands that talk to
/// the database, so a broken config file never blocks the offline ones.
async fn run(
    cli: Cli,
    load_config: impl Fn() -> Result<Config, ConfigError>,
) -> Result<(), CliError> {
    match cli.command {
        Commands::Schema => print_schema(&catalog::schema()),
        Commands::Sql => println!("{}", catalog::schema().to_sql()),
        Commands::Snapshot { output } => {
            let json = catalog::schema().to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{json}\n"))
                        .map_err(|source| CliError::Io { path: path.clone(), source })?;
                    println!("{} {}", "Wrote".green(), path);
                }
                None => println!("{json}"),
            }
        }
        Commands::Diff { from } => {
            let content = std::fs::read_to_string(&from)
                .map_err(|source| CliError::Io { path: from.clone(), source })?;
            let snapshot = Schema::from_json(&content)?;
            let diff = catalog::schema().diff(&snapshot);

            if diff.is_empty() {
                println!("{}", "No changes.".green());
            } else {
                println!("{} change(s):", diff.change_count());
                print!("{diff}");
                println!();
                print!("{}", diff.to_sql());
            }
        }
        Commands::Migrations => print_migrations()?,
        Commands::Status { database_url } => {
            let config = load_config()?;
            let url = database_url_or_config(database_url, &config)?;
            let client = connect(&url).await?;
            let set = catalog::migrations()?;
            let runner = MigrationRunner::new(&client, &set).with_meta_table(meta_table(&config));

            println!("database: {}", mask_password(&url).dimmed());
            for status in runner.status().await? {
                match status.applied_at {
                    Some(at) => println!(
                        "  {} {} {}",
                        "applied".green(),
                        status.version,
                        at.format("%Y-%m-%d %H:%M:%S UTC").dimmed()
                    ),
                    None => println!("  {} {}", "pending".yellow(), status.version),
                }
            }
        }
        Commands::Migrate { database_url } => {
            let config = load_config()?;
            let url = database_url_or_config(database_url, &config)?;
            let client = connect(&url).await?;
            let set = catalog::migrations()?;
            let runner = MigrationRunner::new(&client, &set).with_meta_table(meta_table(&config));

            println!("database: {}", mask_password(&url).dimmed());
            let ran = runner.migrate().await?;
            if ran.is_empty() {
                println!("{}", "Up to date.".green());
            }
            for m in &ran {
                println!(
                    "  {} {} ({} statement(s))",
                    "applied".green(),
                    m.version,
                    m.statement_count
                );
            }
        }
    }

    Ok(())
}

fn print_schema(schema: &Schema) {
    for table in schema.iter_tables() {
        println!(
            "{} ({} columns)",
            table.name.bold(),
            table.columns.len()
        );
        if let Some(doc) = &table.doc {
            println!("  {}", doc.dimmed());
        }
        for col in &table.columns {
            let mut attrs = Vec::new();
            if col.primary_key {
                attrs.push("PK".to_string());
            }
            if !col.nullable {
                attrs.push("NOT NULL".to_string());
            }
            if let Some(default) = &col.default {
                attrs.push(format!("DEFAULT {default}"));
            }

            let attrs_str = if attrs.is_empty() {
                String::new()
            } else {
                format!(" [{}]", attrs.join(", "))
            };

            println!("  {}: {}{}", col.name.cyan(), col.pg_type, attrs_str.dimmed());
        }
        println!();
    }
}

fn print_migrations() -> Result<(), CliError> {
    let set = catalog::migrations()?;
    for planned in set.plan()? {
        println!("{} {}", "--".dimmed(), planned.version.bold());
        println!("{}", planned.to_sql());
        println!("{} checksum {}", "--".dimmed(), planned.checksum.dimmed());
        println!();
    }

    let pending = set.pending_schema_changes(&catalog::schema());
    if !pending.is_empty() {
        println!(
            "{} the schema has {} change(s) not covered by any migration:",
            "warning:".yellow().bold(),
            pending.change_count()
        );
        print!("{pending}");
    }
    Ok(())
}

fn database_url_or_config(flag: Option<String>, config: &Config) -> Result<String, CliError> {
    flag.or_else(|| config.database_url.clone())
        .ok_or(CliError::MissingDatabaseUrl)
}

fn meta_table(config: &Config) -> String {
    config
        .migrations_table
        .clone()
        .unwrap_or_else(|| DEFAULT_META_TABLE.to_string())
}

async fn connect(url: &str) -> Result<tokio_postgres::Client, CliError> {
    let (client, connection) = tokio_postgres::connect(url, tokio_postgres::NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("database connection error: {}", e);
        }
    });

    Ok(client)
}

/// Mask password in database URL for display
fn mask_password(url: &str) -> String {
    if let Some(start) = url.find("://")
        && let Some(at) = url.rfind('@')
        && at > start
    {
        let prefix = &url[..start + 3];
        let suffix = &url[at..];
        if let Some(colon) = url[start + 3..at].find(':') {
            let user = &url[start + 3..start + 3 + colon];
            return format!("{}{}:***{}", prefix, user, suffix);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://app:s3cret@db:5432/catalog"),
            "postgres://app:***@db:5432/catalog"
        );
        assert_eq!(
            mask_password("postgres://app@db/catalog"),
            "postgres://app@db/catalog"
        );
        assert_eq!(mask_password("not a url"), "not a url");
    }

    #[test]
    fn test_mask_password_with_at_in_password() {
        assert_eq!(
            mask_password("postgres://app:p@ss@db/catalog"),
            "postgres://app:***@db/catalog"
        );
    }

    #[test]
    fn test_flag_wins_over_config() {
        let config = Config {
            database_url: Some("postgres://from-file".to_string()),
            migrations_table: None,
        };
        assert_eq!(
            database_url_or_config(Some("postgres://from-flag".to_string()), &config).unwrap(),
            "postgres://from-flag"
        );
        assert_eq!(
            database_url_or_config(None, &config).unwrap(),
            "postgres://from-file"
        );
        assert!(matches!(
            database_url_or_config(None, &Config::default()),
            Err(CliError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn test_meta_table_from_config() {
        assert_eq!(meta_table(&Config::default()), DEFAULT_META_TABLE);
        let config = Config {
            database_url: None,
            migrations_table: Some("schema_history".to_string()),
        };
        assert_eq!(meta_table(&config), "schema_history");
    }

    fn broken_config() -> Result<Config, ConfigError> {
        Config::from_toml("database_url = ", camino::Utf8Path::new(".config/catalog.toml"))
    }

    #[tokio::test]
    async fn test_offline_commands_ignore_broken_config() {
        for args in [
            ["catalog", "schema"],
            ["catalog", "sql"],
            ["catalog", "migrations"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            run(cli, broken_config).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_database_commands_report_broken_config() {
        let cli = Cli::try_parse_from([
            "catalog",
            "status",
            "--database-url",
            "postgres://app@localhost/catalog",
        ])
        .unwrap();
        let err = run(cli, broken_config).await.unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_parse_diff_requires_from() {
        assert!(Cli::try_parse_from(["catalog", "diff"]).is_err());
        let cli = Cli::try_parse_from(["catalog", "diff", "--from", "snap.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Diff { ref from } if from == "snap.json"));
    }
}
