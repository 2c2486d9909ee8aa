//! Itemflow Ingest - CSV item import tool

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use itemflow_common::logging::{init_logging, LogConfig, LogLevel};
use itemflow_ingest::config::parse_delimiter;
use itemflow_ingest::db::{create_pool, health_check};
use itemflow_ingest::{
    CommitPolicy, ImportError, ImportPipeline, ImportRun, InMemoryItemRepository, IngestConfig,
    ItemLoader, ItemRepository, ItemValidator, PgItemRepository,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "itemflow-ingest")]
#[command(author, version, about = "Import items from CSV files")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import items from a CSV file
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// CSV file to import, `-` for stdin
    filename: String,

    /// Validate and load into a throwaway in-memory store
    #[arg(long)]
    dry_run: bool,

    /// Header of the name column
    #[arg(long)]
    name_column: Option<String>,

    /// Header of the description column
    #[arg(long)]
    description_column: Option<String>,

    /// Field delimiter (single character, or `tab`)
    #[arg(long, value_parser = parse_delimiter)]
    delimiter: Option<u8>,

    /// Match header names ignoring case
    #[arg(long)]
    case_insensitive_headers: bool,

    /// What a duplicate name does to the rest of the batch
    #[arg(long)]
    commit_policy: Option<CommitPolicy>,
}

impl ImportArgs {
    /// Command line flags override the environment
    fn apply(&self, config: &mut IngestConfig) {
        if let Some(name) = &self.name_column {
            config.columns.name = name.clone();
        }
        if let Some(description) = &self.description_column {
            config.columns.description = description.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if self.case_insensitive_headers {
            config.columns.case_sensitive = false;
        }
        if let Some(policy) = self.commit_policy {
            config.commit_policy = policy;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("itemflow-ingest")
        .filter_directives("sqlx=warn")
        .build();

    // Environment variables take precedence over the defaults above
    let _guard = match log_config.merge_env().and_then(|c| init_logging(&c)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("itemflow-ingest: failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        },
    };

    match cli.command {
        Command::Import(args) => match import(&args).await {
            Ok(run) => {
                println!("{}", run.summary());
                ExitCode::SUCCESS
            },
            Err(e) => {
                // Pipeline failures were already logged with phase and kind
                if e.downcast_ref::<ImportError>().is_none() {
                    error!(filename = %args.filename, error = %format!("{e:#}"), "Import failed");
                }
                ExitCode::FAILURE
            },
        },
    }
}

async fn import(args: &ImportArgs) -> Result<ImportRun> {
    let mut config = IngestConfig::load().context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let repository = open_repository(&config, args.dry_run).await?;
    let pipeline = ImportPipeline::new(
        config.reader(),
        ItemValidator::new(),
        ItemLoader::new(repository),
    );

    let run = if args.filename == "-" {
        pipeline.run_reader("<stdin>", std::io::stdin().lock()).await?
    } else {
        pipeline.run(&args.filename).await?
    };

    Ok(run)
}

async fn open_repository(config: &IngestConfig, dry_run: bool) -> Result<Arc<dyn ItemRepository>> {
    if dry_run {
        info!("Dry run: loading into an in-memory store");
        return Ok(Arc::new(
            InMemoryItemRepository::new().with_policy(config.commit_policy),
        ));
    }

    let db = config.require_database()?;
    let pool = create_pool(db).await.context("Failed to connect to database")?;
    health_check(&pool).await.context("Database health check failed")?;

    let repository = PgItemRepository::new(pool).with_policy(config.commit_policy);
    repository
        .ensure_schema()
        .await
        .context("Failed to prepare items table")?;

    info!(commit_policy = %config.commit_policy, "Connected to item store");
    Ok(Arc::new(repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn import_args(argv: &[&str]) -> ImportArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Import(args) => args,
        }
    }

    fn env_config() -> IngestConfig {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ITEMFLOW_DELIMITER", ";"),
            ("ITEMFLOW_COMMIT_POLICY", "atomic"),
            ("ITEMFLOW_NAME_COLUMN", "title"),
        ]);
        IngestConfig::from_vars(|key| vars.get(key).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn test_flags_override_environment() {
        let mut config = env_config();
        let args = import_args(&[
            "itemflow-ingest",
            "import",
            "items.csv",
            "--delimiter",
            "tab",
            "--commit-policy",
            "best-effort",
            "--name-column",
            "label",
            "--case-insensitive-headers",
        ]);

        args.apply(&mut config);

        assert_eq!(config.delimiter, b'\t');
        assert_eq!(config.commit_policy, CommitPolicy::BestEffort);
        assert_eq!(config.columns.name, "label");
        assert!(!config.columns.case_sensitive);
    }

    #[test]
    fn test_environment_kept_without_flags() {
        let mut config = env_config();
        import_args(&["itemflow-ingest", "import", "items.csv"]).apply(&mut config);

        assert_eq!(config.delimiter, b';');
        assert_eq!(config.commit_policy, CommitPolicy::Atomic);
        assert_eq!(config.columns.name, "title");
        assert!(config.columns.case_sensitive);
    }

    #[test]
    fn test_invalid_flag_values_are_rejected() {
        let argv = ["itemflow-ingest", "import", "items.csv", "--delimiter", ";;"];
        assert!(Cli::try_parse_from(argv).is_err());

        let argv = ["itemflow-ingest", "import", "items.csv", "--commit-policy", "maybe"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
