use anyhow::Result;
use clap::{Parser, Subcommand};
use nl2sql::few_shot::ExampleRetriever;
use nl2sql::{AppConfig, GenerateOptions, Nl2SqlService, QueryValidator};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "Natural language to SQL generation with query safety checks")]
struct Args {
    /// JSON schema snapshot (overrides SCHEMA_FILE)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Few-shot examples file (overrides EXAMPLES_FILE)
    #[arg(long, global = true)]
    examples: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate SQL for a question and validate it
    Generate {
        query: String,
        #[arg(long, default_value_t = 3)]
        max_examples: usize,
        /// Run the statement when a database is configured
        #[arg(long)]
        execute: bool,
    },
    /// Run the validator over a SQL statement
    Validate { sql: String },
    /// Strip comments, collapse whitespace and drop trailing statements
    Sanitize { sql: String },
    /// List the query patterns a question matches
    Classify { query: String },
    /// Show the stored examples closest to a question
    Similar {
        query: String,
        #[arg(short, long, default_value_t = 3)]
        limit: usize,
    },
    /// Write the current example set to a file
    ExportExamples { path: PathBuf },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Command::Sanitize { sql } = &args.command {
        println!("{}", QueryValidator::sanitize(sql));
        return Ok(());
    }

    let mut config = AppConfig::from_env()?;
    if args.schema.is_some() {
        config.schema_file = args.schema.clone();
        config.database_url = None;
    }
    if args.examples.is_some() {
        config.examples_file = args.examples.clone();
    }
    let service = Nl2SqlService::from_config(&config).await?;

    match args.command {
        Command::Generate {
            query,
            max_examples,
            execute,
        } => {
            let options = GenerateOptions {
                include_examples: max_examples > 0,
                max_examples,
            };
            let outcome = service.generate_and_execute(&query, &options, execute).await?;
            info!("Generated {}", outcome.generation.generated_sql);
            print_json(&outcome)?;
        }
        Command::Validate { sql } => {
            let result = service.validate(&sql);
            print_json(&result)?;
            println!("complexity: {}", QueryValidator::complexity_score(&sql));
        }
        Command::Classify { query } => {
            print_json(&service.example_store().patterns_for_query(&query))?;
        }
        Command::Similar { query, limit } => {
            let examples = service.example_store().examples();
            let ranked = ExampleRetriever::default().rank(&query, &examples, limit);
            print_json(&ranked)?;
        }
        Command::ExportExamples { path } => {
            if !service.example_store().save(&path) {
                anyhow::bail!("Failed to save examples to {}", path.display());
            }
            println!("Saved {} examples to {}", service.example_store().len(), path.display());
        }
        Command::Sanitize { .. } => {}
    }

    Ok(())
}
