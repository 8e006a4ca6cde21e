use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nl2sparql::execution::{self, HttpSparqlExecutor, SparqlExecutor};
use nl2sparql::{Config, Extractor, Translation, Translator, EXAMPLE_QUESTIONS};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nl2sparql")]
#[command(about = "Translate natural-language questions into SPARQL over the CCCM ontology")]
struct Args {
    /// JSON file with extra vocabulary keywords (or set NL2SPARQL_VOCABULARY)
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the analysis and the generated SPARQL
    Translate {
        #[arg(required = true)]
        question: Vec<String>,

        /// Emit one JSON document instead of text
        #[arg(long)]
        json: bool,
    },

    /// Translate, then execute against a SPARQL endpoint
    Run {
        #[arg(required = true)]
        question: Vec<String>,

        /// SPARQL query URL (or set NL2SPARQL_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Translate the bundled example questions
    Examples,

    /// Dataset statistics, classes and properties
    Stats {
        #[arg(long)]
        endpoint: Option<String>,
    },
}

fn print_translation(translation: &Translation) {
    let query = &translation.nl_query;
    println!("QUESTION: {}", translation.question);
    println!("  Intent:          {:?}", query.intent);
    println!("  Classes:         {:?}", query.detected_classes);
    println!("  Properties:      {:?}", query.detected_properties);
    println!("  Filters:         {:?}", query.filters);
    println!("  Aggregation:     {:?}", query.aggregation);
    println!("  Special pattern: {:?}", query.special_pattern);
    println!("  Template:        {}", translation.sparql.template());
    println!();
    println!("{}", translation.sparql);
    println!();
}

fn executor_for(config: &Config) -> Result<Arc<dyn SparqlExecutor>> {
    let executor = HttpSparqlExecutor::from_config(config)?;
    info!("Using SPARQL endpoint {}", executor.endpoint());
    Ok(Arc::new(executor))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nl2sparql=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::from_env()?.with_vocabulary_path(args.vocabulary);
    let vocabulary = config
        .load_vocabulary()
        .context("Failed to load vocabulary")?;
    let translator = Translator::new(Extractor::with_vocabulary(vocabulary));

    match args.command {
        Command::Translate { question, json } => {
            let translation = translator.translate(&question.join(" "));
            if json {
                println!("{}", serde_json::to_string_pretty(&translation)?);
            } else {
                print_translation(&translation);
            }
        }

        Command::Run { question, endpoint } => {
            let config = config.with_endpoint(endpoint);
            let translator = translator.with_executor(executor_for(&config)?);
            let translation = translator.translate(&question.join(" "));
            print_translation(&translation);

            match translator.execute(&translation).await {
                Ok(table) => println!("{}", table),
                Err(failure) => {
                    eprintln!("Query failed ({}): {}", failure.class, failure.error);
                    std::process::exit(1);
                }
            }
        }

        Command::Examples => {
            for question in EXAMPLE_QUESTIONS {
                print_translation(&translator.translate(question));
            }
        }

        Command::Stats { endpoint } => {
            let config = config.with_endpoint(endpoint);
            let executor = executor_for(&config)?;

            let stats = execution::statistics(executor.as_ref()).await?;
            println!("Total triples: {}", stats.total_triples);
            for (class, count) in &stats.class_counts {
                println!("  {:<14} {}", class, count);
            }

            let classes = execution::list_classes(executor.as_ref()).await?;
            println!("Classes: {}", classes.join(", "));

            let properties = execution::list_properties(executor.as_ref()).await?;
            println!("Properties: {}", properties.join(", "));
        }
    }

    Ok(())
}
