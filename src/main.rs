//! PartAssist - Main CLI Entry Point

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use partassist::{
    cli::{Args, Commands, Verbosity},
    config::AppConfig,
    embedding::{self, Embedder},
    generation,
    index::{DocumentIndexer, IndexReport, SemanticIndex, SharedIndex},
    rag::{AnswerComposer, AnswerPipeline, VectorRetriever},
    server::{self, AppState},
    telemetry::{TelemetryCollector, TelemetryEvent},
    AnswerPayload,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();

    let config = startup(AppConfig::load(args.config.as_deref()))?;
    init_tracing(&config, verbosity);

    match &args.command {
        Commands::Config => show_config(&args, &config)?,
        Commands::Index { corpus } => {
            startup(config.validate())?;
            let corpus = corpus.clone().unwrap_or_else(|| config.index.corpus.clone());
            run_index(&config, &corpus, verbosity).await?;
        }
        Commands::Ask { question, json } => {
            startup(config.validate())?;
            run_ask(&config, question, *json).await?;
        }
        Commands::Serve { bind, reindex } => {
            startup(config.validate())?;
            let bind = bind.clone().unwrap_or_else(|| config.server.bind.clone());
            run_serve(&config, &bind, *reindex || config.server.index_on_start, verbosity).await?;
        }
    }

    Ok(())
}

/// Configuration errors end the process before any work is attempted;
/// anything else is returned to the caller
fn startup<T>(result: partassist::Result<T>) -> Result<T> {
    match result {
        Err(err) if err.is_fatal_at_startup() => {
            eprintln!("{} {}", "✗".red(), err);
            std::process::exit(2);
        }
        other => Ok(other?),
    }
}

/// RUST_LOG wins over the flags, which win over `logging.filter`
fn init_tracing(config: &AppConfig, verbosity: Verbosity) {
    let fallback = verbosity
        .log_filter()
        .unwrap_or(config.logging.filter.as_str())
        .to_string();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_index(config: &AppConfig) -> Result<SharedIndex> {
    let index = SemanticIndex::open(&config.index.dir)
        .with_context(|| format!("opening index at {}", config.index.dir.display()))?;
    Ok(index.into_shared())
}

async fn index_corpus(
    embedder: Arc<dyn Embedder>,
    index: SharedIndex,
    corpus: &Path,
    verbosity: Verbosity,
) -> Result<IndexReport> {
    let pb = ProgressBar::new(0);
    if verbosity.show_progress() {
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        pb.set_message("embedding parts");
    } else {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let progress_pb = pb.clone();
    let indexer = DocumentIndexer::new(embedder, index).with_progress(Box::new(move |done, total| {
        progress_pb.set_length(total as u64);
        progress_pb.set_position(done as u64);
    }));

    let report = indexer.index_file(corpus).await;
    pb.finish_and_clear();
    Ok(report?)
}

async fn run_index(config: &AppConfig, corpus: &Path, verbosity: Verbosity) -> Result<()> {
    let embedder = startup(embedding::from_config(config))?;
    let index = open_index(config)?;

    let report = index_corpus(embedder, index, corpus, verbosity).await?;
    println!(
        "{} Indexed {} parts from {} ({} units total)",
        "✓".green(),
        report.indexed.to_string().bold(),
        corpus.display(),
        report.total_units
    );
    Ok(())
}

fn build_pipeline(
    config: &AppConfig,
    embedder: Arc<dyn Embedder>,
    index: SharedIndex,
    telemetry: TelemetryCollector,
) -> Result<AnswerPipeline> {
    let generator = startup(generation::from_config(config))?;
    let retriever = Arc::new(VectorRetriever::new(embedder, index));
    let composer = AnswerComposer::from_config(generator, config);
    Ok(AnswerPipeline::from_config(retriever, composer, config).with_telemetry(telemetry))
}

async fn run_ask(config: &AppConfig, question: &str, json: bool) -> Result<()> {
    let embedder = startup(embedding::from_config(config))?;
    let index = open_index(config)?;
    let pipeline = build_pipeline(config, embedder, index, TelemetryCollector::new())?;

    let payload = pipeline.handle(question).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_payload(&payload);
    }
    Ok(())
}

fn print_payload(payload: &AnswerPayload) {
    println!("{} {}", "Intent:".bold(), payload.intent.to_string().cyan());
    println!();
    println!("{}", payload.answer_text);

    if let Some(card) = &payload.product_card {
        println!();
        println!("{}", "Product".bold().underline());
        let fields = [
            ("Part #", card.part_number()),
            ("Name", card.name()),
            ("Brand", card.brand()),
            ("Image", card.image()),
            ("Link", card.link()),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                println!("  {:<8} {}", label.dimmed(), value);
            }
        }
    }
}

async fn run_serve(
    config: &AppConfig,
    bind: &str,
    reindex: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let embedder = startup(embedding::from_config(config))?;
    let index = open_index(config)?;
    let telemetry = TelemetryCollector::new();

    if reindex {
        let report =
            index_corpus(embedder.clone(), index.clone(), &config.index.corpus, verbosity).await?;
        telemetry.record(TelemetryEvent::IndexRun {
            indexed: report.indexed,
            total_units: report.total_units,
        });
    }

    let units = index.read().await.len();
    if units == 0 {
        tracing::warn!(dir = %config.index.dir.display(), "index is empty; answers will have no context");
    }

    let pipeline = Arc::new(build_pipeline(config, embedder, index.clone(), telemetry)?);
    server::serve(AppState::new(pipeline, index), bind).await?;
    Ok(())
}

fn show_config(args: &Args, config: &AppConfig) -> Result<()> {
    let source = args
        .config
        .clone()
        .or_else(AppConfig::default_path)
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("(built-in defaults)"));

    println!("{} {}", "Config source:".bold(), source.display());
    println!();
    print!("{}", config.to_redacted_toml()?);

    if let Err(e) = config.validate() {
        println!();
        println!("{} {}", "⚠".yellow(), e);
    }
    Ok(())
}
