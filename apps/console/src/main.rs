use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AnalysisSession, BatchSession, ConnectivityMonitor, HttpGateway, SentimentGateway,
    ServerStatus, SessionOptions, HISTORY_CAPACITY,
};
use shared::protocol::{BatchEntry, BatchStatistics, SentimentResult};

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Status,
    Analyze { text: String },
    Batch { texts: Vec<String> },
    Stats,
    Smoke,
}

const SMOKE_TEXTS: [&str; 6] = [
    "This product is amazing, I totally recommend it!",
    "Terrible experience, I will never buy here again.",
    "It's okay, nothing special. It does the job.",
    "Excellent! It exceeded all my expectations.",
    "Not worth the price, there are better options out there.",
    "Fast shipping and the quality is great, very happy overall.",
];

const SMOKE_BATCH: [&str; 5] = [
    "Excellent customer service",
    "Defective product, I asked for a refund",
    "Average, neither good nor bad",
    "Exceeded my expectations",
    "Complete waste of money",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(url) = cli.server_url {
        settings.server_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = secs;
    }

    let gateway: Arc<dyn SentimentGateway> = Arc::new(HttpGateway::with_timeout(
        &settings.server_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?);

    match cli.command {
        Command::Status => run_status(gateway).await,
        Command::Analyze { text } => run_analyze(gateway, &settings, &text).await,
        Command::Batch { texts } => run_batch(gateway, &settings, texts).await,
        Command::Stats => run_stats(gateway).await,
        Command::Smoke => run_smoke(gateway, &settings).await,
    }
}

async fn require_online(gateway: Arc<dyn SentimentGateway>) -> Result<ConnectivityMonitor> {
    let monitor = ConnectivityMonitor::new(gateway);
    monitor.check().await;
    if !monitor.is_online().await {
        bail!("gateway is offline; start the service or point --server-url at it");
    }
    Ok(monitor)
}

async fn run_status(gateway: Arc<dyn SentimentGateway>) -> Result<()> {
    let monitor = ConnectivityMonitor::new(gateway);
    monitor.check().await;

    let status = monitor.status().await;
    println!("gateway: {status}");
    if let Some(model) = monitor.model_info().await {
        println!("model: {}", model.model_name);
        println!("task: {}", model.task.as_deref().unwrap_or("unknown"));
        println!("framework: {}", model.framework.as_deref().unwrap_or("unknown"));
        println!("device: {}", model.device.as_deref().unwrap_or("unknown"));
    }
    if status != ServerStatus::Online {
        bail!("the gateway did not pass its health probe");
    }
    Ok(())
}

async fn run_analyze(
    gateway: Arc<dyn SentimentGateway>,
    settings: &Settings,
    text: &str,
) -> Result<()> {
    require_online(gateway.clone()).await?;

    let session = AnalysisSession::with_options(gateway, session_options(settings));
    session.submit(text).await;

    let snapshot = session.snapshot().await;
    if let Some(error) = snapshot.error() {
        bail!("{error}");
    }
    match &snapshot.result {
        Some(result) => {
            print_result(result);
            Ok(())
        }
        None => bail!("the gateway returned no result"),
    }
}

async fn run_batch(
    gateway: Arc<dyn SentimentGateway>,
    settings: &Settings,
    texts: Vec<String>,
) -> Result<()> {
    require_online(gateway.clone()).await?;

    let session = BatchSession::with_preprocess(gateway, settings.preprocess);
    session.submit(&texts).await;

    let snapshot = session.snapshot().await;
    if let Some(error) = snapshot.error() {
        bail!("{error}");
    }
    print_batch_entries(&snapshot.results);
    if let Some(stats) = &snapshot.statistics {
        print_batch_statistics(stats);
    }
    Ok(())
}

async fn run_stats(gateway: Arc<dyn SentimentGateway>) -> Result<()> {
    let stats = gateway.service_stats().await?;
    if stats.total_analyzed == 0 {
        println!(
            "{}",
            stats
                .message
                .as_deref()
                .unwrap_or("no analyses recorded yet")
        );
        return Ok(());
    }
    println!("total analyzed: {}", stats.total_analyzed);
    println!("valid results: {}", stats.valid_results);
    println!("errors: {}", stats.errors);
    println!(
        "positive {} ({:.1}%), negative {} ({:.1}%), neutral {} ({:.1}%)",
        stats.sentiments.positive,
        stats.percentages.positive,
        stats.sentiments.negative,
        stats.percentages.negative,
        stats.sentiments.neutral,
        stats.percentages.neutral
    );
    println!(
        "average confidence: {:.1}%",
        stats.average_confidence * 100.0
    );
    println!("average stars: {:.1}", stats.average_stars);
    println!(
        "average processing time: {:.3}s",
        stats.average_processing_time
    );
    if let Some(last) = &stats.last_analysis {
        println!("last analysis: {last}");
    }
    Ok(())
}

async fn run_smoke(gateway: Arc<dyn SentimentGateway>, settings: &Settings) -> Result<()> {
    let monitor = require_online(gateway.clone()).await?;
    println!("gateway: online");
    if let Some(model) = monitor.model_info().await {
        println!("model: {}", model.model_name);
    }

    let session = AnalysisSession::with_options(gateway.clone(), session_options(settings));

    println!();
    println!("analyzing {} sample texts one at a time", SMOKE_TEXTS.len());
    for text in SMOKE_TEXTS {
        session.submit(text).await;
        let snapshot = session.snapshot().await;
        if let Some(error) = snapshot.error() {
            println!("  failed ({error})  {text}");
        } else if let Some(result) = &snapshot.result {
            println!(
                "  {} {} ({:.1}%)  {}",
                result.sentiment,
                result.emoji,
                result.confidence * 100.0,
                text
            );
        }
    }

    let snapshot = session.snapshot().await;
    println!();
    println!(
        "history after {} submissions (capacity {}):",
        SMOKE_TEXTS.len(),
        HISTORY_CAPACITY
    );
    for entry in &snapshot.history {
        println!(
            "  [{}] {} {}",
            entry.recorded_at.format("%H:%M:%S"),
            entry.result.sentiment,
            entry.result.text_original
        );
    }

    session.clear().await;
    let after = session.snapshot().await;
    println!();
    println!(
        "after clear: input and result reset, history has {} entries",
        after.history.len()
    );

    let texts: Vec<String> = SMOKE_BATCH.iter().map(|text| text.to_string()).collect();
    let batch = BatchSession::with_preprocess(gateway.clone(), settings.preprocess);
    println!();
    println!("analyzing a batch of {} texts", texts.len());
    batch.submit(&texts).await;
    let snapshot = batch.snapshot().await;
    if let Some(error) = snapshot.error() {
        bail!("{error}");
    }
    print_batch_entries(&snapshot.results);
    if let Some(stats) = &snapshot.statistics {
        print_batch_statistics(stats);
    }

    println!();
    println!("service statistics after this run:");
    run_stats(gateway).await
}

fn session_options(settings: &Settings) -> SessionOptions {
    SessionOptions {
        preprocess: settings.preprocess,
        clear_resets_history: settings.clear_resets_history,
    }
}

fn print_result(result: &SentimentResult) {
    println!(
        "sentiment: {} {} ({:.1}% confidence)",
        result.sentiment,
        result.emoji,
        result.confidence * 100.0
    );
    println!("stars: {}", "⭐".repeat(usize::from(result.stars)));
    println!("score: {:+.2}", result.sentiment_score);
    if result.text_truncated {
        println!("note: the text was truncated before analysis");
    }
    println!("took: {:.3}s", result.processing_time);
}

fn print_batch_entries(entries: &[BatchEntry]) {
    for (position, entry) in entries.iter().enumerate() {
        match entry {
            BatchEntry::Item(result) => println!(
                "{}. {} {} ({:.1}%)  {}",
                position + 1,
                result.sentiment,
                result.emoji,
                result.confidence * 100.0,
                result.text_original
            ),
            BatchEntry::Failed(failure) => {
                println!("{}. analysis failed: {}", position + 1, failure.error)
            }
        }
    }
}

fn print_batch_statistics(stats: &BatchStatistics) {
    println!();
    println!(
        "{} analyzed, {} valid, {} failed",
        stats.total, stats.valid, stats.errors
    );
    println!(
        "positive {} ({:.1}%), negative {} ({:.1}%), neutral {} ({:.1}%)",
        stats.sentiments.positive,
        stats.percentages.positive,
        stats.sentiments.negative,
        stats.percentages.negative,
        stats.sentiments.neutral,
        stats.percentages.neutral
    );
    println!(
        "average confidence {:.1}%",
        stats.average_confidence * 100.0
    );
}
