//! Inference — AI-industry research dashboard, driven from the command line.
//!
//! Run with: cargo run -p inference-agent -- <command>

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use inference_client::{with_backoff, BackendClient, ReportStore, SseProgressConnector};
use inference_common::{Document, DocumentType, WorkflowPhase};
use inference_config::Config;
use inference_workflow::{
    FilePendingStore, ReportOutcome, WorkflowController, WorkflowSettings, WorkflowState,
};

const USAGE: &str = "\
Usage: inference <command>

Commands:
  metrics                       financial metrics for tracked AI companies
  events                        upcoming and recent tech events
  news                          product news feed
  regulatory                    regulatory updates feed
  reports                       persisted reports, newest first
  analyze <title> <file> [type] run the research workflow on a document
                                (type: article | transcript, default article)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    if command == "help" {
        println!("{USAGE}");
        return Ok(());
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "no configuration found, using defaults");
            Config::default()
        }
    };

    let client = BackendClient::new(
        Some(&config.backend.base_url),
        Duration::from_secs(config.backend.timeout_secs),
    )?;

    match command {
        "metrics" => {
            let base = Duration::from_millis(config.retry.base_delay_ms);
            let metrics = with_backoff(config.retry.max_retries, base, || {
                client.financial_metrics()
            })
            .await?;
            for metric in metrics {
                println!(
                    "{:<6} {:<12} ${:>10.2} {:>+7.2}%  cap ${:>8.2}B  vol {:>8.2}M",
                    metric.symbol,
                    metric.name,
                    metric.price,
                    metric.change,
                    metric.market_cap / 1e9,
                    metric.volume / 1e6,
                );
            }
        }
        "events" => {
            for event in client.tech_events().await? {
                println!("{}  [{}] {}: {}", event.date, event.event_type, event.company, event.title);
            }
        }
        "news" => {
            for item in client.product_news().await? {
                println!("{}  [{}] {} {}: {}", item.date, item.category, item.company, item.product_name, item.title);
            }
        }
        "regulatory" => {
            for update in client.regulatory_updates().await? {
                println!("{}  [{}/{}] {}", update.date, update.region, update.impact_level, update.title);
            }
        }
        "reports" => {
            let url = config
                .store
                .url
                .clone()
                .context("store.url missing from configuration")?;
            let key = config
                .store
                .resolved_key()
                .context("store anon key missing (set store.anon_key or INFERENCE_STORE_KEY)")?;
            let store = ReportStore::new(&url, &key)?;
            for report in store.list_reports().await? {
                println!("{}  {}", report.created_at, report.title);
            }
        }
        "analyze" => {
            let title = args.get(2).context("missing <title>\n\nrun `inference help`")?;
            let path = args.get(3).context("missing <file>\n\nrun `inference help`")?;
            let doc_type = match args.get(4).map(String::as_str) {
                Some("transcript") => DocumentType::Transcript,
                _ => DocumentType::Article,
            };
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {path}"))?;
            let doc = Document::new(title, &content, doc_type, None, None)?;

            run_research(doc, client, &config).await?;
        }
        other => {
            eprintln!("unknown command: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Drive the full workflow: submit, interactive Q&A, report.
async fn run_research(doc: Document, client: BackendClient, config: &Config) -> anyhow::Result<()> {
    let connector = Arc::new(SseProgressConnector::new(&client.progress_url())?);
    let pending = Arc::new(FilePendingStore::new(&config.qa.pending_path));
    let controller = WorkflowController::new(
        WorkflowState::new(),
        Arc::new(client),
        connector,
        pending,
        WorkflowSettings::from(config),
    );

    if controller.resume_pending()?.is_some() {
        info!("resuming a question from a previous session");
    }

    // Mirror backend progress into the log while the upload runs.
    let progress_state = controller.state().clone();
    let progress_log = tokio::spawn(async move {
        let mut last = 0;
        loop {
            let progress = progress_state.progress();
            if progress != last {
                info!(progress, status = %progress_state.status(), "analysis progress");
                last = progress;
            }
            if progress >= 100 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    });

    let summary = controller.submit_document(doc).await?;
    progress_log.abort();

    println!("\n# {}\n\n{}\n", summary.title, summary.summary);
    if !summary.key_points.is_empty() {
        println!("Key points:");
        for point in &summary.key_points {
            println!("  - {point}");
        }
    }
    if !summary.entities.is_empty() {
        let names: Vec<String> = summary
            .entities
            .iter()
            .map(|e| format!("{} ({})", e.name, e.entity_type))
            .collect();
        println!("Entities: {}", names.join(", "));
    }

    controller.navigate(WorkflowPhase::Qa)?;
    println!("\nAsk questions about the document (empty line to finish):");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let question = line?;
        if question.trim().is_empty() {
            break;
        }

        let before = controller.state().qa_history().len();
        controller.ask(&question)?;
        loop {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let history = controller.state().qa_history();
            if history.len() > before {
                println!("\n{}\n", history[before].answer);
                break;
            }
            let status = controller.state().status();
            if status.starts_with("Error:") {
                eprintln!("{status}");
                break;
            }
        }
    }

    if controller.state().qa_history().is_empty() {
        info!("no questions asked, skipping report");
        return Ok(());
    }

    controller.navigate(WorkflowPhase::Report)?;
    match controller.generate_report().await? {
        Some(ReportOutcome::Inline(report)) => println!("\n# Executive Report\n\n{report}"),
        Some(ReportOutcome::ShowListing) => {
            println!("\nReport saved. Run `inference reports` to list persisted reports.")
        }
        None => {}
    }

    Ok(())
}
