//! triage CLI: webhook server and operator commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use triage_rs::config::Config;
use triage_rs::engine::{Ack, Dispatcher};
use triage_rs::notify::{LogNotifier, Notifier, OutboxNotifier};
use triage_rs::report::ReportGenerator;
use triage_rs::rules::Outcome;
use triage_rs::store::{HttpIssueStore, IssueStore};
use triage_rs::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "triage", about = "Issue-tracker automation rules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook server
    Serve {
        /// Listen address, overrides LISTEN_ADDR
        #[arg(long)]
        listen: Option<String>,
    },
    /// Generate the issue report once and write it to a directory
    Report {
        /// Output directory for jira_report.csv and jira_report.json
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Dispatch a saved notification against the configured tracker
    Replay {
        /// JSON file holding one notification body
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "triage".to_string(),
        log_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Serve { listen } => cmd_serve(&config, listen).await,
        Command::Report { out } => cmd_report(&config, out).await,
        Command::Replay { file } => cmd_replay(&config, file).await,
    }
}

fn tracker(config: &Config) -> anyhow::Result<Arc<dyn IssueStore>> {
    Ok(Arc::new(HttpIssueStore::new(
        &config.tracker_url,
        &config.tracker_email,
        config.tracker_api_token.clone(),
    )?))
}

fn notifier(config: &Config) -> Arc<dyn Notifier> {
    match config.report_outbox {
        Some(ref dir) => Arc::new(OutboxNotifier::new(dir)),
        None => Arc::new(LogNotifier),
    }
}

fn dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    let rules = config.rules()?;
    Ok(Dispatcher::new(tracker(config)?, notifier(config), &rules))
}

async fn cmd_serve(config: &Config, listen: Option<String>) -> anyhow::Result<()> {
    let dispatcher = Arc::new(dispatcher(config)?);
    let addr = listen.unwrap_or_else(|| config.listen_addr.clone());
    triage_rs::server::serve(dispatcher, &addr, config.last_error_file.clone()).await?;
    Ok(())
}

async fn cmd_report(config: &Config, out: PathBuf) -> anyhow::Result<()> {
    let rules = config.rules()?;
    let store = tracker(config)?;
    let report = ReportGenerator::new(rules.report_page_size)
        .generate(store.as_ref())
        .await?;
    for path in report.write_to_dir(&out).await? {
        println!("Wrote {}", path.display());
    }
    println!("{} issue(s)", report.rows.len());
    Ok(())
}

async fn cmd_replay(config: &Config, file: PathBuf) -> anyhow::Result<()> {
    let body = tokio::fs::read(&file).await?;
    let ack = dispatcher(config)?.dispatch(&body).await?;

    let report = match ack {
        Ack::NoChanges => {
            println!("{}", ack.message());
            return Ok(());
        }
        Ack::Handled(report) => report,
    };

    println!("Dispatch:   {}", report.dispatch_id);
    println!("Issue:      {}", report.issue_id);
    println!("Event:      {}", report.kind);
    if report.runs.is_empty() {
        println!("No rules eligible.");
        return Ok(());
    }
    println!("{:<22}  {:<7}  DETAIL", "RULE", "RESULT");
    println!("{}", "-".repeat(60));
    for run in &report.runs {
        match &run.outcome {
            Outcome::Ok { writes } => {
                println!("{:<22}  {:<7}  {writes} write(s)", run.rule.name(), "ok");
            }
            Outcome::Failed { reason, retryable } => {
                let retry = if *retryable { " (retryable)" } else { "" };
                println!("{:<22}  {:<7}  {reason}{retry}", run.rule.name(), "failed");
            }
        }
    }
    Ok(())
}
