// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Posture - External Security Posture Scanner
 * On-demand CLI: scan a domain now, or queue it for the worker
 *
 * (c) 2025 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use posture_scanner::config::AppConfig;
use posture_scanner::engine::ScanOrchestrator;
use posture_scanner::i18n::Language;
use posture_scanner::logging::init_tracing;
use posture_scanner::queue::{JobOptions, RedisQueue, ScanJob};
use posture_scanner::types::{CorrelationIds, ScanOutcome, ScanRequest, Severity};

/// Posture - external security posture scanner
#[derive(Parser)]
#[command(name = "posture")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Email authentication, TLS, header and port checks for a domain")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "POSTURE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a domain now and print the health score and findings
    Scan {
        domain: String,

        /// Language for finding text
        #[arg(short, long)]
        lang: Option<LanguageArg>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Queue a scan for the worker
    Submit {
        domain: String,

        /// Idempotency key; generated when omitted
        #[arg(long)]
        scan_id: Option<String>,

        #[arg(long)]
        asset_id: Option<String>,

        #[arg(long)]
        company_id: Option<String>,

        #[arg(long)]
        requester_id: Option<String>,

        #[arg(short, long)]
        lang: Option<LanguageArg>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LanguageArg {
    En,
    Es,
}

impl From<LanguageArg> for Language {
    fn from(lang: LanguageArg) -> Self {
        match lang {
            LanguageArg::En => Language::En,
            LanguageArg::Es => Language::Es,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.debug {
        config.observability.log_level = "debug".to_string();
    }
    init_tracing(&config.observability);

    match cli.command {
        Commands::Scan { domain, lang, json } => run_scan(&config, &domain, lang, json).await,
        Commands::Submit {
            domain,
            scan_id,
            asset_id,
            company_id,
            requester_id,
            lang,
        } => {
            let request = ScanRequest::new(
                scan_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                domain,
            )
            .with_correlation_ids(CorrelationIds {
                asset_id,
                company_id,
                requester_id,
            });
            let request = match lang {
                Some(lang) => request.with_language(lang.into()),
                None => request,
            };
            submit(&config, request).await
        }
    }
}

async fn run_scan(
    config: &AppConfig,
    domain: &str,
    lang: Option<LanguageArg>,
    json: bool,
) -> Result<()> {
    let language = lang.map(Language::from).unwrap_or(config.engine.language);
    let orchestrator = ScanOrchestrator::from_config(&config.engine)?;

    let outcome = orchestrator
        .run(domain, language)
        .await
        .with_context(|| format!("Scan of {} failed", domain))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

async fn submit(config: &AppConfig, request: ScanRequest) -> Result<()> {
    let queue = RedisQueue::new(&config.queue).await?;
    let job = ScanJob::new(request, JobOptions::from_config(&config.retry));
    queue.push_scan_job(&job).await?;

    info!(scan_id = %job.request.scan_id, domain = %job.request.domain, "Scan queued");
    println!("{}", job.request.scan_id);
    Ok(())
}

fn print_outcome(outcome: &ScanOutcome) {
    println!();
    println!("========================================================");
    println!("{}  health score {}/100", outcome.domain, outcome.health_score);
    println!("========================================================");

    for scanner in &outcome.scanners {
        match (&scanner.error, scanner.score) {
            (Some(error), _) => println!("  {:<18} FAILED  {}", scanner.scanner, error),
            (None, Some(score)) => println!(
                "  {:<18} {:>3}/100  {} findings  {}ms",
                scanner.scanner, score, scanner.findings, scanner.duration_ms
            ),
            (None, None) => println!("  {:<18} -", scanner.scanner),
        }
    }
    println!();

    let mut findings: Vec<_> = outcome.findings.iter().collect();
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));

    for finding in findings {
        let marker = match finding.severity {
            Severity::Critical => "[CRITICAL]",
            Severity::High => "[HIGH]    ",
            Severity::Medium => "[MEDIUM]  ",
            Severity::Low => "[LOW]     ",
        };
        println!("{} {} ({})", marker, finding.title, finding.category);
        println!("           {}", finding.description);
        println!("           -> {}", finding.recommendation);
    }

    println!();
    println!("Completed in {}ms", outcome.duration_ms);
}
