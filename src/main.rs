use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logo_verify::analysis::ImagePayload;
use logo_verify::clients::{GeminiClient, LogoAnalyzer, ReportClient};
use logo_verify::config::{Config, DEFAULT_LOG_FILTER, load_env_file};
use logo_verify::report::{SeverityTier, render_text};
use logo_verify::session::AnalysisSession;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Logo brand identification and authenticity checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (browser UI plus JSON API)
    Serve,
    /// Analyze a local logo image and print the report
    Analyze {
        /// Path to a png, jpg, webp, gif, heic or heif file
        path: PathBuf,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Submit a suspicious-logo report after the analysis
        #[arg(long)]
        report: bool,

        /// Base URL of a running logo-verify server used for --report
        #[arg(long, default_value = "http://127.0.0.1:8787")]
        server: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG may come from .env, so load it before the subscriber
    load_env_file();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Serve => {
            info!("Starting logo-verify server");
            logo_verify::http::start_http_server(Arc::new(config)).await?;
        }
        Command::Analyze {
            path,
            json,
            report,
            server,
        } => analyze(&config, path, json, report, &server).await?,
    }

    Ok(())
}

async fn analyze(config: &Config, path: PathBuf, json: bool, report: bool, server: &str) -> Result<()> {
    let analyzer = GeminiClient::from_config(config)?;

    let mut session = AnalysisSession::new();
    session.select_image(ImagePayload::from_path(&path)?);

    let image = session.begin_analysis()?;
    let result = match analyzer.analyze(&image).await {
        Ok(result) => result,
        Err(e) => {
            session.fail_analysis(e.to_string());
            anyhow::bail!("Failed to analyze {}: {}", path.display(), e);
        }
    };
    let analysis_report = session.complete_analysis(result);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis_report)?);
    } else {
        print!("{}", render_text(&analysis_report));
    }

    if !report {
        if analysis_report.verdict.tier == SeverityTier::Suspicious {
            eprintln!("\nRe-run with --report to submit this logo as suspicious.");
        }
        return Ok(());
    }

    let client = ReportClient::new(server)?;
    let (analysis, image) = session.begin_submission()?;
    match client.submit(&analysis, &image).await {
        Ok(report_id) => {
            session.complete_submission(report_id.clone());
            println!("\nReport submitted: {}", report_id);
            Ok(())
        }
        Err(e) => {
            session.fail_submission(e.to_string());
            Err(e).context("Failed to submit the report")
        }
    }
}
