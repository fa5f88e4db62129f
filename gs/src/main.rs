//! GuidedSession - staged meditation sessions
//!
//! CLI entry point for listing stages, running a session headlessly and
//! checking the content backend.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use guidedsession::audio::{AssetAmbient, TerminalSpeech};
use guidedsession::cli::{Cli, Command, OutputFormat, format_duration, get_log_path};
use guidedsession::config::Config;
use guidedsession::content::{ContentProvider, HttpContentClient, InsightService, OfflineContent};
use guidedsession::domain::{Stage, fallback_stages, total_duration_seconds, validate_stages};
use guidedsession::session::{Collaborators, SessionEvent, SessionHandle, SessionOptions, TokioClock};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(base_url = %config.api.base_url, "GuidedSession loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Stages { offline, format } => cmd_stages(&config, offline, format).await,
        Command::Run {
            offline,
            no_narration,
            no_ambient,
            reflect,
        } => cmd_run(&config, offline, no_narration, no_ambient, reflect).await,
        Command::Health { format } => cmd_health(&config, format).await,
    }
}

/// Content provider and insight service for the selected mode
fn build_content(config: &Config, offline: bool) -> Result<(Arc<dyn ContentProvider>, Arc<dyn InsightService>)> {
    debug!(offline, "build_content: called");
    if offline {
        let content: Arc<dyn ContentProvider> = Arc::new(OfflineContent);
        let insight: Arc<dyn InsightService> = Arc::new(OfflineContent);
        return Ok((content, insight));
    }
    let client = Arc::new(HttpContentClient::from_config(&config.api).context("Failed to create API client")?);
    let content: Arc<dyn ContentProvider> = client.clone();
    let insight: Arc<dyn InsightService> = client;
    Ok((content, insight))
}

async fn cmd_stages(config: &Config, offline: bool, format: OutputFormat) -> Result<()> {
    debug!(offline, ?format, "cmd_stages: called");
    let (content, _) = build_content(config, offline)?;

    let (stages, source) = match content.fetch_stages().await {
        Ok(stages) if validate_stages(&stages).is_ok() => (stages, "provider"),
        Ok(_) => {
            warn!("Provider returned an unusable stage list, showing fallback script");
            (fallback_stages(), "fallback")
        }
        Err(e) => {
            if !offline {
                warn!(error = %e, "Stage list fetch failed, showing fallback script");
            }
            (fallback_stages(), "fallback")
        }
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "source": source,
                "stages": stages,
                "total_duration": total_duration_seconds(&stages),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_stages(&stages, source),
    }
    Ok(())
}

fn print_stages(stages: &[Stage], source: &str) {
    println!("{} ({})", "Stages".bold(), source.dimmed());
    for (i, stage) in stages.iter().enumerate() {
        println!(
            "  {}. {:<14} {:>5}  {}",
            i + 1,
            stage.name.bold(),
            format_duration(stage.duration_seconds),
            stage.description.dimmed()
        );
    }
    println!("  Total: {}", format_duration(total_duration_seconds(stages)).cyan());
}

async fn cmd_run(
    config: &Config,
    offline: bool,
    no_narration: bool,
    no_ambient: bool,
    reflect: Option<String>,
) -> Result<()> {
    debug!(offline, no_narration, no_ambient, has_reflection = reflect.is_some(), "cmd_run: called");
    let (content, insight) = build_content(config, offline)?;

    let mut options = SessionOptions::from_config(config);
    options.narration_enabled &= !no_narration;
    options.ambient_enabled &= !no_ambient;

    let handle = SessionHandle::spawn(
        options,
        Collaborators {
            content,
            insight,
            speech: Some(Arc::new(TerminalSpeech)),
            ambient: Some(Arc::new(AssetAmbient::new(config.ambient.asset.clone()))),
            clock: Arc::new(TokioClock::new()),
        },
    );
    let mut events = handle.subscribe();

    handle.start().await?;
    let stages = handle.snapshot().await?.stages;
    println!(
        "{} {} stages, {}",
        "Session started:".green().bold(),
        stages.len(),
        format_duration(total_duration_seconds(&stages))
    );

    let completed = loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::SessionCompleted) => break true,
                Ok(event) => print_event(&event, &stages, &handle).await?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cmd_run: event receiver lagged");
                }
                Err(RecvError::Closed) => break false,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping session");
                println!("\n{}", "Session stopped.".yellow());
                handle.stop().await?;
                break false;
            }
        }
    };

    if completed {
        println!("{}", "Session complete.".green().bold());
        match reflect {
            Some(text) => {
                let insight = handle.submit_reflection(&text).await?;
                println!("{} {}", "Insight:".magenta().bold(), insight);
                handle.finish().await?;
            }
            None => handle.skip_reflection().await?,
        }
    }

    handle.shutdown().await?;
    Ok(())
}

async fn print_event(event: &SessionEvent, stages: &[Stage], handle: &SessionHandle) -> Result<()> {
    match event {
        SessionEvent::StageStarted { index, name, .. } => {
            let duration = stages.get(*index).map(|s| s.duration_seconds).unwrap_or_default();
            println!(
                "\n{} {} {}",
                format!("[{}/{}]", index + 1, stages.len()).cyan(),
                name.bold(),
                format!("({})", format_duration(duration)).dimmed()
            );
        }
        SessionEvent::StageContentReady { fallback: true, .. } => {
            println!("    {}", "(offline narration)".dimmed());
        }
        SessionEvent::StageCompleted { stage_id } => {
            let overall = handle.snapshot().await?.overall_progress;
            println!(
                "    {} {} {}",
                "done".green(),
                stage_id,
                format!("({:.0}% overall)", overall * 100.0).dimmed()
            );
        }
        _ => debug!(event_type = event.event_type(), "print_event: not rendered"),
    }
    Ok(())
}

async fn cmd_health(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_health: called");
    let client = HttpContentClient::from_config(&config.api).context("Failed to create API client")?;

    match client.health().await {
        Ok(health) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&health)?),
                OutputFormat::Text => {
                    println!("{} {} ({})", "Status:".bold(), health.status.green(), health.service);
                    println!(
                        "  {} stages, {}",
                        health.stages,
                        format_duration(health.total_duration)
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "Unreachable:".red().bold(), config.api.base_url);
            Err(e).context("Health check failed")
        }
    }
}

