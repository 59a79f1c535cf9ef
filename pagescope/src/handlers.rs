use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use pagescope_core::config::ConfigError;
use pagescope_core::report::{render_report, save_report};
use pagescope_core::{
    AnalysisResult, AnalyzeOptions, AnalyzerConfig, PageAnalyzer, ReportFormat, execute_analysis,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::server::build_app;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Probe settings given on the command line, applied over the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOverrides {
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub deadline_secs: Option<u64>,
}

impl ProbeOverrides {
    pub fn from_args(args: &ArgMatches) -> Self {
        Self {
            concurrency: args.get_one::<usize>("concurrency").copied(),
            timeout_secs: args.get_one::<u64>("timeout").copied(),
            deadline_secs: args.get_one::<u64>("deadline").copied(),
        }
    }
}

/// Load the config file (with `~` expanded) or fall back to defaults.
pub fn load_config(path: Option<&str>) -> Result<AnalyzerConfig, ConfigError> {
    match path {
        Some(path) => {
            let expanded = shellexpand::tilde(path);
            AnalyzerConfig::load(Some(Path::new(expanded.as_ref())))
        }
        None => AnalyzerConfig::load(None),
    }
}

pub fn apply_probe_overrides(
    mut config: AnalyzerConfig,
    overrides: ProbeOverrides,
) -> Result<AnalyzerConfig, ConfigError> {
    if let Some(concurrency) = overrides.concurrency {
        config.probe.concurrency = concurrency;
    }
    if let Some(timeout) = overrides.timeout_secs {
        config.probe.timeout_secs = Some(timeout);
    }
    if let Some(deadline) = overrides.deadline_secs {
        config.probe.deadline_secs = Some(deadline);
    }

    config.validate()?;
    Ok(config)
}

pub fn parse_report_format(format: &str) -> Result<ReportFormat, String> {
    ReportFormat::from_str(format).ok_or_else(|| {
        format!(
            "Unknown report format '{}' (expected text, json or markdown)",
            format
        )
    })
}

fn print_divider() {
    eprintln!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_summary(result: &AnalysisResult) {
    eprintln!(
        "{} {} internal, {} external, {} failed",
        "✓".green().bold(),
        result.links.internal.count.to_string().bright_white(),
        result.links.external.count.to_string().bright_white(),
        if result.links.failed.count > 0 {
            result.links.failed.count.to_string().red().bold()
        } else {
            result.links.failed.count.to_string().bright_white()
        }
    );
}

pub async fn handle_analyze(args: &ArgMatches, quiet: bool) -> Result<()> {
    let url = args
        .get_one::<Url>("url")
        .ok_or_else(|| anyhow!("--url must be provided"))?;
    let format = parse_report_format(
        args.get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )
    .map_err(|e| anyhow!(e))?;
    let output = args.get_one::<PathBuf>("output");

    let config = load_config(args.get_one::<String>("config").map(String::as_str))?;
    let config = apply_probe_overrides(config, ProbeOverrides::from_args(args))?;

    if !quiet {
        print_divider();
        eprintln!("{}", "  PAGESCOPE".bright_white().bold());
        print_divider();
        eprintln!("{} Target: {}", "→".blue(), url.as_str().bright_white());
        eprintln!(
            "{} Probe concurrency: {}",
            "→".blue(),
            config.probe.concurrency
        );
        if let Some(deadline) = config.probe.deadline_secs {
            eprintln!("{} Probe deadline: {}s", "→".blue(), deadline);
        }
        eprintln!();
    }

    let options = AnalyzeOptions {
        url: url.as_str().to_string(),
        config,
        show_progress_bars: !quiet,
    };

    let progress_callback = Arc::new(move |msg: String| {
        if !quiet {
            eprintln!("{}", msg);
        }
    });

    let result = execute_analysis(options, Some(progress_callback))
        .await
        .context("Analysis failed")?;

    if !quiet {
        print_summary(&result);
    }

    let report = render_report(&result, format).context("Failed to render report")?;

    match output {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", report),
    }

    Ok(())
}

pub async fn handle_serve(args: &ArgMatches) -> Result<()> {
    let bind = args
        .get_one::<String>("bind")
        .map(String::as_str)
        .unwrap_or(DEFAULT_BIND_ADDR);

    let config = load_config(args.get_one::<String>("config").map(String::as_str))?;
    let analyzer = PageAnalyzer::new(Arc::new(config)).context("Failed to build analyzer")?;
    let app = build_app(Arc::new(analyzer));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    info!("Starting server on {}", bind);
    info!("Health check: http://{}/health-check", bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
