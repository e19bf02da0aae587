// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cookiecrawler_runtime::cli;
use cookiecrawler_runtime::config::{parse_languages, CrawlOverrides};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cookiecrawler",
    about = "Cookiecrawler: inventory the cookies and localStorage a website sets",
    version,
    after_help = "Run 'cookiecrawler <command> --help' for details on each command."
)]
struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Suppress the progress bar and summary
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Visit every page of a sitemap and report cookies and localStorage
    Crawl {
        /// URL of the sitemap.xml (or sitemap index) to crawl
        sitemap_url: String,
        /// CSS selector of the consent banner's accept button
        #[arg(long = "consent")]
        consent: Option<String>,
        /// Number of pages in the first wave
        #[arg(long)]
        initial_chunk: Option<usize>,
        /// Comma-separated output languages (en, de)
        #[arg(long)]
        languages: Option<String>,
        /// Navigation timeout per page in milliseconds
        #[arg(long)]
        navigation_timeout: Option<u64>,
        /// Directory the JSON report is written to
        #[arg(long)]
        results_dir: Option<PathBuf>,
        /// Cookie metadata catalog (JSON)
        #[arg(long)]
        metadata: Option<PathBuf>,
        /// Visit failed pages once more after the main pass
        #[arg(long)]
        retry_failed: bool,
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    let result = match cli.command {
        Commands::Crawl {
            sitemap_url,
            consent,
            initial_chunk,
            languages,
            navigation_timeout,
            results_dir,
            metadata,
            retry_failed,
            config,
        } => match languages.as_deref().map(parse_languages).transpose() {
            Ok(languages) => {
                let overrides = CrawlOverrides {
                    config_file: config,
                    consent_selector: consent,
                    initial_chunk,
                    languages,
                    navigation_timeout_ms: navigation_timeout,
                    results_dir,
                    metadata,
                    retry_failed,
                };
                cli::crawl_cmd::run(&sitemap_url, overrides, cli.quiet).await
            }
            Err(e) => Err(e),
        },
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "cookiecrawler", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        if !cli.quiet {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
