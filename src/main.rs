use anyhow::Result;
use clap::Parser;
use defectbench::score::HarnessReport;
use defectbench::taxonomy::CategoryMap;
use defectbench::{config, corpus, harness, output};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "defectbench",
    about = "Static-analysis benchmark harness — score C/C++ analyzers against a defect-seeded corpus"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run every configured analyzer over a corpus and score it
    Run {
        /// Corpus root directory
        corpus: PathBuf,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// Write the JSON report here instead of stdout
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also render an HTML scoreboard to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a corpus and print its ground-truth expectations as JSON
    Expectations {
        /// Corpus root directory
        corpus: PathBuf,

        /// Path to config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },

    /// Render an HTML scoreboard from a saved JSON report (no tool runs)
    Render {
        /// Path to a report JSON produced by `run --json`
        report: PathBuf,

        /// Output path for the HTML scoreboard
        #[arg(short, long, default_value = "defectbench-report.html")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "defectbench=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            corpus,
            config,
            json,
            output,
        } => {
            let cfg = config::Config::load(&config)?;
            cfg.validate()?;

            // Ctrl-C cancels in-flight analyzers; partial results still score.
            let (cancel_tx, cancel_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, cancelling analyzer runs");
                    let _ = cancel_tx.send(true);
                }
            });

            let report = harness::run(&corpus, &cfg, &cancel_rx).await?;
            emit_report(&report, json, output)
        }
        Command::Expectations { corpus, config } => {
            let cfg = config::Config::load(&config).unwrap_or_default();
            let categories = CategoryMap::new(cfg.category_rules.clone());
            let loaded = corpus::load(&corpus, &cfg.corpus, &categories)?;
            let json = serde_json::to_string_pretty(&loaded)?;
            println!("{json}");
            Ok(())
        }
        Command::Render { report, output } => {
            let report: HarnessReport =
                serde_json::from_str(&std::fs::read_to_string(&report)?)?;
            write_html(&report, &output)
        }
    }
}

fn emit_report(
    report: &HarnessReport,
    json_path: Option<PathBuf>,
    html_path: Option<PathBuf>,
) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match json_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &json)?;
            println!(
                "Report written: {} ({} fixtures, {} tools)",
                path.display(),
                report.total_fixtures,
                report.tools.len()
            );
        }
        None => println!("{json}"),
    }
    if let Some(path) = html_path {
        write_html(report, &path)?;
    }
    Ok(())
}

fn write_html(report: &HarnessReport, path: &PathBuf) -> Result<()> {
    let html = output::render_score_report(report)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &html)?;
    println!(
        "Scoreboard rendered: {} ({} tools)",
        path.display(),
        report.tools.len()
    );
    Ok(())
}
