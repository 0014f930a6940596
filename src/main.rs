use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight::report::ExportFormat;
use finsight::types::AnalysisKind;

/// Parse an analysis kind from string
fn parse_kind(s: &str) -> Result<AnalysisKind, String> {
    s.parse()
}

/// Parse an export format from string
fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse()
}

#[derive(Parser)]
#[command(name = "finsight")]
#[command(
    version,
    about = "AI-powered financial report analysis and export pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, clean, and run a single analysis on a report
    Analyze {
        #[arg(help = "Document to analyze (PDF or image)")]
        file: Option<PathBuf>,

        #[arg(long, short, value_parser = parse_kind, default_value = "summary",
              help = "Analysis kind: summary, kpis, thematic")]
        kind: AnalysisKind,

        #[arg(long, help = "Theme for thematic analysis (see `finsight themes`)")]
        theme: Option<String>,

        #[arg(long, help = "Use the built-in sample report instead of OCR")]
        demo: bool,

        #[arg(long = "show-text", help = "Print the cleaned text and stop (no model call)")]
        show_text: bool,

        #[arg(long = "raw", requires = "show_text", help = "Also print the raw OCR text")]
        show_raw: bool,
    },

    /// Build a custom multi-section report and export it
    Report {
        #[arg(help = "Document to analyze (PDF or image)")]
        file: Option<PathBuf>,

        #[arg(
            long,
            short,
            help = "Ordered sections: e.g. \"summary,kpis,theme:Revenue & Growth\""
        )]
        sections: Option<String>,

        #[arg(long, help = "Include the summary, KPIs, and every built-in theme")]
        all: bool,

        #[arg(long, short, value_parser = parse_format, default_value = "md",
              help = "Export format: md, docx, pdf")]
        format: ExportFormat,

        #[arg(long, short, help = "Output file path")]
        output: Option<PathBuf>,

        #[arg(long, help = "Use the built-in sample report instead of OCR")]
        demo: bool,
    },

    /// List the built-in thematic analysis catalog
    Themes,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the merged configuration (credentials masked)
    Show,
    /// Show configuration file paths
    Path,
    /// Write a starter project config file
    Init {
        #[arg(long, short, help = "Overwrite an existing config file")]
        force: bool,
    },
}

fn main() -> ExitCode {
    // .env is optional; missing files are not an error
    dotenvy::dotenv().ok();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            if let Some(finsight_err) = e.downcast_ref::<finsight::FinsightError>() {
                eprintln!("\x1b[33mHint:\x1b[0m {}", finsight_err.remediation());
            }
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            kind,
            theme,
            demo,
            show_text,
            show_raw,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(finsight::cli::commands::analyze::run(
                finsight::cli::commands::analyze::AnalyzeOptions {
                    file,
                    kind,
                    theme,
                    demo,
                    show_text,
                    show_raw,
                },
            ))?;
        }
        Commands::Report {
            file,
            sections,
            all,
            format,
            output,
            demo,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(finsight::cli::commands::report::run(
                finsight::cli::commands::report::ReportOptions {
                    file,
                    sections,
                    all,
                    format,
                    output,
                    demo,
                },
            ))?;
        }
        Commands::Themes => {
            finsight::cli::commands::themes::run()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => finsight::cli::commands::config_cmd::show()?,
            ConfigAction::Path => finsight::cli::commands::config_cmd::path()?,
            ConfigAction::Init { force } => finsight::cli::commands::config_cmd::init(force)?,
        },
    }

    Ok(())
}
