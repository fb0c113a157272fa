use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sp_secret_audit::commands;
use sp_secret_audit::report::ReportFormat;

#[derive(Parser)]
#[command(name = "sp-secret-audit")]
#[command(about = "Azure service principal secret expiry audit", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan service principals for expiring secrets and certificates
    Scan {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: ReportFormat,

        /// Output file path (e.g., report.csv); format is inferred from the extension
        #[arg(short, long)]
        output: Option<String>,

        /// Only show expired or critical secrets (<= 30 days)
        #[arg(long)]
        critical_only: bool,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Microsoft Graph API root (defaults to GRAPH_API_URL or the public cloud)
        #[arg(long)]
        graph_url: Option<String>,

        /// Pre-acquired Graph bearer token (defaults to GRAPH_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },

    /// Generate shell completion scripts
    GenerateCompletion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            format,
            output,
            critical_only,
            verbose,
            graph_url,
            token,
        } => {
            init_logging(verbose);
            commands::scan::run(commands::scan::ScanOptions {
                format,
                output,
                critical_only,
                graph_url,
                token,
                show_progress: !verbose,
            })
            .await
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sp-secret-audit", &mut std::io::stdout());
            Ok(())
        }
    }
}
