use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use wbdash::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SelectionArgs {
    /// Country codes to include, e.g. AFG,IND (default: all configured)
    #[arg(short = 'C', long, value_delimiter = ',')]
    countries: Vec<String>,

    /// First year to include (default: configured start_year)
    #[arg(long)]
    from: Option<i32>,

    /// Last year to include (default: configured end_year)
    #[arg(long)]
    to: Option<i32>,
}

impl From<SelectionArgs> for wbdash::Selection {
    fn from(args: SelectionArgs) -> wbdash::Selection {
        wbdash::Selection {
            countries: args.countries,
            from: args.from,
            to: args.to,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display summary, per-metric series, scatter view and data table
    Dashboard {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Rows of the data table to show (default: 10)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Display the filtered data table
    Table {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Show only the first N rows (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Display summary metrics
    Summary(SelectionArgs),
    /// Export the filtered data as CSV
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = cli.config_path.as_deref();
    let result = match cli.command {
        Some(Commands::Setup) => match config_path {
            Some(path) => wbdash::cli::setup::setup_at_path(path),
            None => wbdash::cli::setup::setup(),
        },
        Some(Commands::Dashboard { selection, limit }) => {
            wbdash::run_command(
                wbdash::AppCommand::Dashboard { limit },
                &selection.into(),
                config_path,
            )
            .await
        }
        Some(Commands::Table { selection, limit }) => {
            wbdash::run_command(
                wbdash::AppCommand::Table { limit },
                &selection.into(),
                config_path,
            )
            .await
        }
        Some(Commands::Summary(selection)) => {
            wbdash::run_command(wbdash::AppCommand::Summary, &selection.into(), config_path).await
        }
        Some(Commands::Export { selection, output }) => {
            wbdash::run_command(
                wbdash::AppCommand::Export { output },
                &selection.into(),
                config_path,
            )
            .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
