use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use stockdash::cli::show::RenderOptions;
use stockdash::core::log::init_logging;

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

#[derive(clap::Args)]
struct RenderArgs {
    /// Write Plotly chart files and an HTML page into this directory
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Show the latest fundamental statements after the ratios
    #[arg(short, long)]
    fundamentals: bool,
}

impl From<RenderArgs> for RenderOptions {
    fn from(args: RenderArgs) -> RenderOptions {
        RenderOptions {
            export_dir: args.export,
            show_fundamentals: args.fundamentals,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the dashboard for one ticker
    Show {
        /// Stock ticker symbol
        #[arg(default_value = stockdash::core::dashboard::DEFAULT_TICKER)]
        ticker: String,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Prompt for ticker symbols and display a dashboard for each
    Interactive {
        #[command(flatten)]
        render: RenderArgs,
    },
}

impl From<Commands> for stockdash::AppCommand {
    fn from(cmd: Commands) -> stockdash::AppCommand {
        match cmd {
            Commands::Show { ticker, render } => stockdash::AppCommand::Show {
                ticker,
                options: render.into(),
            },
            Commands::Interactive { render } => stockdash::AppCommand::Interactive(render.into()),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => stockdash::cli::setup::setup(),
        Some(cmd) => stockdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
