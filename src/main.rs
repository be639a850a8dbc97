use clap::{CommandFactory, Parser, Subcommand};
use coinconv::cli::convert::{ConvertArgs, OutputFormat};
use coinconv::core::log::init_logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging and detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount from one currency to another, e.g. `convert 123.45 USD BTC`
    Convert {
        /// Amount to convert (must be > 0)
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Source currency symbol (e.g. USD, BTC)
        from: String,
        /// Target currency symbol (e.g. EUR, ETH)
        to: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinconv::cli::setup::setup(),
        Some(Commands::Convert {
            amount,
            from,
            to,
            json,
        }) => {
            let format = match (json, cli.verbose) {
                (true, _) => OutputFormat::Json,
                (false, true) => OutputFormat::Detailed,
                (false, false) => OutputFormat::Plain,
            };
            let args = ConvertArgs {
                amount,
                from,
                to,
                format,
            };
            coinconv::run_command(
                coinconv::AppCommand::Convert(args),
                cli.config_path.as_deref(),
            )
            .await
        }
        None => Cli::command().print_help().map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Application failed");
            coinconv::cli::present_error(&e);
            ExitCode::FAILURE
        }
    }
}
