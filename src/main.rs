use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use fxcast::cli::convert::ConvertArgs;
use fxcast::cli::predict::PredictArgs;
use fxcast::core::log::init_logging;

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
struct PairArgs {
    /// Currency to convert from, e.g. USD
    #[arg(short, long)]
    base: Option<String>,

    /// Currency to convert to, e.g. AUD
    #[arg(short, long)]
    target: Option<String>,

    /// Amount in the base currency
    #[arg(short, long)]
    amount: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List supported currencies, optionally filtered by code or name
    Currencies { query: Option<String> },
    /// Convert an amount at the live exchange rate and show market news
    Convert {
        #[command(flatten)]
        pair: PairArgs,

        /// Keep refreshing the rate until interrupted
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the exchange rate forecast for a currency pair
    Predict {
        #[command(flatten)]
        pair: PairArgs,

        /// Forecast model: auto, statistical or a backend model name
        #[arg(short, long)]
        model: Option<String>,

        /// Leave the historical backtest out of the rate card
        #[arg(long)]
        hide_history: bool,

        /// Include volatility, correlation and anomaly analysis
        #[arg(long)]
        analysis: bool,
    },
    /// Log in (any email, demo password "password")
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the logged in account
    Account,
    /// Show pricing tiers
    Pricing {
        /// Estimate the monthly bill for this many predictions
        #[arg(long)]
        predictions: Option<u32>,

        /// Show annual prices
        #[arg(long)]
        annual: bool,
    },
    /// Show subscription plans (requires login)
    Subscriptions,
    /// Manage exchange rate alerts
    Alerts {
        #[command(subcommand)]
        action: AlertCommands,
    },
}

#[derive(Subcommand)]
enum AlertCommands {
    /// Get notified when the rate reaches a threshold
    Add {
        /// Currency to convert from, e.g. USD
        #[arg(short, long)]
        base: Option<String>,

        /// Currency to convert to, e.g. AUD
        #[arg(short, long)]
        target: Option<String>,

        /// Rate to watch for
        #[arg(long)]
        threshold: f64,

        /// Address to notify, defaults to the logged in account
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List alerts
    List,
    /// Remove an alert by its number in `alerts list`
    Remove { number: usize },
}

impl From<Commands> for fxcast::AppCommand {
    fn from(cmd: Commands) -> fxcast::AppCommand {
        match cmd {
            Commands::Currencies { query } => fxcast::AppCommand::Currencies { query },
            Commands::Convert { pair, watch } => fxcast::AppCommand::Convert(ConvertArgs {
                base: pair.base,
                target: pair.target,
                amount: pair.amount,
                watch,
            }),
            Commands::Predict {
                pair,
                model,
                hide_history,
                analysis,
            } => fxcast::AppCommand::Predict(PredictArgs {
                base: pair.base,
                target: pair.target,
                amount: pair.amount,
                model,
                hide_history,
                analysis,
            }),
            Commands::Login { email, password } => fxcast::AppCommand::Login { email, password },
            Commands::Signup {
                email,
                name,
                password,
                confirm_password,
            } => fxcast::AppCommand::Signup {
                email,
                name,
                password,
                confirm_password,
            },
            Commands::Logout => fxcast::AppCommand::Logout,
            Commands::Account => fxcast::AppCommand::Account,
            Commands::Pricing {
                predictions,
                annual,
            } => fxcast::AppCommand::Pricing {
                predictions,
                annual,
            },
            Commands::Subscriptions => fxcast::AppCommand::Subscriptions,
            Commands::Alerts { action } => match action {
                AlertCommands::Add {
                    base,
                    target,
                    threshold,
                    email,
                } => fxcast::AppCommand::AlertAdd {
                    base,
                    target,
                    threshold,
                    email,
                },
                AlertCommands::List => fxcast::AppCommand::AlertList,
                AlertCommands::Remove { number } => fxcast::AppCommand::AlertRemove { number },
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxcast::cli::setup::setup(),
        Some(cmd) => fxcast::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
