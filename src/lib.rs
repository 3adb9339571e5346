pub mod cli;
pub mod core;
pub mod providers;
pub mod store;
pub mod view;

use crate::cli::convert::ConvertArgs;
use crate::cli::predict::PredictArgs;
use crate::core::alerts::AlertBook;
use crate::core::config::AppConfig;
use crate::core::market::MarketDataClient;
use crate::core::session::{SessionContext, SignupRequest};
use crate::providers::HttpMarketDataClient;
use crate::store::{DiskStore, KeyValueStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// fjall partition holding the login session and rate alerts.
pub const STATE_PARTITION: &str = "state";

pub enum AppCommand {
    Currencies {
        query: Option<String>,
    },
    Convert(ConvertArgs),
    Predict(PredictArgs),
    Login {
        email: String,
        password: Option<String>,
    },
    Signup {
        email: String,
        name: String,
        password: Option<String>,
        confirm_password: Option<String>,
    },
    Logout,
    Account,
    Pricing {
        predictions: Option<u32>,
        annual: bool,
    },
    Subscriptions,
    AlertAdd {
        base: Option<String>,
        target: Option<String>,
        threshold: f64,
        email: Option<String>,
    },
    AlertList,
    AlertRemove {
        number: usize,
    },
}

fn market_client(config: &AppConfig) -> Result<Arc<dyn MarketDataClient>> {
    Ok(Arc::new(HttpMarketDataClient::new(&config.api.base_url)?))
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    let data_path = config.data_path()?;
    Ok(Arc::new(DiskStore::open(&data_path, STATE_PARTITION)?))
}

async fn open_session(config: &AppConfig) -> Result<SessionContext> {
    SessionContext::init(open_store(config)?).await
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxcast starting");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Currencies { query } => cli::currencies::run(query.as_deref()),
        AppCommand::Convert(args) => {
            let alerts = match open_store(&config) {
                Ok(store) => Some(AlertBook::load(store).await?),
                Err(e) => {
                    warn!(error = %e, "Rate alerts unavailable");
                    None
                }
            };
            cli::convert::run(
                market_client(&config)?,
                &config.dashboard,
                args,
                alerts.as_ref(),
            )
            .await
        }
        AppCommand::Predict(args) => {
            cli::predict::run(market_client(&config)?, &config.predictions, args).await
        }
        AppCommand::Login { email, password } => {
            let password = cli::account::password_or_prompt(password, "Password: ")?;
            let session = open_session(&config).await?;
            cli::account::login(&session, &email, &password).await
        }
        AppCommand::Signup {
            email,
            name,
            password,
            confirm_password,
        } => {
            let password = cli::account::password_or_prompt(password, "Password: ")?;
            let confirm_password =
                cli::account::password_or_prompt(confirm_password, "Confirm password: ")?;
            let request = SignupRequest {
                email,
                name,
                password,
                confirm_password,
            };
            let session = open_session(&config).await?;
            cli::account::signup(&session, &request).await
        }
        AppCommand::Logout => {
            let session = open_session(&config).await?;
            cli::account::logout(&session).await
        }
        AppCommand::Account => {
            let session = open_session(&config).await?;
            cli::account::account(&session)
        }
        AppCommand::Pricing {
            predictions,
            annual,
        } => cli::plans::pricing(predictions, annual),
        AppCommand::Subscriptions => {
            let session = open_session(&config).await?;
            cli::plans::subscriptions(&session)
        }
        AppCommand::AlertAdd {
            base,
            target,
            threshold,
            email,
        } => {
            let pair = cli::currencies::select_pair(
                config.dashboard.pair(),
                base.as_deref(),
                target.as_deref(),
            )?;
            let store = open_store(&config)?;
            let session = SessionContext::init(Arc::clone(&store)).await?;
            let mut book = AlertBook::load(store).await?;
            cli::alerts::add(
                market_client(&config)?,
                &mut book,
                &session,
                &pair,
                threshold,
                email.as_deref(),
            )
            .await
        }
        AppCommand::AlertList => {
            let book = AlertBook::load(open_store(&config)?).await?;
            cli::alerts::list(&book)
        }
        AppCommand::AlertRemove { number } => {
            let mut book = AlertBook::load(open_store(&config)?).await?;
            cli::alerts::remove(&mut book, number).await
        }
    }
}
