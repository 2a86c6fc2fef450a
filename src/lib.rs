#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde;

use chrono::Duration;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use secrecy::ExposeSecret;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::error::{BackendError, ConfigurationError};
use crate::payment::StripeClient;
use crate::resp::jwt::TokenIssuer;
use crate::route::mount_api;
use crate::store::Store;

pub mod config;
pub mod data;
pub mod error;
pub mod payment;
pub mod resp;
pub mod role;
pub mod route;
pub mod store;
pub mod util;

#[cfg(test)]
mod testing;

pub fn init_tracing(level: Level) {
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Unable to forward log records: {}", err);
    }

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global logger: {}", err);
    };
}

pub fn load_config() -> Result<Config, ConfigurationError> {
    tracing::info!("Loading configuration...");
    match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            Ok(c)
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            Ok(c)
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            Err(other)
        }
    }
}

pub async fn create(log_level: Option<Level>) -> Result<Rocket<Build>, BackendError> {
    if let Some(l) = log_level {
        init_tracing(l);
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    let c = load_config()?;

    if c.access_token_secret.expose_secret().is_empty() {
        tracing::warn!("ACCESS_TOKEN_SECRET is empty, issued tokens are trivially forgeable.");
    }
    if c.payment_secret_key.expose_secret().is_empty() {
        tracing::warn!("PAYMENT_SECRET_KEY is empty, payment intents will be rejected.");
    }

    let store = Store::connect(&c).await?;

    let tokens = TokenIssuer::new(
        c.access_token_secret.clone(),
        Duration::hours(c.token_lifetime_hours),
    );
    let stripe = StripeClient::new(
        c.payment_secret_key.clone(),
        c.payment_api_url.clone(),
        c.currency.clone(),
        payment::DEFAULT_TIMEOUT,
    )?;

    build(&c, store, tokens, stripe)
}

/// Assembles the Rocket instance from already constructed collaborators.
pub fn build(
    c: &Config,
    store: Store,
    tokens: TokenIssuer,
    stripe: StripeClient,
) -> Result<Rocket<Build>, BackendError> {
    tracing::info!("Starting HTTP server...");
    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", c.port))
        .merge(("log_level", "off"));

    let mut r = rocket::custom(figment)
        .manage(store)
        .manage(tokens)
        .manage(stripe);

    tracing::info!("Setting up CORS...");
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::All,
        allowed_methods: vec![
            Method::Get,
            Method::Put,
            Method::Post,
            Method::Patch,
            Method::Delete,
        ]
        .into_iter()
        .map(From::from)
        .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    r = r
        .attach(cors)
        .attach(AdHoc::on_liftoff("Liftoff log", |rocket| {
            Box::pin(async move {
                tracing::info!("EduElevate running on PORT : {}", rocket.config().port);
            })
        }))
        .attach(AdHoc::on_shutdown("MongoDB shutdown", |rocket| {
            Box::pin(async move {
                if let Some(store) = rocket.state::<Store>() {
                    store.clone().shutdown().await;
                }
            })
        }));

    Ok(mount_api(r))
}
