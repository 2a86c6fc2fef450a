use bson::oid::ObjectId;
use chrono::Duration;
use mongodb::Database;
use rocket::local::asynchronous::Client;
use secrecy::SecretString;

use crate::config::Config;
use crate::payment::{StripeClient, DEFAULT_TIMEOUT};
use crate::resp::jwt::TokenIssuer;
use crate::store::Store;

const TEST_TOKEN_SECRET: &str = "test-secret";
const TEST_PAYMENT_KEY: &str = "sk_test_123";

// Nothing listens here, payment routes only reach it when a test forgets a mock.
const UNUSED_PAYMENT_URL: &str = "http://127.0.0.1:9";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.access_token_secret = SecretString::new(TEST_TOKEN_SECRET.to_string());
    config.payment_secret_key = SecretString::new(TEST_PAYMENT_KEY.to_string());
    config
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(
        SecretString::new(TEST_TOKEN_SECRET.to_string()),
        Duration::hours(1),
    )
}

fn stripe(config: &Config, base_url: &str) -> StripeClient {
    StripeClient::new(
        config.payment_secret_key.clone(),
        base_url,
        config.currency.clone(),
        DEFAULT_TIMEOUT,
    )
    .expect("payment client")
}

async fn tracked(config: Config, store: Store, payment_url: &str) -> Client {
    let stripe = stripe(&config, payment_url);
    let rocket = crate::build(&config, store, token_issuer(), stripe).expect("rocket instance");

    Client::tracked(rocket)
        .await
        .expect("valid rocket instance")
}

/// Client whose store is never contacted unless a route touches MongoDB.
pub async fn client() -> Client {
    client_with_payments(UNUSED_PAYMENT_URL).await
}

pub async fn client_with_payments(payment_url: &str) -> Client {
    let config = test_config();
    let store = Store::open(&config).await.expect("mongodb client options");
    tracked(config, store, payment_url).await
}

/// Client backed by a reachable MongoDB server.
pub async fn db_client() -> Client {
    let config = test_config();
    let store = Store::connect(&config)
        .await
        .expect("running MongoDB instance");
    tracked(config, store, UNUSED_PAYMENT_URL).await
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@test.eduelevate", prefix, ObjectId::new().to_hex())
}

pub fn db(client: &Client) -> &Database {
    client
        .rocket()
        .state::<Store>()
        .expect("managed store")
}
