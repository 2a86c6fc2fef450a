use std::ops::Deref;

use bson::doc;
use mongodb::options::{ClientOptions, Credential, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use secrecy::ExposeSecret;

use crate::config::Config;
use crate::data::user::{User, USER_COLLECTION_NAME};

/// Process wide MongoDB handle.
///
/// Created once in [`crate::create`], handed to Rocket as managed state and
/// shut down by the shutdown fairing.
#[derive(Debug, Clone)]
pub struct Store {
    client: Client,
    db: Database,
}

impl Store {
    async fn client_options(c: &Config) -> mongodb::error::Result<ClientOptions> {
        let mut options = ClientOptions::parse(c.mongodb_uri.as_str()).await?;
        options.app_name = Some("eduelevate-backend".to_string());

        if let Some(user) = &c.db_user {
            let mut credential = Credential::default();
            credential.username = Some(user.clone());
            credential.password = c.db_pass.as_ref().map(|it| it.expose_secret().clone());
            options.credential = Some(credential);
        }

        Ok(options)
    }

    /// Builds the client without contacting the server.
    pub async fn open(c: &Config) -> mongodb::error::Result<Store> {
        let client = Client::with_options(Self::client_options(c).await?)?;
        let db = client.database(c.mongodb_db.as_str());

        Ok(Store { client, db })
    }

    /// Opens the store, checks the server is reachable and ensures indexes.
    pub async fn connect(c: &Config) -> mongodb::error::Result<Store> {
        tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
        let store = Self::open(c).await?;

        tracing::info!("Using MongoDB database: {}", c.mongodb_db);
        store.db.run_command(doc! { "ping": 1 }, None).await?;

        store.ensure_indexes().await?;
        Ok(store)
    }

    pub async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        tracing::info!("Ensuring unique user email index...");
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.db
            .collection::<User>(USER_COLLECTION_NAME)
            .create_index(index, None)
            .await?;

        Ok(())
    }

    pub async fn shutdown(self) {
        tracing::info!("Closing MongoDB connections...");
        self.client.shutdown().await;
    }
}

impl Deref for Store {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}
