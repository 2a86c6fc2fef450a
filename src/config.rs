use crate::error::ConfigurationError;
use crate::util;
use secrecy::SecretString;
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_mongodb_uri() -> String {
    env::var("MONGODB_URI").unwrap_or("mongodb://localhost:27017".to_string())
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("eduElevate".to_string())
}

fn default_db_user() -> Option<String> {
    env::var("DB_USER").ok()
}

fn default_db_pass() -> Option<SecretString> {
    env::var("DB_PASS").ok().map(SecretString::new)
}

fn default_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|it| it.parse().ok())
        .unwrap_or(5000)
}

fn default_access_token_secret() -> SecretString {
    SecretString::new(env::var("ACCESS_TOKEN_SECRET").unwrap_or_default())
}

fn default_token_lifetime_hours() -> i64 {
    1
}

fn default_payment_secret_key() -> SecretString {
    SecretString::new(env::var("PAYMENT_SECRET_KEY").unwrap_or_default())
}

fn default_payment_api_url() -> String {
    env::var("PAYMENT_API_URL").unwrap_or("https://api.stripe.com".to_string())
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Server settings, read from `settings.yml` with environment fallbacks.
///
/// Secrets are only ever read from the environment (or the file), they are
/// never written back by [`Config::save`].
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,
    #[serde(default = "default_db_user", skip_serializing)]
    pub db_user: Option<String>,
    #[serde(default = "default_db_pass", skip_serializing)]
    pub db_pass: Option<SecretString>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_access_token_secret", skip_serializing)]
    pub access_token_secret: SecretString,
    #[serde(default = "default_token_lifetime_hours")]
    pub token_lifetime_hours: i64,

    #[serde(default = "default_payment_secret_key", skip_serializing)]
    pub payment_secret_key: SecretString,
    #[serde(default = "default_payment_api_url")]
    pub payment_api_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            db_user: default_db_user(),
            db_pass: default_db_pass(),
            port: default_port(),
            access_token_secret: default_access_token_secret(),
            token_lifetime_hours: default_token_lifetime_hours(),
            payment_secret_key: default_payment_secret_key(),
            payment_api_url: default_payment_api_url(),
            currency: default_currency(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        Self::load_from(config_dir())
    }

    /// Reads the settings file in `dir`, then applies environment overrides.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Config, ConfigurationError> {
        let dir = dir.as_ref();
        let config_file =
            util::find_first_subpath(dir, &["settings.yml", "settings.yaml"], Path::exists)
                .ok_or_else(|| ConfigurationError::NotFound(dir.to_path_buf()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;
        config.apply_env();

        Ok(config)
    }

    /// Environment variables take precedence over values stored in the file.
    fn apply_env(&mut self) {
        if let Ok(uri) = env::var("MONGODB_URI") {
            self.mongodb_uri = uri;
        }
        if let Ok(db) = env::var("MONGODB_DB_NAME") {
            self.mongodb_db = db;
        }
        if let Ok(user) = env::var("DB_USER") {
            self.db_user = Some(user);
        }
        if let Ok(pass) = env::var("DB_PASS") {
            self.db_pass = Some(SecretString::new(pass));
        }
        match env::var("PORT").map(|it| it.parse::<u16>()) {
            Ok(Ok(port)) => self.port = port,
            Ok(Err(_)) => tracing::warn!("Ignoring PORT, it isn't a valid port number."),
            Err(_) => {}
        }
        if let Ok(secret) = env::var("ACCESS_TOKEN_SECRET") {
            self.access_token_secret = SecretString::new(secret);
        }
        if let Ok(key) = env::var("PAYMENT_SECRET_KEY") {
            self.payment_secret_key = SecretString::new(key);
        }
        if let Ok(url) = env::var("PAYMENT_API_URL") {
            self.payment_api_url = url;
        }
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(dir) = self.file_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn yaml_fields_override_defaults() {
        let config: Config = serde_yaml::from_str(
            "mongodb_uri: mongodb://db.internal:27017\nport: 8080\ncurrency: eur\n",
        )
        .expect("valid settings yaml");

        assert_eq!(config.mongodb_uri, "mongodb://db.internal:27017");
        assert_eq!(config.port, 8080);
        assert_eq!(config.currency, "eur");
        assert_eq!(config.token_lifetime_hours, 1);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = Config::default();
        config.access_token_secret = SecretString::new("very-secret".to_string());
        config.payment_secret_key = SecretString::new("sk_test_secret".to_string());

        let yaml = serde_yaml::to_string(&config).expect("config must serialize");

        assert!(!yaml.contains("very-secret"));
        assert!(!yaml.contains("sk_test_secret"));
        assert!(!yaml.contains("access_token_secret"));
        assert_eq!(config.access_token_secret.expose_secret(), "very-secret");
    }

    #[test]
    fn environment_beats_saved_settings() {
        let dir = env::temp_dir().join(format!("eduelevate-config-{}", uuid::Uuid::new_v4()));
        let mut generated = Config::default();
        generated.file_path = dir.join("settings.yml");
        generated.port = 5000;
        generated.save().expect("generated settings are saved");

        let saved = fs::read_to_string(&generated.file_path).expect("settings file");
        assert!(saved.contains("port: 5000"));

        env::set_var("PORT", "8080");
        let reloaded = Config::load_from(&dir);
        env::remove_var("PORT");
        fs::remove_dir_all(&dir).expect("remove temporary config dir");

        let reloaded = reloaded.expect("saved settings load");
        assert_eq!(reloaded.port, 8080);
        assert_eq!(reloaded.file_path, generated.file_path);
    }
}
