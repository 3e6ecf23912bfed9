use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL the success/cancel redirects are built from.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    /// Pre-registered Stripe price for the page publish fee.
    pub publish_fee_price_id: Option<String>,
    /// Whole yen; what the publish fee price resolves to locally.
    #[serde(default = "default_publish_fee_amount")]
    pub publish_fee_amount: i64,
    /// Whole yen, billed as an ad-hoc line item at onboarding.
    #[serde(default = "default_onboarding_fee_amount")]
    pub onboarding_fee_amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub enabled: bool,
}

fn default_publish_fee_amount() -> i64 {
    3000
}

fn default_onboarding_fee_amount() -> i64 {
    1000
}

fn default_currency() -> String {
    "JPY".to_string()
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            publish_fee_price_id: None,
            publish_fee_amount: default_publish_fee_amount(),
            onboarding_fee_amount: default_onboarding_fee_amount(),
            currency: default_currency(),
            enabled: false,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("stripe.enabled", false)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with SHUGIBAKO__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("SHUGIBAKO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://shugibako.db".to_string(),
                max_connections: 10,
            },
            stripe: StripeConfig::default(),
        }
    }
}
