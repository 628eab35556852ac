use crate::accounting::{ChargeSchedule, TaxPolicy};
use config::{Config, ConfigError, Environment};
use rdkafka::ClientConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AppSettings {
    /// Interval between instrument price refreshes. Zero disables the updater.
    #[serde(default)]
    pub price_refresh_seconds: u64,
    /// Exchange equity listing CSV to register instruments from at startup.
    #[serde(default)]
    pub instrument_listing: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: String,
    pub name: String,
    #[serde(default = "default_connections")]
    pub connections: usize,
}

fn default_connections() -> usize {
    4
}

impl Database {
    pub fn connection_string(&self) -> String {
        format!("{}/{}", self.url, self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct KafkaSettings {
    pub bootstrap_servers: String,
    pub security_protocol: String,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
    pub acks: Option<String>,
}

impl KafkaSettings {
    pub fn config<'a>(&self, config: &'a mut ClientConfig) -> &'a mut ClientConfig {
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("security.protocol", &self.security_protocol);
        if let (Some(username), Some(password)) = (&self.sasl_username, &self.sasl_password) {
            config
                .set("sasl.mechanisms", "PLAIN")
                .set("sasl.username", username)
                .set("sasl.password", password);
        }
        if let Some(acks) = &self.acks {
            config.set("acks", acks);
        }
        config
    }
}

#[derive(Debug, Deserialize)]
pub struct PricingSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
pub struct WebServerSettings {
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: AppSettings,
    pub database: Database,
    /// Events are discarded when unset.
    pub kafka: Option<KafkaSettings>,
    pub pricing: PricingSettings,
    pub webserver: WebServerSettings,
    #[serde(default)]
    pub charges: ChargeSchedule,
    #[serde(default)]
    pub tax: TaxPolicy,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut s = Config::new();
        s.merge(Environment::new().separator("__"))?;
        s.try_into()
    }
}
