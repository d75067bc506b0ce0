use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::bill_document::BillingTerms;
use crate::domain::models::shift::Shift;
use crate::domain::pricing::PriceTable;

pub const CONFIG_PATH_VAR: &str = "CAMP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "camp.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub max_entries: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { max_entries: 4 }
    }
}

/// SMTP settings; an empty `smtp_server` turns delivery into logging only
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_name: "Summer Camp".to_string(),
            from_address: "no-reply@example.com".to_string(),
        }
    }
}

impl MailConfig {
    pub fn is_enabled(&self) -> bool {
        !self.smtp_server.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: String,
    pub cors_origin: Option<String>,
    pub bills_dir: PathBuf,
    pub registration: RegistrationConfig,
    pub pricing: PriceTable,
    pub billing: BillingTerms,
    pub mail: MailConfig,
    pub shifts: Vec<Shift>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            database_url: "sqlite:camp.db".to_string(),
            cors_origin: None,
            bills_dir: PathBuf::from("data/bills"),
            registration: RegistrationConfig::default(),
            pricing: PriceTable::default(),
            billing: BillingTerms::default(),
            mail: MailConfig::default(),
            shifts: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load_config(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content).context("Failed to parse config TOML")?;

        if let Err(reason) = config.pricing.validate() {
            warn!("Invalid price table ({}), using default prices", reason);
            config.pricing = PriceTable::default();
        }
        if config.registration.max_entries == 0 {
            warn!("registration.max_entries must be positive, using default");
            config.registration = RegistrationConfig::default();
        }

        Ok(config)
    }

    pub fn load_config_or_default(config_path: &Path) -> Self {
        match Self::load_config(config_path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                config
            }
            Err(e) => {
                warn!("Failed to load config from {:?}: {:#}", config_path, e);
                info!("Using default configuration (mail delivery disabled)");
                Self::default()
            }
        }
    }

    /// Load from the file named by `CAMP_CONFIG`, falling back to `camp.toml`
    pub fn from_env() -> Self {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_config_or_default(Path::new(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml(
            r#"
            bind_address = "0.0.0.0:8080"
            database_url = "sqlite::memory:"
            bills_dir = "/tmp/bills"

            [registration]
            max_entries = 6

            [pricing]
            base_prices = [200, 300]
            seniority_discounts = [0, 30]
            fallback_price = 300

            [billing]
            booking_fee = 50

            [mail]
            smtp_server = "smtp.example.com"

            [[shifts]]
            shift_nr = 1
            start_date = "2025-06-09"
            boss_name = "Kati Kask"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.registration.max_entries, 6);
        assert_eq!(config.pricing.compute_price(2, true), Ok(270));
        assert_eq!(config.billing.booking_fee, 50);
        assert_eq!(config.billing.payment_days, 3);
        assert!(config.mail.is_enabled());
        assert_eq!(config.mail.smtp_port, 587);
        assert_eq!(config.shifts[0].start_date, NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        assert_eq!(config.shifts[0].length_days, 12);
    }

    #[test]
    fn test_inconsistent_prices_fall_back() {
        let config = AppConfig::from_toml(
            r#"
            [pricing]
            base_prices = [200, 300]
            seniority_discounts = [10]
            fallback_price = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.pricing, PriceTable::default());
        assert!(!config.mail.is_enabled());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_config_or_default(Path::new("/nonexistent/camp.toml"));
        assert_eq!(config.registration.max_entries, 4);
        assert_eq!(config.pricing, PriceTable::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = \"127.0.0.1:9999\"").unwrap();

        let config = AppConfig::load_config(file.path()).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9999");
        assert_eq!(config.billing.booking_fee, 100);
    }
}
