use anyhow::{Context, Result};
use std::env;

pub const SANDBOX_URL: &str = "https://sandbox.wompi.co/v1";
pub const PRODUCTION_URL: &str = "https://production.wompi.co/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    /// Webhook payloads carry `"prod"` for production; anything else is treated as sandbox.
    pub fn from_webhook(environment: Option<&str>) -> Self {
        match environment {
            Some("prod") => Environment::Production,
            _ => Environment::Sandbox,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_URL,
            Environment::Production => PRODUCTION_URL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    pub public_key: String,
    pub private_key: String,
    /// Shared secret used for webhook checksums.
    pub event_key: String,
}

#[derive(Debug, Clone)]
pub struct WompiConfig {
    pub use_sandbox: bool,
    pub sandbox: KeySet,
    pub production: KeySet,
    pub supported_currencies: Vec<String>,
    pub auto_capture: bool,
    pub base_url_override: Option<String>,
    pub host: String,
    pub port: u16,
}

impl WompiConfig {
    pub fn from_env() -> Result<Self> {
        let use_sandbox = env::var("WOMPI_USE_SANDBOX")
            .ok()
            .and_then(|value| parse_flag(&value))
            .unwrap_or(true);
        let sandbox = KeySet {
            public_key: env::var("WOMPI_SANDBOX_PUBLIC_KEY").unwrap_or_default(),
            private_key: env::var("WOMPI_SANDBOX_PRIVATE_KEY").unwrap_or_default(),
            event_key: env::var("WOMPI_SANDBOX_EVENT_KEY").unwrap_or_default(),
        };
        let production = KeySet {
            public_key: env::var("WOMPI_PUBLIC_KEY").unwrap_or_default(),
            private_key: env::var("WOMPI_PRIVATE_KEY").unwrap_or_default(),
            event_key: env::var("WOMPI_EVENT_KEY").unwrap_or_default(),
        };
        let supported_currencies = env::var("WOMPI_SUPPORTED_CURRENCIES")
            .map(|value| parse_currencies(&value))
            .unwrap_or_default();
        let auto_capture = env::var("WOMPI_AUTO_CAPTURE")
            .ok()
            .and_then(|value| parse_flag(&value))
            .unwrap_or(true);
        let base_url_override = env::var("WOMPI_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(value) => value.parse::<u16>().context("PORT must be a valid port number")?,
            Err(_) => 8087,
        };

        let config = Self {
            use_sandbox,
            sandbox,
            production,
            supported_currencies: if supported_currencies.is_empty() {
                vec!["COP".to_string()]
            } else {
                supported_currencies
            },
            auto_capture,
            base_url_override,
            host,
            port,
        };
        let active = config.active_keys();
        let prefix = if use_sandbox { "WOMPI_SANDBOX_" } else { "WOMPI_" };
        if active.public_key.is_empty() {
            anyhow::bail!("{prefix}PUBLIC_KEY must be set");
        }
        if active.private_key.is_empty() {
            anyhow::bail!("{prefix}PRIVATE_KEY must be set");
        }
        Ok(config)
    }

    pub fn environment(&self) -> Environment {
        if self.use_sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }

    pub fn keys(&self, environment: Environment) -> &KeySet {
        match environment {
            Environment::Sandbox => &self.sandbox,
            Environment::Production => &self.production,
        }
    }

    pub fn active_keys(&self) -> &KeySet {
        self.keys(self.environment())
    }

    pub fn base_url(&self) -> String {
        self.base_url_override
            .clone()
            .unwrap_or_else(|| self.environment().base_url().to_string())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_currencies(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|code| code.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .collect()
}
