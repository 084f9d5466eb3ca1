use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::client::{ClientOptions, DEFAULT_TIMEOUT};
use crate::error::ConfigError;
use crate::evaluation::EvaluationContext;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub sdk_key: String,
    pub environment: String,
    pub timeout_ms: u64,
    pub cache_ttl_secs: Option<u64>,
    pub serve_stale: bool,
    pub coalesce: bool,
    pub default_value: bool,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv().is_ok();

        let vars: HashMap<String, String> = env::vars()
            .filter(|(key, _)| key.starts_with("FLAGS_"))
            .collect();

        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).filter(|v| !v.is_empty()).cloned();

        let base_url = get("FLAGS_BASE_URL").ok_or(ConfigError::Missing("FLAGS_BASE_URL"))?;
        let sdk_key = get("FLAGS_SDK_KEY").ok_or(ConfigError::Missing("FLAGS_SDK_KEY"))?;

        let timeout_ms = parse(vars, "FLAGS_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_TIMEOUT.as_millis() as u64);
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "FLAGS_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            base_url,
            sdk_key,
            environment: get("FLAGS_ENVIRONMENT").unwrap_or_else(|| "production".to_string()),
            timeout_ms,
            cache_ttl_secs: parse(vars, "FLAGS_CACHE_TTL_SECS")?,
            serve_stale: parse(vars, "FLAGS_SERVE_STALE")?.unwrap_or(true),
            coalesce: parse(vars, "FLAGS_COALESCE")?.unwrap_or(true),
            default_value: parse(vars, "FLAGS_DEFAULT")?.unwrap_or(false),
            user_id: get("FLAGS_USER_ID"),
            user_email: get("FLAGS_USER_EMAIL"),
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::default()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_serve_stale(self.serve_stale)
            .with_coalescing(self.coalesce)
            .with_default_value(self.default_value);

        match self.cache_ttl_secs {
            Some(secs) if secs > 0 => options.with_cache_ttl(Duration::from_secs(secs)),
            _ => options,
        }
    }

    pub fn context(&self) -> EvaluationContext {
        EvaluationContext {
            user_id: self.user_id.clone(),
            user_email: self.user_email.clone(),
            custom_attributes: HashMap::new(),
        }
    }
}

fn parse<T>(vars: &HashMap<String, String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(None),
    }
}
