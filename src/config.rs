use std::env;

use thiserror::Error;

use crate::pricing::{CommissionRate, PricingError, DEFAULT_COMMISSION_RATE_BPS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Set SUPABASE_JWT_SECRET, or SUPABASE_URL and SUPABASE_ANON_KEY, to verify bearer tokens")]
    NoAuth,
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// How bearer tokens are verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSettings {
    Jwt { secret: String, audience: String },
    Remote { url: String, anon_key: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthSettings,
    pub commission_rate: CommissionRate,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match var("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => 8080,
        };

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let auth = match (var("SUPABASE_JWT_SECRET"), var("SUPABASE_URL"), var("SUPABASE_ANON_KEY")) {
            (Some(secret), _, _) => AuthSettings::Jwt {
                secret,
                audience: var("JWT_AUDIENCE").unwrap_or_else(|| "authenticated".to_string()),
            },
            (None, Some(url), Some(anon_key)) => AuthSettings::Remote { url, anon_key },
            _ => return Err(ConfigError::NoAuth),
        };

        let commission_bps = match var("COMMISSION_RATE_BPS") {
            Some(value) => value.parse::<u32>().map_err(|_| ConfigError::Invalid {
                key: "COMMISSION_RATE_BPS",
                value,
            })?,
            None => DEFAULT_COMMISSION_RATE_BPS,
        };
        let commission_rate = CommissionRate::from_bps(commission_bps)?;

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            database_url,
            auth,
            commission_rate,
            cors_allowed_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_with_minimal_environment() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/instaserve"),
            ("SUPABASE_JWT_SECRET", "secret"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.commission_rate.bps(), 1000);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(
            config.auth,
            AuthSettings::Jwt {
                secret: "secret".into(),
                audience: "authenticated".into()
            }
        );
    }

    #[test]
    fn remote_auth_selected_without_secret() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/instaserve"),
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:5173, https://instaserve.app"),
        ])
        .unwrap();

        assert!(matches!(config.auth, AuthSettings::Remote { .. }));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:5173".to_string(), "https://instaserve.app".to_string()]
        );
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = load(&[("SUPABASE_JWT_SECRET", "secret")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn missing_auth_is_an_error() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/instaserve")]).unwrap_err();
        assert!(matches!(err, ConfigError::NoAuth));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/instaserve"),
            ("SUPABASE_JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/instaserve"),
            ("SUPABASE_JWT_SECRET", "secret"),
            ("COMMISSION_RATE_BPS", "20000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Pricing(PricingError::InvalidCommissionRate(20000))));
    }
}
