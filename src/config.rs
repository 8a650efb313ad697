use crate::error::{BadEnvVarSnafu, ParseEnvNumberSnafu, VaxResult};
use dotenvy::var;
use secrecy::SecretString;
use snafu::ResultExt;
use std::{sync::Arc, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    api_base_url: Arc<str>,
    server_ip: Arc<str>,
    admin: Arc<AdminConfig>,
    cache_stale_after: Duration,
    session_idle_days: i64,
}

impl RuntimeConfiguration {
    pub fn new() -> VaxResult<Self> {
        Ok(Self {
            api_base_url: optional_env_var("VAXPORT_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .into(),
            server_ip: optional_env_var("VAXPORT_SERVER_IP")
                .unwrap_or_else(|| DEFAULT_SERVER_IP.to_string())
                .into(),
            admin: Arc::new(AdminConfig::new()?),
            cache_stale_after: Duration::from_secs(numeric_env_var("VAXPORT_CACHE_STALE_SECS", 30)?),
            session_idle_days: numeric_env_var("VAXPORT_SESSION_IDLE_DAYS", 1)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests(admin: AdminConfig) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            server_ip: DEFAULT_SERVER_IP.into(),
            admin: Arc::new(admin),
            cache_stale_after: Duration::from_secs(30),
            session_idle_days: 1,
        }
    }

    #[cfg(test)]
    pub fn with_cache_stale_after(mut self, stale_after: Duration) -> Self {
        self.cache_stale_after = stale_after;
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub fn admin(&self) -> Arc<AdminConfig> {
        self.admin.clone()
    }

    pub const fn cache_stale_after(&self) -> Duration {
        self.cache_stale_after
    }

    pub const fn session_idle_days(&self) -> i64 {
        self.session_idle_days
    }
}

/// The single administrator allowed into the portal.
#[derive(Debug)]
pub struct AdminConfig {
    pub username: String,
    pub bcrypt_hashed_password: SecretString,
}

impl AdminConfig {
    pub fn new() -> VaxResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            username: get_env_var("VAXPORT_ADMIN_USERNAME")?,
            bcrypt_hashed_password: SecretString::from(get_env_var("VAXPORT_ADMIN_PASSWORD_HASH")?),
        })
    }
}

fn optional_env_var(name: &'static str) -> Option<String> {
    match var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            info!(name, "env var not set, using default");
            None
        }
    }
}

fn numeric_env_var<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    name: &'static str,
    default: T,
) -> VaxResult<T> {
    optional_env_var(name).map_or(Ok(default), |value| {
        value.trim().parse().context(ParseEnvNumberSnafu { name })
    })
}
