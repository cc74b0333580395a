use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::api::coingecko::CoinGeckoClient;
use crate::utils::{Backoff, ConfigurationError};

// ------------------------------------------------------------
// Root settings
// ------------------------------------------------------------
//
// Built once at process start from the environment (after `.env`
// has been loaded) and passed by reference into every stage.
//
#[derive(Debug, Clone)]
pub struct Settings {
    pub price_source: PriceSourceSettings,
    pub warehouse: WarehouseSettings,
    pub collector: CollectorSettings,
    /// Smallest remaining API call count that still allows a run
    pub quota_min_remaining: u64,
    /// Size of the ranked asset universe
    pub asset_limit: u32,
}

#[derive(Clone)]
pub struct PriceSourceSettings {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Clone)]
pub struct WarehouseSettings {
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Compute target tag; recorded on every warehouse session log line
    pub compute: String,
    /// Apply `migrations/create_tables.sql` before the run
    pub apply_schema: bool,
}

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub failure_policy: FailurePolicy,
}

/// What the Collector does when the price source cannot be reached at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the sweep and let the whole-call retry restart it from the first asset
    RestartSweep,
    /// Record the asset as failed and carry on with the next one
    IsolateAsset,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "restart-sweep" => Ok(FailurePolicy::RestartSweep),
            "isolate-asset" => Ok(FailurePolicy::IsolateAsset),
            other => Err(format!(
                "unknown policy '{}', expected restart-sweep or isolate-asset",
                other
            )),
        }
    }
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            batch_size: 30,
            batch_pause: Duration::from_secs(2),
            max_attempts: 3,
            backoff: Backoff::new(Duration::from_secs(4), Duration::from_secs(10)),
            failure_policy: FailurePolicy::RestartSweep,
        }
    }
}

pub const DEFAULT_QUOTA_MIN_REMAINING: u64 = 1000;
pub const DEFAULT_ASSET_LIMIT: u32 = 200;

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; every missing required name is reported at once
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            get(name).unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        let api_key = required("COINGECKO_PRO_API_KEY");
        let account = required("WAREHOUSE_ACCOUNT");
        let username = required("WAREHOUSE_USERNAME");
        let password = required("WAREHOUSE_PASSWORD");
        let database = required("WAREHOUSE_DATABASE");
        let compute = required("WAREHOUSE_COMPUTE");

        if !missing.is_empty() {
            return Err(ConfigurationError::Missing(missing));
        }

        let (host, port) = parse_account(&account)?;
        let defaults = CollectorSettings::default();

        let batch_size: usize = optional(&get, "COLLECTOR_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            return Err(invalid("COLLECTOR_BATCH_SIZE", "0", "must be at least 1"));
        }
        let max_attempts: u32 = optional(&get, "COLLECTOR_MAX_ATTEMPTS", defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(invalid("COLLECTOR_MAX_ATTEMPTS", "0", "must be at least 1"));
        }

        let batch_pause: u64 =
            optional(&get, "COLLECTOR_BATCH_PAUSE_SECS", defaults.batch_pause.as_secs())?;
        let backoff_min: u64 =
            optional(&get, "COLLECTOR_BACKOFF_MIN_SECS", defaults.backoff.min.as_secs())?;
        let backoff_max: u64 =
            optional(&get, "COLLECTOR_BACKOFF_MAX_SECS", defaults.backoff.max.as_secs())?;

        Ok(Settings {
            price_source: PriceSourceSettings {
                api_key,
                base_url: get("COINGECKO_BASE_URL")
                    .unwrap_or_else(|| CoinGeckoClient::DEFAULT_BASE_URL.to_string()),
            },
            warehouse: WarehouseSettings {
                host,
                port,
                username,
                password,
                database,
                compute,
                apply_schema: optional(&get, "WAREHOUSE_APPLY_SCHEMA", false)?,
            },
            collector: CollectorSettings {
                batch_size,
                batch_pause: Duration::from_secs(batch_pause),
                max_attempts,
                backoff: Backoff::new(
                    Duration::from_secs(backoff_min),
                    Duration::from_secs(backoff_max),
                ),
                failure_policy: optional(&get, "COLLECTOR_FAILURE_POLICY", defaults.failure_policy)?,
            },
            quota_min_remaining: optional(&get, "QUOTA_MIN_REMAINING", DEFAULT_QUOTA_MIN_REMAINING)?,
            asset_limit: optional(&get, "ASSET_UNIVERSE_LIMIT", DEFAULT_ASSET_LIMIT)?,
        })
    }
}

fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn optional<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigurationError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &raw, e.to_string())),
        None => Ok(default),
    }
}

/// `host`, `host:port`, `[v6addr]` or `[v6addr]:port`. IPv6 literals must be bracketed.
fn parse_account(account: &str) -> Result<(String, Option<u16>), ConfigurationError> {
    let trimmed = account.trim();
    let port = |raw: &str| {
        raw.parse::<u16>()
            .map_err(|_| invalid("WAREHOUSE_ACCOUNT", account, "port must be a number"))
    };

    if let Some(rest) = trimmed.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| invalid("WAREHOUSE_ACCOUNT", account, "missing closing ']'"))?;
        return match tail {
            "" => Ok((host.to_string(), None)),
            _ => match tail.strip_prefix(':') {
                Some(raw) => Ok((host.to_string(), Some(port(raw)?))),
                None => Err(invalid("WAREHOUSE_ACCOUNT", account, "expected ':' after ']'")),
            },
        };
    }

    match trimmed.split_once(':') {
        None => Ok((trimmed.to_string(), None)),
        Some((_, raw)) if raw.contains(':') => Err(invalid(
            "WAREHOUSE_ACCOUNT",
            account,
            "IPv6 hosts must be bracketed, e.g. [::1]:3306",
        )),
        Some((host, raw)) => Ok((host.to_string(), Some(port(raw)?))),
    }
}

impl fmt::Debug for PriceSourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceSourceSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl fmt::Debug for WarehouseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("compute", &self.compute)
            .field("apply_schema", &self.apply_schema)
            .finish()
    }
}
