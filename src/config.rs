//! # config: read configuration from environment variables
//!
//! | Variable                  | Default        | Description                              |
//! |---------------------------|----------------|------------------------------------------|
//! | `BIND_ADDR`               | `0.0.0.0:3000` | Address Axum listens on                  |
//! | `DATA_DIR`                | `./data`       | Directory holding the key-value blobs    |
//! | `SCHEDULER_INTERVAL_SECS` | `15`           | Reminder polling period                  |
//! | `FOLLOWUP_LEAD_MINS`      | `5`            | Default delay for follow-up reminders    |
//! | `NOTIFICATION_PERMISSION` | `granted`      | `granted` / `denied` / `unsupported`     |
//! | `AI_PROVIDER`             | `claude`       | `claude` or `openai`                     |
//! | `AI_API_KEY`              | (unset)        | Bill parser key; extraction off if unset |
//! | `AI_TIMEOUT_SECS`         | `30`           | Per-request timeout for the bill parser  |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::notify::Permission;

/// Supported AI providers for bill extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Claude,
    OpenAi,
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiProvider::Claude => write!(f, "Claude"),
            AiProvider::OpenAi => write!(f, "OpenAI"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:               SocketAddr,
    pub data_dir:                PathBuf,
    /// Period of the reminder polling loop.
    pub scheduler_interval:      Duration,
    /// Delay used by `/api/balances/remind` when the request gives none.
    pub followup_lead:           chrono::Duration,
    /// What the notification gateway answers to a permission request.
    pub notification_permission: Permission,
    pub ai_provider:             AiProvider,
    /// `None` disables the extraction endpoint.
    pub ai_api_key:              Option<String>,
    pub ai_timeout:              Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:3000")
            .parse()
            .context("BIND_ADDR must be a socket address, e.g. 0.0.0.0:3000")?;

        let interval_secs: u64 = env_or("SCHEDULER_INTERVAL_SECS", "15")
            .parse()
            .context("SCHEDULER_INTERVAL_SECS must be a number")?;
        if interval_secs == 0 {
            bail!("SCHEDULER_INTERVAL_SECS must be at least 1");
        }

        let lead_mins: i64 = env_or("FOLLOWUP_LEAD_MINS", "5")
            .parse()
            .context("FOLLOWUP_LEAD_MINS must be a number")?;

        let followup_lead = chrono::Duration::try_minutes(lead_mins)
            .filter(|lead| *lead >= chrono::Duration::zero())
            .context("FOLLOWUP_LEAD_MINS must be a non-negative number of minutes within range")?;

        let ai_timeout_secs: u64 = env_or("AI_TIMEOUT_SECS", "30")
            .parse()
            .context("AI_TIMEOUT_SECS must be a number")?;

        let notification_permission = env_or("NOTIFICATION_PERMISSION", "granted")
            .parse::<Permission>()
            .map_err(anyhow::Error::msg)?;

        let ai_provider = match env_or("AI_PROVIDER", "claude").to_lowercase().as_str() {
            "claude" => AiProvider::Claude,
            "openai" => AiProvider::OpenAi,
            other => bail!("Unknown AI_PROVIDER: '{other}'. Use 'claude' or 'openai'"),
        };

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
            scheduler_interval: Duration::from_secs(interval_secs),
            followup_lead,
            notification_permission,
            ai_provider,
            ai_api_key: lookup("AI_API_KEY").filter(|k| !k.trim().is_empty()),
            ai_timeout: Duration::from_secs(ai_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.scheduler_interval, Duration::from_secs(15));
        assert_eq!(config.followup_lead, chrono::Duration::minutes(5));
        assert_eq!(config.ai_timeout, Duration::from_secs(30));
        assert_eq!(config.notification_permission, Permission::Granted);
        assert_eq!(config.ai_provider, AiProvider::Claude);
        assert!(config.ai_api_key.is_none());
    }

    #[test]
    fn malformed_timeout_is_an_error() {
        let err = config_with(&[("AI_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("AI_TIMEOUT_SECS"));
    }

    #[test]
    fn out_of_range_lead_is_an_error() {
        let err = config_with(&[("FOLLOWUP_LEAD_MINS", "9223372036854775807")]).unwrap_err();
        assert!(err.to_string().contains("FOLLOWUP_LEAD_MINS"));

        assert!(config_with(&[("FOLLOWUP_LEAD_MINS", "-5")]).is_err());
    }

    #[test]
    fn blank_api_key_disables_extraction() {
        let config = config_with(&[("AI_API_KEY", "  "), ("AI_PROVIDER", "OpenAI")]).unwrap();
        assert!(config.ai_api_key.is_none());
        assert_eq!(config.ai_provider, AiProvider::OpenAi);
    }
}
