//! Gateway configuration, read from the environment

use di::inject;
use di::injectable;
use log::warn;
use std::env;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

static TEST_CONFIG: RwLock<Option<GatewayConfig>> = RwLock::new(None);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream credential. `None` keeps the gateway on the canned fallback.
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub bind_addr: String,
}

#[injectable]
impl GatewayConfig {
    #[inject]
    pub fn create() -> GatewayConfig {
        if let Some(config) = TEST_CONFIG.read().ok().and_then(|c| c.clone()) {
            return config;
        }

        dotenvy::dotenv().ok();
        GatewayConfig::from_env()
    }
}

impl GatewayConfig {
    /// Reads the process environment.
    ///
    /// | Variable                | Default                                  |
    /// |-------------------------|------------------------------------------|
    /// | `CLAUDE_API_KEY`        | `ANTHROPIC_API_KEY`, else unset          |
    /// | `CLAUDE_MODEL`          | `claude-3-sonnet-20240229`               |
    /// | `CLAUDE_MAX_TOKENS`     | `1000`                                   |
    /// | `UPSTREAM_URL`          | `https://api.anthropic.com/v1/messages`  |
    /// | `UPSTREAM_TIMEOUT_SECS` | `30`                                     |
    /// | `BIND_ADDR`             | `0.0.0.0:3000`                           |
    pub fn from_env() -> GatewayConfig {
        let api_key = env::var("CLAUDE_API_KEY")
            .or_else(|_| env::var("ANTHROPIC_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        GatewayConfig {
            api_key,
            model: env::var("CLAUDE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned()),
            max_tokens: parse_var("CLAUDE_MAX_TOKENS").unwrap_or(DEFAULT_MAX_TOKENS),
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_owned()),
            upstream_timeout: Duration::from_secs(
                parse_var("UPSTREAM_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned()),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Makes every subsequently created provider use `config` instead of the environment.
    pub fn set_test_config(config: GatewayConfig) {
        if let Ok(mut slot) = TEST_CONFIG.write() {
            *slot = Some(config);
        }
    }

    pub fn clear_test_config() {
        if let Ok(mut slot) = TEST_CONFIG.write() {
            *slot = None;
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            upstream_url: DEFAULT_UPSTREAM_URL.to_owned(),
            upstream_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match T::from_str(raw.trim()) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable {name}={raw}");
            None
        }
    }
}
