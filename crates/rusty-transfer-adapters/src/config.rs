use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use rusty_transfer_core::{Asset, RetryPolicy, TokenInfo};

const ENV_PREFIX: &str = "RUSTY_TRANSFER_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

impl FromStr for RuntimeProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeProfile::Development),
            "production" | "prod" => Ok(RuntimeProfile::Production),
            other => Err(format!("unknown runtime profile: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    /// EIP-1193 JSON-RPC endpoint of the wallet provider.
    pub eip1193_proxy_url: Option<String>,
    pub chain_id: u64,
    pub request_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_ms: u64,
    /// Etherscan-compatible `txlist` API.
    pub explorer_api_url: Option<String>,
    pub explorer_api_key: Option<String>,
    /// Web explorer used for transaction links.
    pub explorer_web_url: String,
    pub token: Option<TokenInfo>,
    pub history_retry: RetryPolicy,
    /// Deterministic wallet only: number of `eth_requestAccounts` calls that
    /// answer "pending approval" before succeeding.
    pub dev_pending_approvals: u32,
}

impl Default for TransferAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            eip1193_proxy_url: None,
            chain_id: 1,
            request_timeout_ms: 15_000,
            receipt_poll_interval_ms: 2_000,
            receipt_timeout_ms: 5 * 60 * 1000,
            explorer_api_url: None,
            explorer_api_key: None,
            explorer_web_url: "https://etherscan.io".to_owned(),
            token: None,
            history_retry: RetryPolicy::default(),
            dev_pending_approvals: 0,
        }
    }
}

impl TransferAdapterConfig {
    /// Read `RUSTY_TRANSFER_*` variables on top of the defaults.
    ///
    /// The profile defaults to production here so an unconfigured install
    /// reports a missing wallet instead of silently using the deterministic one.
    pub fn from_env() -> Self {
        let mut cfg = Self {
            runtime_profile: RuntimeProfile::Production,
            explorer_api_url: Some("https://api.etherscan.io/v2/api".to_owned()),
            ..Self::default()
        };

        if let Some(profile) = env_parse::<RuntimeProfile>("PROFILE") {
            cfg.runtime_profile = profile;
        }
        cfg.eip1193_proxy_url = env_string("WALLET_URL").or(cfg.eip1193_proxy_url);
        cfg.chain_id = env_parse("CHAIN_ID").unwrap_or(cfg.chain_id);
        cfg.request_timeout_ms = env_parse("REQUEST_TIMEOUT_MS").unwrap_or(cfg.request_timeout_ms);
        cfg.receipt_poll_interval_ms =
            env_parse("RECEIPT_POLL_MS").unwrap_or(cfg.receipt_poll_interval_ms);
        cfg.receipt_timeout_ms = env_parse("RECEIPT_TIMEOUT_MS").unwrap_or(cfg.receipt_timeout_ms);
        cfg.explorer_api_url = env_string("EXPLORER_API_URL").or(cfg.explorer_api_url);
        cfg.explorer_api_key = env_string("EXPLORER_API_KEY");
        cfg.explorer_web_url = env_string("EXPLORER_WEB_URL").unwrap_or(cfg.explorer_web_url);
        cfg.dev_pending_approvals =
            env_parse("DEV_PENDING_APPROVALS").unwrap_or(cfg.dev_pending_approvals);

        if let Some(address) = env_parse::<Address>("TOKEN_ADDRESS") {
            cfg.token = Some(TokenInfo {
                address,
                symbol: env_string("TOKEN_SYMBOL").unwrap_or_else(|| "TOKEN".to_owned()),
                decimals: env_parse("TOKEN_DECIMALS").unwrap_or(18),
            });
        }

        let retry = &mut cfg.history_retry;
        retry.max_attempts = env_parse("HISTORY_MAX_ATTEMPTS").unwrap_or(retry.max_attempts);
        if let Some(ms) = env_parse::<u64>("HISTORY_INITIAL_DELAY_MS") {
            retry.initial_delay = Duration::from_millis(ms);
        }
        retry.multiplier = env_parse("HISTORY_BACKOFF_MULTIPLIER").unwrap_or(retry.multiplier);
        if let Some(ms) = env_parse::<u64>("HISTORY_MAX_DELAY_MS") {
            retry.max_delay = Duration::from_millis(ms);
        }

        cfg
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    /// ETH first, then the configured token if any.
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets = vec![Asset::Ether];
        if let Some(token) = &self.token {
            assets.push(Asset::Token(token.clone()));
        }
        assets
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_web_url.trim_end_matches('/'), tx_hash)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env_string(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(var = %format!("{ENV_PREFIX}{name}"), value = %raw, error = %e, "ignoring invalid setting");
            None
        }
    }
}
