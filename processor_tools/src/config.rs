use std::time::Duration;

use checkout_common::{helpers::env_parse, Secret};
use log::*;

const DEFAULT_PROCESSOR_TIMEOUT_SECS: u64 = 15;
const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Base URL of the Stripe API, without the `/v1` suffix
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.stripe.com".to_string(),
            secret_key: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_PROCESSOR_TIMEOUT_SECS),
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let default = Self::default();
        let api_url = std::env::var("CHK_STRIPE_API_URL").unwrap_or_else(|_| {
            debug!("CHK_STRIPE_API_URL not set, using {}", default.api_url);
            default.api_url
        });
        let secret_key = Secret::new(std::env::var("CHK_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("CHK_STRIPE_SECRET_KEY not set. Card payments will fail.");
            String::default()
        }));
        let timeout = processor_timeout();
        Self { api_url, secret_key, timeout }
    }
}

#[derive(Debug, Clone)]
pub struct BtcPayConfig {
    /// Greenfield API root, e.g. `https://btcpay.example.com/api/v1`
    pub url: String,
    pub store_id: String,
    pub api_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for BtcPayConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:23001/api/v1".to_string(),
            store_id: String::default(),
            api_key: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_PROCESSOR_TIMEOUT_SECS),
        }
    }
}

impl BtcPayConfig {
    pub fn new_from_env_or_default() -> Self {
        let default = Self::default();
        let url = std::env::var("CHK_BTCPAY_URL").unwrap_or_else(|_| {
            warn!("CHK_BTCPAY_URL not set, using (probably useless) default {}", default.url);
            default.url
        });
        let store_id = std::env::var("CHK_BTCPAY_STORE_ID").unwrap_or_else(|_| {
            warn!("CHK_BTCPAY_STORE_ID not set. Crypto invoices will fail.");
            String::default()
        });
        let api_key = Secret::new(std::env::var("CHK_BTCPAY_API_KEY").unwrap_or_else(|_| {
            warn!("CHK_BTCPAY_API_KEY not set. Crypto invoices will fail.");
            String::default()
        }));
        let timeout = processor_timeout();
        Self { url, store_id, api_key, timeout }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: Secret<String>,
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            bot_token: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_NOTIFICATION_TIMEOUT_SECS),
        }
    }
}

impl TelegramConfig {
    pub fn new_from_env_or_default() -> Self {
        let default = Self::default();
        let api_url = std::env::var("CHK_TELEGRAM_API_URL").unwrap_or(default.api_url);
        let bot_token = Secret::new(std::env::var("CHK_TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| {
            warn!("CHK_TELEGRAM_BOT_TOKEN not set. Chat notifications will fail.");
            String::default()
        }));
        let timeout = Duration::from_secs(
            env_parse::<u64>("CHK_NOTIFICATION_TIMEOUT_SECS").unwrap_or(DEFAULT_NOTIFICATION_TIMEOUT_SECS),
        );
        Self { api_url, bot_token, timeout }
    }
}

fn processor_timeout() -> Duration {
    Duration::from_secs(env_parse::<u64>("CHK_PROCESSOR_TIMEOUT_SECS").unwrap_or(DEFAULT_PROCESSOR_TIMEOUT_SECS))
}
