use std::{env, time::Duration};

use checkout_common::{
    helpers::{env_flag, env_parse},
    Secret,
    CARD_CURRENCY_CODE,
    SHOP_CURRENCY_CODE,
};
use checkout_engine::checkout_objects::{CheckoutOptions, PricingPolicy, TransitionPolicy};
use log::*;
use processor_tools::{BtcPayConfig, StripeConfig, TelegramConfig};

use crate::notifications::NotificationSettings;

const DEFAULT_CHK_HOST: &str = "127.0.0.1";
const DEFAULT_CHK_PORT: u16 = 8360;
const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";
const DEFAULT_INVOICE_DESCRIPTION: &str = "Shop order";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_RECONCILE_AFTER_MINS: i64 = 30;
const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

pub const BTCPAY_SIGNATURE_HEADER: &str = "BTCPay-Sig";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Base URL of the storefront. Payers are sent back to `{client_url}/pending?orderId=...` after paying.
    pub client_url: String,
    pub shop_currency: String,
    pub card_currency: String,
    pub invoice_description: String,
    /// If true, webhook events overwrite the order status unconditionally. **Not recommended**
    pub lenient_transitions: bool,
    /// If true, item prices are taken from the product catalog rather than from the client.
    pub verify_prices: bool,
    /// Capacity of each event handler's channel.
    pub event_buffer_size: usize,
    /// How often the reconciliation worker polls for stale invoice orders.
    pub reconcile_interval: Duration,
    /// How long an invoice order may sit in `processing` before the reconciliation worker checks on it.
    pub reconcile_after: chrono::Duration,
    pub notification_timeout: Duration,
    pub stripe: StripeConfig,
    pub btcpay: BtcPayConfig,
    pub webhook: WebhookConfig,
    pub telegram: TelegramConfig,
    pub notifications: NotificationSettings,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// The secret BTCPay signs webhook deliveries with
    pub secret: Secret<String>,
    /// If false, webhook signatures are not checked. **DANGER**
    pub hmac_checks: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { secret: Secret::default(), hmac_checks: true }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHK_HOST.to_string(),
            port: DEFAULT_CHK_PORT,
            database_url: String::default(),
            client_url: DEFAULT_CLIENT_URL.to_string(),
            shop_currency: SHOP_CURRENCY_CODE.to_string(),
            card_currency: CARD_CURRENCY_CODE.to_string(),
            invoice_description: DEFAULT_INVOICE_DESCRIPTION.to_string(),
            lenient_transitions: false,
            verify_prices: false,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            reconcile_after: chrono::Duration::minutes(DEFAULT_RECONCILE_AFTER_MINS),
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT,
            stripe: StripeConfig::default(),
            btcpay: BtcPayConfig::default(),
            webhook: WebhookConfig::default(),
            telegram: TelegramConfig::default(),
            notifications: NotificationSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CHK_HOST").ok().unwrap_or_else(|| DEFAULT_CHK_HOST.into());
        let port = env::var("CHK_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CHK_PORT. {e} Using the default, {DEFAULT_CHK_PORT}, instead."
                    );
                    DEFAULT_CHK_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHK_PORT);
        let database_url = env::var("CHK_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CHK_DATABASE_URL is not set. Please set it to the URL for the checkout database.");
            String::default()
        });
        let client_url = env::var("CHK_CLIENT_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CHK_CLIENT_URL is not set. Payers will be redirected to {DEFAULT_CLIENT_URL}.");
            DEFAULT_CLIENT_URL.into()
        });
        let shop_currency = env::var("CHK_SHOP_CURRENCY").unwrap_or_else(|_| SHOP_CURRENCY_CODE.into());
        let card_currency = env::var("CHK_CARD_CURRENCY").unwrap_or_else(|_| CARD_CURRENCY_CODE.into());
        let invoice_description =
            env::var("CHK_INVOICE_DESCRIPTION").unwrap_or_else(|_| DEFAULT_INVOICE_DESCRIPTION.into());
        let lenient_transitions = env_flag("CHK_LENIENT_TRANSITIONS", false);
        if lenient_transitions {
            warn!(
                "🚨️ CHK_LENIENT_TRANSITIONS is set. Webhook events will overwrite completed and canceled orders. Do \
                 not run production like this."
            );
        }
        let verify_prices = env_flag("CHK_VERIFY_PRICES", false);
        let event_buffer_size = env_parse::<usize>("CHK_EVENT_BUFFER_SIZE").unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let (reconcile_interval, reconcile_after) = configure_reconciliation();
        let notification_timeout = env_parse::<u64>("CHK_NOTIFICATION_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_NOTIFICATION_TIMEOUT);
        let webhook = WebhookConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            client_url,
            shop_currency,
            card_currency,
            invoice_description,
            lenient_transitions,
            verify_prices,
            event_buffer_size,
            reconcile_interval,
            reconcile_after,
            notification_timeout,
            stripe: StripeConfig::new_from_env_or_default(),
            btcpay: BtcPayConfig::new_from_env_or_default(),
            webhook,
            telegram: TelegramConfig::new_from_env_or_default(),
            notifications: NotificationSettings::from_env_or_default(),
        }
    }

    /// The subset of the configuration that drives the checkout workflow.
    pub fn checkout_options(&self) -> CheckoutOptions {
        CheckoutOptions {
            client_url: self.client_url.clone(),
            shop_currency: self.shop_currency.clone(),
            card_currency: self.card_currency.clone(),
            invoice_description: self.invoice_description.clone(),
            transition_policy: if self.lenient_transitions {
                TransitionPolicy::Lenient
            } else {
                TransitionPolicy::Strict
            },
            pricing_policy: if self.verify_prices { PricingPolicy::Catalog } else { PricingPolicy::ClientSupplied },
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("CHK_BTCPAY_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ CHK_BTCPAY_WEBHOOK_SECRET is not set. Please set it to the secret of the BTCPay webhook, or every \
                 webhook delivery will be rejected."
            );
            String::default()
        });
        let hmac_checks = env_flag("CHK_BTCPAY_HMAC_CHECKS", true);
        if !hmac_checks {
            warn!("🚨️ Webhook signature checks are disabled. Anyone can mark invoice orders as paid. 🚨️");
        }
        Self { secret: Secret::new(secret), hmac_checks }
    }
}

fn configure_reconciliation() -> (Duration, chrono::Duration) {
    let interval = env::var("CHK_RECONCILE_INTERVAL_SECS")
        .map_err(|_| {
            info!(
                "🪛️ CHK_RECONCILE_INTERVAL_SECS is not set. Using the default value of {} s.",
                DEFAULT_RECONCILE_INTERVAL.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for CHK_RECONCILE_INTERVAL_SECS. {e}"))
        })
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(DEFAULT_RECONCILE_INTERVAL);
    let after = env::var("CHK_RECONCILE_AFTER_MINS")
        .map_err(|_| {
            info!(
                "🪛️ CHK_RECONCILE_AFTER_MINS is not set. Using the default value of {DEFAULT_RECONCILE_AFTER_MINS} mins."
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(chrono::Duration::minutes)
                .map_err(|e| warn!("🪛️ Invalid configuration value for CHK_RECONCILE_AFTER_MINS. {e}"))
        })
        .ok()
        .unwrap_or_else(|| chrono::Duration::minutes(DEFAULT_RECONCILE_AFTER_MINS));
    (interval, after)
}
