use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use crate::{
    config::StripeConfig,
    data_objects::{PaymentIntent, StripeErrorResponse},
    rest::{build_client, send_request},
    ProcessorApiError,
};

/// A minimal client for the Stripe PaymentIntents API.
#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, ProcessorApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| ProcessorApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        let client = build_client(Client::builder().default_headers(headers), config.timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Creates a payment intent with automatic payment methods enabled. The user id is stored in the intent metadata.
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        user_id: &str,
    ) -> Result<PaymentIntent, ProcessorApiError> {
        let amount = amount.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("metadata[userId]", user_id),
            ("automatic_payment_methods[enabled]", "true"),
        ];
        debug!("💳️ Creating payment intent for {amount} {currency}");
        let req = self.client.post(self.url("/payment_intents")).form(&params);
        let intent: PaymentIntent = send_request(req, stripe_error_message).await?;
        info!("💳️ Payment intent {} created", intent.id);
        Ok(intent)
    }

    pub async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorApiError> {
        trace!("💳️ Fetching payment intent {intent_id}");
        let req = self.client.get(self.url(&format!("/payment_intents/{intent_id}")));
        send_request(req, stripe_error_message).await
    }

    pub async fn confirm_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorApiError> {
        debug!("💳️ Confirming payment intent {intent_id}");
        let req = self.client.post(self.url(&format!("/payment_intents/{intent_id}/confirm")));
        send_request(req, stripe_error_message).await
    }
}

fn stripe_error_message(body: &str) -> String {
    match serde_json::from_str::<StripeErrorResponse>(body) {
        Ok(StripeErrorResponse { error }) => match (error.message, error.code) {
            (Some(msg), Some(code)) => format!("{msg} ({code})"),
            (Some(msg), None) => msg,
            (None, Some(code)) => code,
            (None, None) => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
