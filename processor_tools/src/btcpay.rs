use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use crate::{
    config::BtcPayConfig,
    data_objects::{BtcPayErrorResponse, BtcPayInvoice, NewBtcPayInvoice},
    rest::{build_client, send_request},
    ProcessorApiError,
};

/// A minimal client for the BTCPay Server Greenfield invoices API.
#[derive(Clone)]
pub struct BtcPayApi {
    config: BtcPayConfig,
    client: Arc<Client>,
}

impl BtcPayApi {
    pub fn new(config: BtcPayConfig) -> Result<Self, ProcessorApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let val = HeaderValue::from_str(&format!("token {}", config.api_key.reveal()))
            .map_err(|e| ProcessorApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        let client = build_client(Client::builder().default_headers(headers), config.timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/stores/{}{path}", self.config.url.trim_end_matches('/'), self.config.store_id)
    }

    pub async fn create_invoice(&self, invoice: NewBtcPayInvoice) -> Result<BtcPayInvoice, ProcessorApiError> {
        debug!("🧾️ Creating invoice for order [{}] ({} {})", invoice.metadata.order_id, invoice.amount, invoice.currency);
        let req = self.client.post(self.url("/invoices")).json(&invoice);
        let result: BtcPayInvoice = send_request(req, btcpay_error_message).await?;
        info!("🧾️ Invoice {} created for order [{}]", result.id, invoice.metadata.order_id);
        Ok(result)
    }

    pub async fn get_invoice(&self, invoice_id: &str) -> Result<BtcPayInvoice, ProcessorApiError> {
        trace!("🧾️ Fetching invoice {invoice_id}");
        let req = self.client.get(self.url(&format!("/invoices/{invoice_id}")));
        send_request(req, btcpay_error_message).await
    }
}

fn btcpay_error_message(body: &str) -> String {
    serde_json::from_str::<BtcPayErrorResponse>(body).map(|e| e.message).unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod test {
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;
    use crate::{BtcPayInvoiceStatus, InvoiceCheckout, InvoiceMetadata};

    fn api(server: &MockServer) -> BtcPayApi {
        let config = BtcPayConfig {
            url: format!("{}/api/v1", server.uri()),
            store_id: "store1".into(),
            api_key: "key123".into(),
            ..Default::default()
        };
        BtcPayApi::new(config).unwrap()
    }

    #[tokio::test]
    async fn create_invoice() {
        let _ = env_logger::try_init();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/stores/store1/invoices"))
            .and(header("authorization", "token key123"))
            .and(body_partial_json(serde_json::json!({
                "metadata": { "orderId": "o-1" },
                "checkout": { "redirectURL": "https://shop.example/pending?orderId=o-1" },
                "currency": "BTC"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "inv-1",
                "checkoutLink": "https://btcpay.example/i/inv-1",
                "status": "New",
                "amount": "0.04",
                "currency": "BTC"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let request = NewBtcPayInvoice {
            metadata: InvoiceMetadata { order_id: "o-1".into(), item_desc: "Shop order".into() },
            checkout: InvoiceCheckout { redirect_url: "https://shop.example/pending?orderId=o-1".into() },
            amount: "0.04".parse().unwrap(),
            currency: "BTC".into(),
        };
        let invoice = api(&server).create_invoice(request).await.unwrap();
        assert_eq!(invoice.id, "inv-1");
        assert_eq!(invoice.checkout_link, "https://btcpay.example/i/inv-1");
        assert_eq!(invoice.status, BtcPayInvoiceStatus::New);
    }

    #[tokio::test]
    async fn get_invoice_and_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/stores/store1/invoices/inv-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "inv-2",
                "checkoutLink": "https://btcpay.example/i/inv-2",
                "status": "Settled"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/stores/store1/invoices/nope"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"code": "invoice-not-found", "message": "Invoice not found"})),
            )
            .mount(&server)
            .await;
        let api = api(&server);
        let invoice = api.get_invoice("inv-2").await.unwrap();
        assert_eq!(invoice.status, BtcPayInvoiceStatus::Settled);
        let err = api.get_invoice("nope").await.unwrap_err();
        assert!(matches!(err, ProcessorApiError::QueryError { status: 404, ref message } if message == "Invoice not found"));
    }
}
