use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use checkout_engine::{
    checkout_objects::CheckoutOptions,
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path, seed_payer, tear_down},
    CheckoutFlowApi,
    SqliteDatabase,
};
use log::debug;

use crate::{
    config::{WebhookConfig, BTCPAY_SIGNATURE_HEADER},
    endpoint_tests::mocks::MockGateway,
    helpers::calculate_hmac,
    server::configure_routes,
};

pub const WEBHOOK_SECRET: &str = "whsec_test";

pub type Api = CheckoutFlowApi<SqliteDatabase, MockGateway>;

/// A checkout API over a fresh database with the payers `alice` and `bob`.
pub struct TestApp {
    pub api: web::Data<Api>,
}

impl TestApp {
    pub async fn new(gateway: MockGateway) -> Self {
        Self::with_producers(gateway, EventProducers::default()).await
    }

    /// As [`Self::new`], with checkout events published to `producers`.
    pub async fn with_producers(gateway: MockGateway, producers: EventProducers) -> Self {
        let _ = env_logger::try_init();
        let db = prepare_test_env(&random_db_path()).await;
        seed_payer(&db, "alice").await;
        seed_payer(&db, "bob").await;
        let options = CheckoutOptions { client_url: "https://shop.example".into(), ..Default::default() };
        let api = CheckoutFlowApi::new(db, gateway, producers, options);
        Self { api: web::Data::new(api) }
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api.db()
    }

    pub async fn finish(self) {
        tear_down(self.api.db().clone()).await;
    }
}

fn webhook_config() -> WebhookConfig {
    WebhookConfig { secret: WEBHOOK_SECRET.into(), hmac_checks: true }
}

pub fn sign(body: &str) -> String {
    format!("sha256={}", calculate_hmac(WEBHOOK_SECRET, body.as_bytes()))
}

/// Sends the request through the full route table. Middleware errors are rendered the way actix would render them.
pub async fn send(app: &TestApp, req: TestRequest) -> (StatusCode, String) {
    let api = app.api.clone();
    let service = test::init_service(
        App::new()
            .app_data(api)
            .configure(|cfg| configure_routes::<SqliteDatabase, MockGateway>(cfg, webhook_config())),
    )
    .await;
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.map_into_boxed_body().into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    debug!("Response: {status} {body}");
    (status, body)
}

pub async fn get_request(app: &TestApp, path: &str) -> (StatusCode, String) {
    send(app, TestRequest::get().uri(path)).await
}

pub async fn post_request(app: &TestApp, path: &str, body: &str) -> (StatusCode, String) {
    let req = TestRequest::post()
        .uri(path)
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    send(app, req).await
}

pub async fn post_webhook(app: &TestApp, body: &str, signature: Option<&str>) -> (StatusCode, String) {
    let mut req = TestRequest::post()
        .uri("/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((BTCPAY_SIGNATURE_HEADER, sig.to_string()));
    }
    send(app, req).await
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap()
}
