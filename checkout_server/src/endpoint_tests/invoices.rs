use actix_web::http::StatusCode;
use checkout_common::Price;
use checkout_engine::{
    db_types::OrderStatusType,
    traits::{Invoice, InvoiceStatus, ProcessorError},
    CheckoutDatabase,
    PayerManagement,
};

use super::{
    helpers::{get_request, json, post_request, post_webhook, sign, TestApp},
    mocks::MockGateway,
};

const BASKET: &str = r#"{
    "itemsPurchased": [
        {"_id": "p1", "title": "Mug", "price": 0.01, "quantity": 2},
        {"_id": "p2", "title": "Hat", "price": "0.02", "quantity": 1}
    ],
    "userId": "alice"
}"#;

fn invoice(id: &str) -> Invoice {
    Invoice { id: id.to_string(), checkout_link: format!("https://pay.example/i/{id}"), status: InvoiceStatus::New }
}

fn webhook(invoice_id: &str, event_type: &str) -> String {
    format!(r#"{{"deliveryId":"d1","webhookId":"w1","type":"{event_type}","invoiceId":"{invoice_id}","storeId":"s1"}}"#)
}

/// Creates an invoice order through the route and returns its order id.
async fn create_invoice(app: &TestApp) -> String {
    let (status, body) = post_request(app, "/create-invoice-btc", BASKET).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    json(&body)["orderId"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn create_invoice_returns_checkout_link() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_invoice()
        .withf(|req| {
            req.amount == "0.04".parse::<Price>().unwrap() &&
                req.redirect_url == format!("https://shop.example/pending?orderId={}", req.order_id)
        })
        .times(1)
        .returning(|_| Ok(invoice("inv-1")));
    let app = TestApp::new(gateway).await;
    let (status, body) = post_request(&app, "/create-invoice-btc", BASKET).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["checkoutLink"], "https://pay.example/i/inv-1");
    assert_eq!(body["invoiceId"], "inv-1");
    let order_id = body["orderId"].as_str().unwrap();
    let (status, body) = get_request(&app, &format!("/status/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"status":"processing"}"#);
    app.finish().await;
}

#[actix_web::test]
async fn create_invoice_failures_are_server_errors() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_invoice().times(1).returning(|_| Err(ProcessorError::new("BTCPay is down")));
    let app = TestApp::new(gateway).await;
    let (status, body) = post_request(&app, "/create-invoice-btc", BASKET).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["message"], "Error creating invoice");
    assert!(app.db().fetch_orders_for_payer("alice").await.unwrap().is_empty());

    let (status, body) = post_request(&app, "/create-invoice-btc", r#"{"userId":"alice"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["message"], "Provide required data: itemsPurchased.");
    app.finish().await;
}

#[actix_web::test]
async fn out_of_range_totals_are_rejected() {
    let app = TestApp::new(MockGateway::new()).await;
    let basket = r#"{
        "itemsPurchased": [{"_id": "p1", "title": "Everything", "price": "79228162514264337593543950", "quantity": 4294967295}],
        "userId": "alice"
    }"#;
    let (status, body) = post_request(&app, "/create-invoice-btc", basket).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["message"], "Order total is out of range.");
    assert!(app.db().fetch_orders_for_payer("alice").await.unwrap().is_empty());
    app.finish().await;
}

#[actix_web::test]
async fn settled_webhook_completes_the_order() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_invoice().times(1).returning(|_| Ok(invoice("inv-settle")));
    let app = TestApp::new(gateway).await;
    let order_id = create_invoice(&app).await;

    let body = webhook("inv-settle", "InvoiceSettled");
    let (status, _) = post_webhook(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, status_body) = get_request(&app, &format!("/status/{order_id}")).await;
    assert_eq!(status_body, r#"{"success":true,"status":"completed"}"#);

    // A later expiry does not undo the settlement
    let body = webhook("inv-settle", "InvoiceExpired");
    let (status, _) = post_webhook(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    let order = app.db().fetch_order_by_invoice_id("inv-settle").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
    app.finish().await;
}

#[actix_web::test]
async fn expired_webhook_cancels_the_order() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_invoice().times(1).returning(|_| Ok(invoice("inv-expire")));
    let app = TestApp::new(gateway).await;
    create_invoice(&app).await;
    let body = webhook("inv-expire", "InvoiceExpired");
    let (status, _) = post_webhook(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    let order = app.db().fetch_order_by_invoice_id("inv-expire").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Canceled);
    app.finish().await;
}

#[actix_web::test]
async fn webhook_for_unknown_invoice() {
    let app = TestApp::new(MockGateway::new()).await;
    let body = webhook("inv-404", "InvoiceSettled");
    let (status, response) = post_webhook(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.is_empty());

    // Event types we do not act on are acknowledged, whatever the invoice
    let body = webhook("inv-404", "InvoiceReceivedPayment");
    let (status, _) = post_webhook(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    app.finish().await;
}

#[actix_web::test]
async fn unsigned_webhooks_are_rejected() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_invoice().times(1).returning(|_| Ok(invoice("inv-forged")));
    let app = TestApp::new(gateway).await;
    create_invoice(&app).await;
    let body = webhook("inv-forged", "InvoiceSettled");

    let (status, _) = post_webhook(&app, &body, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let forged = sign(&webhook("inv-other", "InvoiceSettled"));
    let (status, response) = post_webhook(&app, &body, Some(&forged)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&response)["message"], "Invalid HMAC signature.");

    let order = app.db().fetch_order_by_invoice_id("inv-forged").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Processing);
    app.finish().await;
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new(MockGateway::new()).await;
    let (status, body) = post_request(&app, "/confirm-payment", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
    app.finish().await;
}
