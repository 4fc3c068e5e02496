use actix_web::http::StatusCode;
use checkout_common::Cents;
use checkout_engine::{
    db_types::{AuctionStatus, OrderStatusType},
    test_utils::prepare_env::seed_auction,
    traits::{ChargeIntent, ChargeStatus, ProcessorError},
    CatalogManagement,
    CheckoutDatabase,
    PayerManagement,
};

use super::{
    helpers::{get_request, json, post_request, TestApp},
    mocks::MockGateway,
};

fn charge(id: &str, status: ChargeStatus) -> ChargeIntent {
    ChargeIntent {
        id: id.to_string(),
        amount: Cents::from(500),
        currency: "usd".into(),
        status,
        client_secret: Some(format!("{id}_secret")),
    }
}

fn confirm_body(intent: &str, user: &str) -> String {
    format!(
        r#"{{
        "paymentIntentId": "{intent}",
        "userId": "{user}",
        "itemsPurchased": [{{"_id": "p1", "title": "Mug", "price": 0.01, "quantity": 2}}],
        "firstname": "Alice",
        "lastname": "Smith",
        "country": "NZ",
        "city": "Wellington",
        "street": "1 Lambton Quay",
        "zip": "6011",
        "phone": "555-1234"
    }}"#
    )
}

fn auction_body(intent: &str, user: &str, auction: &str) -> String {
    format!(
        r#"{{"paymentIntentId":"{intent}","userId":"{user}","itemsPurchased":{{"_id":"{auction}","currentPrice":"0.75"}}}}"#
    )
}

#[actix_web::test]
async fn create_payment_intent() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_charge_intent()
        .withf(|req| req.amount == Cents::from(1250) && req.payer_id == "alice")
        .times(1)
        .returning(|_| Ok(charge("pi_new", ChargeStatus::RequiresPaymentMethod)));
    let app = TestApp::new(gateway).await;
    let (status, body) = post_request(&app, "/create-payment-intent", r#"{"amount":1250,"userId":"alice"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"clientSecret":"pi_new_secret","paymentIntentId":"pi_new"}"#);

    let (status, body) = post_request(&app, "/create-payment-intent", r#"{"amount":1250}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["message"], "Amount and userId are required.");
    app.finish().await;
}

#[actix_web::test]
async fn payment_intent_processor_failure() {
    let mut gateway = MockGateway::new();
    gateway.expect_create_charge_intent().times(1).returning(|_| Err(ProcessorError::new("Stripe is down")));
    let app = TestApp::new(gateway).await;
    let (status, body) = post_request(&app, "/create-payment-intent", r#"{"amount":100,"userId":"alice"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["message"].as_str().unwrap().contains("Failed to create Payment Intent"));
    app.finish().await;
}

#[actix_web::test]
async fn confirm_payment_stores_a_completed_order() {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_charge().times(1).returning(|id| Ok(charge(id, ChargeStatus::RequiresConfirmation)));
    gateway.expect_confirm_charge().times(1).returning(|id| Ok(charge(id, ChargeStatus::Succeeded)));
    let app = TestApp::new(gateway).await;
    let (status, body) = post_request(&app, "/confirm-payment", &confirm_body("pi_1", "alice")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["message"], "Payment confirmed!");
    assert_eq!(body["paymentIntent"]["id"], "pi_1");
    assert_eq!(body["paymentIntent"]["status"], "succeeded");
    assert!(body["paymentIntent"].get("client_secret").is_none());
    let order_id = body["orderId"].as_str().unwrap();
    assert_eq!(body["redirectUrl"], format!("https://shop.example/pending?orderId={order_id}"));
    let (_, status_body) = get_request(&app, &format!("/status/{order_id}")).await;
    assert_eq!(status_body, r#"{"success":true,"status":"completed"}"#);
    app.finish().await;
}

#[actix_web::test]
async fn confirm_payment_replays_and_ownership() {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_charge().returning(|id| Ok(charge(id, ChargeStatus::Succeeded)));
    gateway.expect_confirm_charge().never();
    let app = TestApp::new(gateway).await;
    let (_, first) = post_request(&app, "/confirm-payment", &confirm_body("pi_2", "alice")).await;
    let (status, second) = post_request(&app, "/confirm-payment", &confirm_body("pi_2", "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&first)["orderId"], json(&second)["orderId"]);
    assert_eq!(app.db().fetch_orders_for_payer("alice").await.unwrap().len(), 1);

    let (status, _) = post_request(&app, "/confirm-payment", &confirm_body("pi_2", "bob")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    app.finish().await;
}

#[actix_web::test]
async fn failed_charge_stores_nothing() {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_charge().times(1).returning(|id| Ok(charge(id, ChargeStatus::RequiresPaymentMethod)));
    gateway.expect_confirm_charge().times(1).returning(|id| Ok(charge(id, ChargeStatus::RequiresAction)));
    let app = TestApp::new(gateway).await;
    let (status, body) = post_request(&app, "/confirm-payment", &confirm_body("pi_3", "alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"success":false,"message":"Payment failed or requires additional action."}"#);
    assert!(app.db().fetch_order_by_payment_intent("pi_3").await.unwrap().is_none());
    app.finish().await;
}

#[actix_web::test]
async fn confirm_payment_validation() {
    let app = TestApp::new(MockGateway::new()).await;
    let (status, body) = post_request(&app, "/confirm-payment", &confirm_body("", "alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["message"], "PaymentIntent ID and User ID are required.");
    let (status, body) = post_request(&app, "/confirm-payment", &confirm_body("pi_x", "mallory")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["message"], "User not found.");

    let huge = confirm_body("pi_huge", "alice")
        .replace(r#""price": 0.01, "quantity": 2"#, r#""price": "79228162514264337593543950", "quantity": 4294967295"#);
    let (status, body) = post_request(&app, "/confirm-payment", &huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["message"], "Order total is out of range.");
    assert!(app.db().fetch_order_by_payment_intent("pi_huge").await.unwrap().is_none());
    app.finish().await;
}

#[actix_web::test]
async fn auction_can_only_be_paid_once() {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_charge().times(1).returning(|id| Ok(charge(id, ChargeStatus::Succeeded)));
    let app = TestApp::new(gateway).await;
    seed_auction(app.db(), "lot-1", "0.75", AuctionStatus::Ended).await;

    let (status, body) = post_request(&app, "/confirm-payment-auction", &auction_body("pi_a1", "alice", "lot-1")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order_id = json(&body)["orderId"].as_str().unwrap().to_string();
    let order = app.db().fetch_order_by_order_id(&order_id.as_str().into()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
    let auction = app.db().fetch_auction("lot-1").await.unwrap().unwrap();
    assert_eq!(auction.status, AuctionStatus::Completed);

    let (status, _) = post_request(&app, "/confirm-payment-auction", &auction_body("pi_a2", "bob", "lot-1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = post_request(&app, "/confirm-payment-auction", &auction_body("pi_a3", "bob", "lot-404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    app.finish().await;
}

#[actix_web::test]
async fn failed_auction_charge_leaves_auction_open() {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_charge().times(1).returning(|id| Ok(charge(id, ChargeStatus::RequiresConfirmation)));
    gateway.expect_confirm_charge().times(1).returning(|id| Ok(charge(id, ChargeStatus::RequiresPaymentMethod)));
    let app = TestApp::new(gateway).await;
    seed_auction(app.db(), "lot-2", "2", AuctionStatus::Ended).await;
    let (status, _) = post_request(&app, "/confirm-payment-auction", &auction_body("pi_a4", "alice", "lot-2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let auction = app.db().fetch_auction("lot-2").await.unwrap().unwrap();
    assert_eq!(auction.status, AuctionStatus::Ended);
    assert!(app.db().fetch_orders_for_payer("alice").await.unwrap().is_empty());
    app.finish().await;
}
