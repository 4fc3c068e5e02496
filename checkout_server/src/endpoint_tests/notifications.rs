use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use actix_web::http::StatusCode;
use checkout_common::Cents;
use checkout_engine::{
    db_types::OrderStatusType,
    traits::{ChargeIntent, ChargeStatus},
    CheckoutDatabase,
};
use futures::future::BoxFuture;

use super::{
    helpers::{json, post_request, TestApp},
    mocks::MockGateway,
};
use crate::notifications::{
    create_notification_handlers,
    ChatTransport,
    EmailMessage,
    EmailTransport,
    NotificationDispatcher,
    NotificationError,
    NotificationSettings,
    SettingsHandle,
};

const SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Chat never answers and email always fails. Counts every attempt.
#[derive(Default)]
struct BrokenTransport {
    attempts: AtomicUsize,
}

impl ChatTransport for BrokenTransport {
    fn send_chat<'a>(&'a self, _chat_id: &'a str, _text: &'a str) -> BoxFuture<'a, Result<(), NotificationError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
    }
}

impl EmailTransport for BrokenTransport {
    fn send_email(&self, _email: EmailMessage) -> BoxFuture<'_, Result<(), NotificationError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotificationError::Transport("smtp is down".into()))
        })
    }
}

fn succeeded(id: &str) -> ChargeIntent {
    ChargeIntent {
        id: id.to_string(),
        amount: Cents::from(500),
        currency: "usd".into(),
        status: ChargeStatus::Succeeded,
        client_secret: Some(format!("{id}_secret")),
    }
}

fn gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_charge().times(1).returning(|id| Ok(succeeded(id)));
    gateway
}

fn confirm_body(intent: &str) -> String {
    format!(
        r#"{{"paymentIntentId":"{intent}","userId":"alice","itemsPurchased":[{{"_id":"p1","title":"Mug","price":0.01,"quantity":2}}]}}"#
    )
}

/// The response body, minus the fields that differ between orders.
fn comparable(body: &str) -> serde_json::Value {
    let mut body = json(body);
    let fields = body.as_object_mut().unwrap();
    fields.remove("orderId");
    fields.remove("redirectUrl");
    body
}

#[actix_web::test]
async fn broken_notifications_do_not_change_the_confirmation() {
    let quiet = TestApp::new(gateway()).await;
    let (status, expected) = post_request(&quiet, "/confirm-payment", &confirm_body("pi_n1")).await;
    assert_eq!(status, StatusCode::OK, "{expected}");
    quiet.finish().await;

    let transport = Arc::new(BrokenTransport::default());
    let settings = NotificationSettings { chat_id: "-1001".into(), ..Default::default() };
    let dispatcher = NotificationDispatcher::new(
        SettingsHandle::new(settings),
        Some(transport.clone()),
        transport.clone(),
        SEND_TIMEOUT,
    );
    let handlers = create_notification_handlers(dispatcher, 10);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let app = TestApp::with_producers(gateway(), producers).await;

    let started = Instant::now();
    let (status, body) = post_request(&app, "/confirm-payment", &confirm_body("pi_n1")).await;
    let elapsed = started.elapsed();
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(elapsed < SEND_TIMEOUT, "Confirmation took {elapsed:?}");
    assert_eq!(comparable(&body), comparable(&expected));

    let order = app.db().fetch_order_by_payment_intent("pi_n1").await.unwrap().expect("order was not stored");
    assert_eq!(order.status, OrderStatusType::Completed);
    assert_eq!(order.order_id.as_str(), json(&body)["orderId"].as_str().unwrap());

    // Both channels were tried, and failed, after the response went out
    let deadline = Instant::now() + Duration::from_secs(5);
    while transport.attempts.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
    app.finish().await;
}
