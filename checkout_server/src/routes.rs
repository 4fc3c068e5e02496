//! Request handler definitions
//!
//! Handlers only unpack the request, call [`CheckoutFlowApi`] and shape the response. Checkout logic belongs in the
//! engine.
//!
//! Each worker thread processes its requests sequentially. All I/O here (database and processor calls) is awaited, so
//! a worker keeps serving other requests while a checkout is waiting on Stripe or BTCPay.
//!
//! Notification fan-out never happens in a handler. The workflow engine publishes events, and the response is returned
//! without waiting for them.
use actix_web::{get, web, HttpResponse, Responder};
use checkout_engine::{
    checkout_objects::{InvoiceEvent, TransitionOutcome},
    db_types::OrderId,
    traits::{CheckoutDatabase, PaymentGateway},
    CheckoutApiError,
    CheckoutFlowApi,
};
use log::*;

use crate::{
    data_objects::{
        ConfirmAuctionRequest,
        ConfirmPaymentRequest,
        ConfirmPaymentResponse,
        CreateInvoiceRequest,
        CreateInvoiceResponse,
        InvoiceWebhookEvent,
        JsonResponse,
        OrderStatusResponse,
        PaymentIntentRequest,
        PaymentIntentResponse,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Malformed JSON bodies are rejected with a 400 and the usual `{success, message}` body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejecting request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Crypto invoices  ----------------------------------------------------
route!(create_invoice_btc => Post "/create-invoice-btc" impl CheckoutDatabase, PaymentGateway);
/// Route handler for creating a BTCPay invoice for a basket of products.
///
/// On success, the payer should be sent to the returned `checkoutLink`. The order is stored in `processing` and will be
/// completed (or canceled) by the webhook once BTCPay has an outcome.
///
/// Every failure on this route is reported as a 500, with a message the storefront can show.
pub async fn create_invoice_btc<B, G>(
    body: web::Json<CreateInvoiceRequest>,
    api: web::Data<CheckoutFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let CreateInvoiceRequest { items_purchased, user_id } = body.into_inner();
    debug!("💻️ POST create-invoice-btc for {user_id} ({} items)", items_purchased.len());
    let result = api.create_crypto_invoice(&items_purchased, &user_id).await.map_err(|e| {
        debug!("💻️ Could not create invoice for {user_id}. {e}");
        let message = match e {
            CheckoutApiError::Validation(msg) => msg,
            CheckoutApiError::PayerNotFound(_) => e.to_string(),
            _ => "Error creating invoice".to_string(),
        };
        ServerError::InvoiceCreationError(message)
    })?;
    Ok(HttpResponse::Ok().json(CreateInvoiceResponse {
        success: true,
        checkout_link: result.invoice.checkout_link,
        order_id: result.order.order_id,
        invoice_id: result.invoice.id,
    }))
}

route!(invoice_webhook => Post "" impl CheckoutDatabase, PaymentGateway);
/// Route handler for BTCPay webhook deliveries. Mounted under `/webhook`, behind the HMAC middleware.
///
/// Settled invoices complete their order, expired and invalid invoices cancel it. Other event types are acknowledged
/// and ignored. Deliveries for invoices we know nothing about get an empty 405.
pub async fn invoice_webhook<B, G>(
    body: web::Json<InvoiceWebhookEvent>,
    api: web::Data<CheckoutFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let InvoiceWebhookEvent { invoice_id, event_type } = body.into_inner();
    info!("💻️ Webhook received: {event_type} for invoice {invoice_id}");
    let outcome = api.process_invoice_event(InvoiceEvent::new(invoice_id, &event_type)).await?;
    let message = match outcome {
        TransitionOutcome::Transitioned(order) => format!("Order {} is now {}", order.order_id, order.status),
        TransitionOutcome::Unchanged(order) => format!("Order {} is already {}", order.order_id, order.status),
        TransitionOutcome::Ignored => format!("{event_type} events are ignored"),
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

//----------------------------------------------   Card payments  ------------------------------------------------------
route!(create_payment_intent => Post "/create-payment-intent" impl CheckoutDatabase, PaymentGateway);
pub async fn create_payment_intent<B, G>(
    body: web::Json<PaymentIntentRequest>,
    api: web::Data<CheckoutFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let PaymentIntentRequest { amount, user_id } = body.into_inner();
    debug!("💻️ POST create-payment-intent for {user_id}: {amount}");
    let intent = api.create_charge_intent(amount, &user_id).await.map_err(|e| match e {
        CheckoutApiError::Processor(_) => ServerError::BackendError("Failed to create Payment Intent".to_string()),
        e => e.into(),
    })?;
    Ok(HttpResponse::Ok().json(PaymentIntentResponse::from(intent)))
}

route!(confirm_payment => Post "/confirm-payment" impl CheckoutDatabase, PaymentGateway);
/// Route handler for confirming a card payment for a basket of products.
///
/// The payment intent is checked with Stripe (and confirmed once if needed) before the order is stored. Calling this
/// again with the same payment intent returns the original order.
pub async fn confirm_payment<B, G>(
    body: web::Json<ConfirmPaymentRequest>,
    api: web::Data<CheckoutFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let req = body.into_inner();
    debug!("💻️ POST confirm-payment for {} with intent {}", req.user_id, req.payment_intent_id);
    let confirmation = api.confirm_card_payment(req.into()).await?;
    Ok(HttpResponse::Ok().json(ConfirmPaymentResponse::from(confirmation)))
}

route!(confirm_payment_auction => Post "/confirm-payment-auction" impl CheckoutDatabase, PaymentGateway);
/// Route handler for paying for a won auction by card. The auction is closed in the same transaction that stores the
/// order, so a second confirmation for the same auction is rejected with a 409.
pub async fn confirm_payment_auction<B, G>(
    body: web::Json<ConfirmAuctionRequest>,
    api: web::Data<CheckoutFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let req = body.into_inner();
    debug!("💻️ POST confirm-payment-auction for {} with intent {}", req.user_id, req.payment_intent_id);
    let confirmation = api.confirm_auction_payment(req.into()).await?;
    Ok(HttpResponse::Ok().json(ConfirmPaymentResponse::from(confirmation)))
}

//----------------------------------------------   Order status  -------------------------------------------------------
route!(order_status => Get "/status/{order_id}" impl CheckoutDatabase, PaymentGateway);
pub async fn order_status<B, G>(
    path: web::Path<OrderId>,
    api: web::Data<CheckoutFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    trace!("💻️ GET status for order {order_id}");
    let order = api.order_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(OrderStatusResponse { success: true, status: order.status }))
}
