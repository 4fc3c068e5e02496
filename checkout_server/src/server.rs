use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, web::ServiceConfig, App, HttpServer};
use checkout_engine::{
    events::EventProducers,
    traits::{CheckoutDatabase, PaymentGateway},
    CheckoutFlowApi,
    SqliteDatabase,
};
use log::*;
use processor_tools::TelegramApi;

use crate::{
    config::{ServerConfig, WebhookConfig, BTCPAY_SIGNATURE_HEADER},
    errors::ServerError,
    integrations::ProcessorGateway,
    middleware::HmacMiddlewareFactory,
    notifications::{
        create_notification_handlers,
        ChatTransport,
        LogMailer,
        NotificationDispatcher,
        SettingsHandle,
    },
    reconcile_worker::start_reconcile_worker,
    routes::{
        health,
        json_config,
        ConfirmPaymentAuctionRoute,
        ConfirmPaymentRoute,
        CreateInvoiceBtcRoute,
        CreatePaymentIntentRoute,
        InvoiceWebhookRoute,
        OrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = ProcessorGateway::new(config.stripe.clone(), config.btcpay.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let dispatcher = create_dispatcher(&config)?;
    let handlers = create_notification_handlers(dispatcher, config.event_buffer_size);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _worker = start_reconcile_worker(
        db.clone(),
        gateway.clone(),
        producers.clone(),
        config.checkout_options(),
        config.reconcile_interval,
        config.reconcile_after,
    );
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

fn create_dispatcher(config: &ServerConfig) -> Result<NotificationDispatcher, ServerError> {
    let chat = if config.telegram.bot_token.is_empty() {
        warn!("📣️ No Telegram bot token is configured. Chat notifications are disabled.");
        None
    } else {
        let api = TelegramApi::new(config.telegram.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Some(Arc::new(api) as Arc<dyn ChatTransport>)
    };
    let settings = SettingsHandle::new(config.notifications.clone());
    Ok(NotificationDispatcher::new(settings, chat, Arc::new(LogMailer), config.notification_timeout))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: ProcessorGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = config.checkout_options();
    let webhook = config.webhook.clone();
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutFlowApi::new(db.clone(), gateway.clone(), producers.clone(), options.clone());
        let webhook = webhook.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("chk::access_log"))
            .app_data(web::Data::new(checkout_api))
            .configure(move |cfg| configure_routes::<SqliteDatabase, ProcessorGateway>(cfg, webhook))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every checkout route. The `CheckoutFlowApi<B, G>` must be supplied as app data.
pub fn configure_routes<B, G>(cfg: &mut ServiceConfig, webhook: WebhookConfig)
where
    B: CheckoutDatabase + 'static,
    G: PaymentGateway + 'static,
{
    let hmac = HmacMiddlewareFactory::new(BTCPAY_SIGNATURE_HEADER, webhook.secret, webhook.hmac_checks);
    cfg.app_data(json_config())
        .service(health)
        .service(CreateInvoiceBtcRoute::<B, G>::new())
        .service(CreatePaymentIntentRoute::<B, G>::new())
        .service(ConfirmPaymentRoute::<B, G>::new())
        .service(ConfirmPaymentAuctionRoute::<B, G>::new())
        .service(OrderStatusRoute::<B, G>::new())
        .service(web::scope("/webhook").wrap(hmac).service(InvoiceWebhookRoute::<B, G>::new()));
}
