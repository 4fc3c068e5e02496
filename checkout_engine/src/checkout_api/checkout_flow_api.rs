use std::fmt::Debug;

use checkout_common::{Cents, Price};
use chrono::Duration;
use log::*;

use crate::{
    checkout_api::{
        checkout_objects::{
            AuctionPaymentRequest,
            CardPaymentRequest,
            CheckoutOptions,
            CryptoInvoice,
            InvoiceEvent,
            InvoiceEventKind,
            PaymentConfirmation,
            PricingPolicy,
            PurchasedItem,
            ReconcileResult,
            TransitionOutcome,
            TransitionPolicy,
        },
        errors::CheckoutApiError,
        pricing,
    },
    db_types::{
        AuctionStatus,
        BuyerDetails,
        ItemKind,
        NewLineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        Payer,
    },
    events::{EventProducers, OrderCompletedEvent, OrderStatusChangedEvent},
    traits::{ChargeIntent, ChargeIntentRequest, CheckoutDatabase, CheckoutDbError, InvoiceRequest, PaymentGateway},
};

/// `CheckoutFlowApi` is the single authority for turning payment signals (client confirmations, processor webhooks and
/// reconciliation sweeps) into durable order and auction state changes.
///
/// Side effects that the payer should not wait for are published as events. Subscribe to them with
/// [`crate::events::EventHooks`].
pub struct CheckoutFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    options: CheckoutOptions,
}

impl<B, G> Debug for CheckoutFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutFlowApi ({:?})", self.options)
    }
}

impl<B, G> CheckoutFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, options: CheckoutOptions) -> Self {
        Self { db, gateway, producers, options }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn options(&self) -> &CheckoutOptions {
        &self.options
    }
}

impl<B, G> CheckoutFlowApi<B, G>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    /// Prices the items, asks the invoicing service for an invoice, and stores a `processing` order linked to it.
    ///
    /// Nothing is stored if the invoice could not be created.
    pub async fn create_crypto_invoice(
        &self,
        items: &[PurchasedItem],
        payer_id: &str,
    ) -> Result<CryptoInvoice, CheckoutApiError> {
        if items.is_empty() {
            return Err(CheckoutApiError::validation("Provide required data: itemsPurchased."));
        }
        if payer_id.trim().is_empty() {
            return Err(CheckoutApiError::validation("Create or login to your account."));
        }
        let payer = self.fetch_payer(payer_id).await?;
        let (line_items, total) = self.price_items(items, ItemKind::Product).await?;
        let order_id = OrderId::random();
        let request = InvoiceRequest {
            order_id: order_id.clone(),
            amount: total,
            currency: self.options.shop_currency.clone(),
            description: self.options.invoice_description.clone(),
            redirect_url: self.options.pending_url(order_id.as_str()),
        };
        let invoice = self.gateway.create_invoice(request).await.map_err(|e| {
            warn!("🔄️🧾️ Could not create an invoice for order [{order_id}]. {e}");
            e
        })?;
        debug!("🔄️🧾️ Invoice {} created for order [{order_id}]", invoice.id);
        let order = NewOrder::new(order_id, payer.id, line_items, total, &self.options.shop_currency)
            .awaiting_invoice(invoice.id.clone());
        let order = self.db.insert_order(order).await?;
        info!("🔄️🧾️ Order [{}] for {} {} is awaiting invoice {}", order.order_id, total, order.currency, invoice.id);
        Ok(CryptoInvoice { order, invoice })
    }

    /// Applies an invoice webhook event to the order linked to the invoice.
    ///
    /// Event kinds that carry no status change are ignored without touching the store.
    pub async fn process_invoice_event(&self, event: InvoiceEvent) -> Result<TransitionOutcome, CheckoutApiError> {
        let target = match &event.kind {
            InvoiceEventKind::Settled => OrderStatusType::Completed,
            InvoiceEventKind::Expired | InvoiceEventKind::Invalid => OrderStatusType::Canceled,
            InvoiceEventKind::Other(kind) => {
                debug!("🔄️🧾️ Ignoring {kind} event for invoice {}", event.invoice_id);
                return Ok(TransitionOutcome::Ignored);
            },
        };
        let order = self
            .db
            .fetch_order_by_invoice_id(&event.invoice_id)
            .await?
            .ok_or_else(|| CheckoutApiError::UnknownInvoice(event.invoice_id.clone()))?;
        self.transition_order(order, target).await
    }

    /// Moves the order to `target`, according to the configured [`TransitionPolicy`].
    async fn transition_order(
        &self,
        order: Order,
        target: OrderStatusType,
    ) -> Result<TransitionOutcome, CheckoutApiError> {
        if order.status == target {
            trace!("🔄️ Order [{}] is already {target}", order.order_id);
            return Ok(TransitionOutcome::Unchanged(order));
        }
        let old_status = order.status;
        let updated = match self.options.transition_policy {
            TransitionPolicy::Strict => {
                if old_status.is_terminal() {
                    warn!(
                        "🔄️ Order [{}] is already {old_status}. Refusing to move it to {target}.",
                        order.order_id
                    );
                    return Ok(TransitionOutcome::Unchanged(order));
                }
                match self.db.update_order_status(order.id, old_status, target).await? {
                    Some(updated) => updated,
                    None => {
                        debug!("🔄️ Order [{}] changed underneath us. Leaving it as it is.", order.order_id);
                        let current = self.db.fetch_order_by_order_id(&order.order_id).await?;
                        return Ok(TransitionOutcome::Unchanged(current.unwrap_or(order)));
                    },
                }
            },
            TransitionPolicy::Lenient => self.db.overwrite_order_status(order.id, target).await?,
        };
        info!("🔄️ Order [{}] moved from {old_status} to {}", updated.order_id, updated.status);
        self.call_status_changed_hook(&updated, old_status).await;
        Ok(TransitionOutcome::Transitioned(updated))
    }

    /// Creates a card payment intent for `amount` (in the card currency's minor units).
    pub async fn create_charge_intent(&self, amount: Cents, payer_id: &str) -> Result<ChargeIntent, CheckoutApiError> {
        if !amount.is_positive() || payer_id.trim().is_empty() {
            return Err(CheckoutApiError::validation("Amount and userId are required."));
        }
        let request = ChargeIntentRequest {
            amount,
            currency: self.options.card_currency.clone(),
            payer_id: payer_id.to_string(),
        };
        let intent = self.gateway.create_charge_intent(request).await?;
        debug!("🔄️💳️ Payment intent {} created for {amount} on behalf of {payer_id}", intent.id);
        Ok(intent)
    }

    /// Confirms a card payment for a list of catalog products, and stores the `completed` order.
    ///
    /// Confirming the same intent more than once returns the original order.
    pub async fn confirm_card_payment(
        &self,
        request: CardPaymentRequest,
    ) -> Result<PaymentConfirmation, CheckoutApiError> {
        let CardPaymentRequest { intent_id, payer_id, items, buyer } = request;
        validate_ids(&intent_id, &payer_id)?;
        if items.is_empty() {
            return Err(CheckoutApiError::validation("Provide required data: itemsPurchased."));
        }
        let payer = self.fetch_payer(&payer_id).await?;
        if let Some(confirmation) = self.replayed_confirmation(&intent_id, &payer_id).await? {
            return Ok(confirmation);
        }
        let (line_items, total) = self.price_items(&items, ItemKind::Product).await?;
        let charge = self.ensure_charge_succeeded(&intent_id).await?;
        let order = NewOrder::new(OrderId::random(), payer_id.clone(), line_items, total, &self.options.shop_currency)
            .paid_by_card(intent_id.clone());
        let order = match self.db.insert_order(order).await {
            Ok(order) => order,
            Err(e) => {
                if let Ok(Some(confirmation)) = self.replayed_confirmation(&intent_id, &payer_id).await {
                    return Ok(confirmation);
                }
                return Err(persistence_failure(&intent_id, e));
            },
        };
        info!("🔄️💳️ Payment {intent_id} confirmed. Order [{}] is complete", order.order_id);
        self.call_order_completed_hook(&order, &payer, &buyer).await;
        Ok(self.confirmation(order, charge, false))
    }

    /// Confirms the card payment for a won auction. The auction's stored price is charged, and the auction is closed
    /// in the same transaction that stores the order.
    pub async fn confirm_auction_payment(
        &self,
        request: AuctionPaymentRequest,
    ) -> Result<PaymentConfirmation, CheckoutApiError> {
        let AuctionPaymentRequest { intent_id, payer_id, item, buyer } = request;
        validate_ids(&intent_id, &payer_id)?;
        let auction_id = item
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CheckoutApiError::validation("Provide required data: itemsPurchased."))?;
        let payer = self.fetch_payer(&payer_id).await?;
        if let Some(confirmation) = self.replayed_confirmation(&intent_id, &payer_id).await? {
            return Ok(confirmation);
        }
        let auction = self
            .db
            .fetch_auction(&auction_id)
            .await?
            .ok_or_else(|| CheckoutApiError::AuctionNotFound(auction_id.clone()))?;
        match auction.status {
            AuctionStatus::Completed => return Err(CheckoutApiError::AuctionAlreadyCompleted(auction.id)),
            AuctionStatus::Canceled => {
                return Err(CheckoutApiError::AuctionNotPayable { id: auction.id, status: auction.status })
            },
            AuctionStatus::Active | AuctionStatus::Ended => {},
        }
        let charge = self.ensure_charge_succeeded(&intent_id).await?;
        let line_item = NewLineItem {
            title: auction.title.clone(),
            item_ref: Some(auction.id.clone()),
            kind: ItemKind::Auction,
            price: auction.current_price,
            quantity: 1,
        };
        let order = NewOrder::new(
            OrderId::random(),
            payer_id.clone(),
            vec![line_item],
            auction.current_price,
            &self.options.shop_currency,
        )
        .paid_by_card(intent_id.clone());
        let order = match self.db.insert_auction_order(order, &auction.id).await {
            Ok((order, _)) => order,
            Err(CheckoutDbError::AuctionNotCompletable { id, status }) => {
                error!(
                    "🔄️🔨️ Payment {intent_id} was captured, but auction {id} is already {status}. This payment needs \
                     to be refunded manually."
                );
                return Err(CheckoutApiError::AuctionAlreadyCompleted(id));
            },
            Err(e) => {
                if let Ok(Some(confirmation)) = self.replayed_confirmation(&intent_id, &payer_id).await {
                    return Ok(confirmation);
                }
                return Err(persistence_failure(&intent_id, e));
            },
        };
        info!("🔄️🔨️ Payment {intent_id} confirmed. Auction {} is complete with order [{}]", auction.id, order.order_id);
        self.call_order_completed_hook(&order, &payer, &buyer).await;
        Ok(self.confirmation(order, charge, false))
    }

    pub async fn order_status(&self, order_id: &OrderId) -> Result<Order, CheckoutApiError> {
        self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| CheckoutApiError::OrderNotFound(order_id.clone()))
    }

    /// Polls the invoicing service for crypto orders that have been `processing` for longer than `older_than` and
    /// applies any final invoice status that the webhook failed to deliver.
    pub async fn reconcile_stale_invoices(&self, older_than: Duration) -> Result<ReconcileResult, CheckoutApiError> {
        let orders = self.db.fetch_stale_invoice_orders(older_than).await?;
        let mut result = ReconcileResult::default();
        if orders.is_empty() {
            return Ok(result);
        }
        debug!("🔄️🧾️ Reconciling {} stale invoice orders", orders.len());
        for order in orders {
            let Some(invoice_id) = order.invoice_id.clone() else {
                result.untouched += 1;
                continue;
            };
            let status = match self.gateway.fetch_invoice_status(&invoice_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("🔄️🧾️ Could not fetch the status of invoice {invoice_id}. {e}");
                    result.untouched += 1;
                    continue;
                },
            };
            let Some(target) = status.resolved_order_status() else {
                trace!("🔄️🧾️ Invoice {invoice_id} is still open ({status:?})");
                result.untouched += 1;
                continue;
            };
            match self.transition_order(order, target).await {
                Ok(TransitionOutcome::Transitioned(o)) if o.status == OrderStatusType::Completed => result.completed += 1,
                Ok(TransitionOutcome::Transitioned(o)) if o.status == OrderStatusType::Canceled => result.canceled += 1,
                Ok(_) => result.untouched += 1,
                Err(e) => {
                    warn!("🔄️🧾️ Could not reconcile invoice {invoice_id}. {e}");
                    result.untouched += 1;
                },
            }
        }
        info!(
            "🔄️🧾️ Reconciliation complete. {} completed, {} canceled, {} untouched",
            result.completed, result.canceled, result.untouched
        );
        Ok(result)
    }

    async fn fetch_payer(&self, payer_id: &str) -> Result<Payer, CheckoutApiError> {
        self.db.fetch_payer(payer_id).await?.ok_or_else(|| CheckoutApiError::PayerNotFound(payer_id.to_string()))
    }

    async fn price_items(
        &self,
        items: &[PurchasedItem],
        kind: ItemKind,
    ) -> Result<(Vec<NewLineItem>, Price), CheckoutApiError> {
        let line_items = match self.options.pricing_policy {
            PricingPolicy::ClientSupplied => pricing::line_items(items, kind)?,
            PricingPolicy::Catalog => self.catalog_line_items(items, kind).await?,
        };
        let total = pricing::order_total(&line_items)?;
        Ok((line_items, total))
    }

    async fn catalog_line_items(
        &self,
        items: &[PurchasedItem],
        kind: ItemKind,
    ) -> Result<Vec<NewLineItem>, CheckoutApiError> {
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let product_id = item
                .id
                .as_deref()
                .ok_or_else(|| CheckoutApiError::validation("Every item must reference a product."))?;
            let product = self
                .db
                .fetch_product(product_id)
                .await?
                .ok_or_else(|| CheckoutApiError::validation(format!("Unknown product: {product_id}")))?;
            if let Ok(client_price) = pricing::unit_price(item) {
                if client_price != product.price {
                    warn!(
                        "🔄️ Client priced {product_id} at {client_price}, but the catalog price is {}. Using the \
                         catalog price.",
                        product.price
                    );
                }
            }
            result.push(NewLineItem {
                title: product.title,
                item_ref: Some(product.id),
                kind,
                price: product.price,
                quantity: pricing::quantity(item),
            });
        }
        Ok(result)
    }

    /// Fetches the charge, and confirms it once if it has not succeeded yet.
    async fn ensure_charge_succeeded(&self, intent_id: &str) -> Result<ChargeIntent, CheckoutApiError> {
        let charge = self.gateway.fetch_charge(intent_id).await?;
        if charge.succeeded() {
            return Ok(charge);
        }
        debug!("🔄️💳️ Payment {intent_id} is {:?}. Attempting to confirm it.", charge.status);
        let charge = self.gateway.confirm_charge(intent_id).await?;
        if charge.succeeded() {
            Ok(charge)
        } else {
            info!("🔄️💳️ Payment {intent_id} could not be confirmed. Status: {:?}", charge.status);
            Err(CheckoutApiError::ChargeNotConfirmed(charge.status))
        }
    }

    async fn replayed_confirmation(
        &self,
        intent_id: &str,
        payer_id: &str,
    ) -> Result<Option<PaymentConfirmation>, CheckoutApiError> {
        let Some(order) = self.db.fetch_order_by_payment_intent(intent_id).await? else {
            return Ok(None);
        };
        if order.payer_id != payer_id {
            warn!(
                "🔄️💳️ {payer_id} tried to confirm payment {intent_id}, which belongs to order [{}] of {}",
                order.order_id, order.payer_id
            );
            return Err(CheckoutApiError::ChargeOwnershipMismatch(intent_id.to_string()));
        }
        debug!("🔄️💳️ Payment {intent_id} was already confirmed for order [{}]", order.order_id);
        let charge = self.gateway.fetch_charge(intent_id).await?;
        Ok(Some(self.confirmation(order, charge, true)))
    }

    fn confirmation(&self, order: Order, charge: ChargeIntent, replayed: bool) -> PaymentConfirmation {
        let redirect_url = self.options.pending_url(order.order_id.as_str());
        PaymentConfirmation { order, charge, redirect_url, replayed }
    }

    async fn call_order_completed_hook(&self, order: &Order, payer: &Payer, buyer: &BuyerDetails) {
        for emitter in &self.producers.order_completed_producer {
            debug!("🔄️📦️ Notifying order completed hook subscribers");
            let event = OrderCompletedEvent::new(order.clone(), payer.clone(), buyer.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_status_changed_hook(&self, order: &Order, old_status: OrderStatusType) {
        for emitter in &self.producers.status_changed_producer {
            debug!("🔄️📦️ Notifying order status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(order.clone(), old_status);
            emitter.publish_event(event).await;
        }
    }
}

fn validate_ids(intent_id: &str, payer_id: &str) -> Result<(), CheckoutApiError> {
    if intent_id.trim().is_empty() || payer_id.trim().is_empty() {
        return Err(CheckoutApiError::validation("PaymentIntent ID and User ID are required."));
    }
    Ok(())
}

fn persistence_failure(intent_id: &str, e: CheckoutDbError) -> CheckoutApiError {
    error!(
        "🔄️💳️ Payment {intent_id} was captured, but the order could not be saved. This payment must be reconciled \
         manually. {e}"
    );
    CheckoutApiError::PersistenceAfterCapture { intent_id: intent_id.to_string(), reason: e.to_string() }
}
