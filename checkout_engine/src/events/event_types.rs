use crate::db_types::{BuyerDetails, ItemKind, Order, OrderStatusType, Payer};

/// Emitted once when a card checkout has been paid and its order stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCompletedEvent {
    pub order: Order,
    pub payer: Payer,
    pub buyer: BuyerDetails,
}

impl OrderCompletedEvent {
    pub fn new(order: Order, payer: Payer, buyer: BuyerDetails) -> Self {
        Self { order, payer, buyer }
    }

    pub fn kind(&self) -> ItemKind {
        self.order.kind()
    }
}

/// Emitted once for every successful status transition of an existing order (webhook or reconciliation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatusType) -> Self {
        Self { order, old_status }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}
