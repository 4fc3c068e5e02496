//! Turns client-submitted purchase lists into priced line items.
use checkout_common::Price;

use crate::{
    checkout_api::{checkout_objects::PurchasedItem, errors::CheckoutApiError},
    db_types::{ItemKind, NewLineItem},
};

/// The price charged for one unit: `price`, falling back to `currentPrice`.
pub fn unit_price(item: &PurchasedItem) -> Result<Price, CheckoutApiError> {
    let price = item
        .price
        .or(item.current_price)
        .ok_or_else(|| CheckoutApiError::validation(format!("Item {} has no price.", item_label(item))))?;
    if price.is_negative() {
        return Err(CheckoutApiError::validation(format!("Item {} has a negative price.", item_label(item))));
    }
    Ok(price)
}

/// Absent or zero quantities count as one unit.
pub fn quantity(item: &PurchasedItem) -> u32 {
    item.quantity.unwrap_or(1).max(1)
}

/// Sums `price × quantity` over the line items. Empty baskets and totals that overflow are validation errors.
pub fn order_total(items: &[NewLineItem]) -> Result<Price, CheckoutApiError> {
    if items.is_empty() {
        return Err(CheckoutApiError::validation("Provide required data: itemsPurchased."));
    }
    items
        .iter()
        .map(NewLineItem::subtotal)
        .collect::<Option<Vec<_>>>()
        .and_then(Price::checked_sum)
        .ok_or_else(|| CheckoutApiError::validation("Order total is out of range."))
}

pub fn line_items(items: &[PurchasedItem], kind: ItemKind) -> Result<Vec<NewLineItem>, CheckoutApiError> {
    items
        .iter()
        .map(|item| {
            Ok(NewLineItem {
                title: item.title.clone().unwrap_or_default(),
                item_ref: item.id.clone(),
                kind,
                price: unit_price(item)?,
                quantity: quantity(item),
            })
        })
        .collect()
}

fn item_label(item: &PurchasedItem) -> &str {
    item.title.as_deref().or(item.id.as_deref()).unwrap_or("<unnamed>")
}
