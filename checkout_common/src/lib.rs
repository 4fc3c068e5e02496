mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Cents, Price, PriceConversionError, CARD_CURRENCY_CODE, SHOP_CURRENCY_CODE};
pub use secret::Secret;
