use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::op;

/// Currency that shop prices and order totals are denominated in.
pub const SHOP_CURRENCY_CODE: &str = "BTC";
/// Currency that card charges are created in.
pub const CARD_CURRENCY_CODE: &str = "usd";

//--------------------------------------       Price         ---------------------------------------------------------
/// A decimal amount in the shop currency.
///
/// Prices are carried as exact decimals end to end. They are stored as TEXT in the database and accepted as either
/// JSON numbers or strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

op!(binary Price, Add, add);
op!(binary Price, Sub, sub);
op!(inplace Price, AddAssign, add_assign);
op!(unary Price, Neg, neg);

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Fixed-point rendering used in receipts and notifications, e.g. `0.0400`
    pub fn to_fixed(&self, places: usize) -> String {
        format!("{:.*}", places, self.0)
    }

    /// `price × quantity`, or `None` if the result cannot be represented.
    pub fn checked_mul(&self, quantity: u32) -> Option<Price> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    pub fn checked_add(&self, other: Price) -> Option<Price> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sums the prices, returning `None` on overflow. An empty iterator sums to zero.
    pub fn checked_sum<I: IntoIterator<Item = Price>>(prices: I) -> Option<Price> {
        prices.into_iter().try_fold(Self::zero(), |acc, p| acc.checked_add(p))
    }
}


impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Price {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a price: {0}")]
pub struct PriceConversionError(String);

impl FromStr for Price {
    type Err = PriceConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self).map_err(|e| PriceConversionError(format!("{s}. {e}")))
    }
}

impl TryFrom<String> for Price {
    type Error = PriceConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

//--------------------------------------       Cents         ---------------------------------------------------------
/// An amount in the minor unit of the card currency, as the card processor expects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}¢", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn price_arithmetic() {
        let items = [p("0.01").checked_mul(2).unwrap(), p("0.02").checked_mul(1).unwrap()];
        let total = Price::checked_sum(items).unwrap();
        assert_eq!(total, p("0.04"));
        assert_eq!(total.to_fixed(4), "0.0400");
        assert_eq!(total.to_string(), "0.04");
        let mut acc = Price::zero();
        acc += p("1.5");
        assert_eq!(acc - p("0.5"), Price::from(1i64));
        assert!((-acc).is_negative());
        assert!(!Price::zero().is_negative());
    }

    #[test]
    fn overflowing_arithmetic_is_none() {
        let huge = p("79228162514264337593543950");
        assert!(huge.checked_mul(u32::MAX).is_none());
        assert_eq!(huge.checked_mul(1), Some(huge));
        let max = Price::new(Decimal::MAX);
        assert!(max.checked_add(p("1")).is_none());
        assert!(Price::checked_sum([max, max]).is_none());
        assert_eq!(Price::checked_sum(Vec::new()), Some(Price::zero()));
    }

    #[test]
    fn price_parsing() {
        assert_eq!(Price::try_from("0.0001".to_string()).unwrap(), p("0.0001"));
        assert!(Price::try_from("lots".to_string()).is_err());
        let from_number: Price = serde_json::from_str("0.01").unwrap();
        let from_string: Price = serde_json::from_str("\"0.01\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn cents() {
        let c = Cents::from(2500) + Cents::from(1);
        assert_eq!(c.value(), 2501);
        assert!(c.is_positive());
        assert!(!Cents::from(0).is_positive());
        assert_eq!(serde_json::to_string(&c).unwrap(), "2501");
    }
}
