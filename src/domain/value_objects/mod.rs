//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use uuid::Uuid;

/// Number of Rupiah in one stored price unit.
pub const RUPIAH_PER_UNIT: i64 = 1000;

/// Price value object.
///
/// Amounts are kept in the stored unit, thousands of Rupiah: `Price::from(15)`
/// is Rp 15.000. All arithmetic stays in the stored unit; only [`fmt::Display`]
/// and [`Price::to_rupiah`] scale up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_negative(&self) -> bool { self.0.is_sign_negative() && !self.0.is_zero() }

    /// Clamps negative amounts to zero.
    pub fn non_negative(self) -> Self { if self.is_negative() { Self::ZERO } else { self } }

    pub fn times(&self, quantity: u32) -> Price { Price(self.0 * Decimal::from(quantity)) }

    /// Whole Rupiah, rounded half away from zero.
    pub fn to_rupiah(&self) -> Decimal {
        (self.0 * Decimal::from(RUPIAH_PER_UNIT)).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self { Self(amount) }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self { Self(Decimal::from(amount)) }
}

impl std::ops::Add for Price {
    type Output = Price;
    fn add(self, rhs: Price) -> Price { Price(self.0 + rhs.0) }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price { iter.fold(Price::ZERO, |acc, p| acc + p) }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rupiah = self.to_rupiah();
        let sign = if rupiah.is_sign_negative() && !rupiah.is_zero() { "-" } else { "" };
        write!(f, "{sign}Rp {}", group_thousands(&rupiah.abs().trunc().to_string()))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Short, human-readable order reference: the first eight characters of the
/// order id, uppercased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderRef(String);

impl OrderRef {
    pub const LEN: usize = 8;

    pub fn from_order_id(id: &Uuid) -> Self {
        Self(id.hyphenated().to_string().chars().take(Self::LEN).collect::<String>().to_uppercase())
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
