//! # Money Module
//!
//! Provides the `Money` type and the VAT / change calculator.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VAT-INCLUSIVE PRICES                                                   │
//! │                                                                         │
//! │  Shelf prices already contain 16% VAT. The tax component is EXTRACTED  │
//! │  by division, never added:                                              │
//! │                                                                         │
//! │    net = total / 1.16          vat = total - net                        │
//! │                                                                         │
//! │  In floating point:   850 / 1.16 = 732.7586206896552 (approximate)     │
//! │  With integer cents:  85000 / 1.16 → not an integer, must round early  │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal (28 significant digits)                     │
//! │    Full precision internally, rounded to 2 dp ONLY for display.        │
//! │    net + vat == total holds exactly, not just within tolerance.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mesha_core::money::{change_due, Money};
//!
//! let price = Money::from_major(100);
//! let total = price * 3 + Money::from_major(550);   // KSH 850.00
//!
//! let change = change_due(Money::from_major(1000), total);
//! assert_eq!(change, Some(Money::from_major(150)));
//! assert_eq!(change.unwrap().to_string(), "KSH 150.00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in Kenyan shillings.
///
/// ## Design Decisions
/// - **Decimal**: exact base-10 arithmetic, no float drift
/// - **Single field tuple struct**: zero-cost wrapper, transparent on the wire
/// - **Serialized as a string** (`"150.00"`); numbers are accepted on input
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  InventoryItem.price ──┬──► CartLine.catalog_price (negotiation band)   │
/// │                        └──► CartLine.unit_price ──► line total          │
/// │                                                                         │
/// │  Cart.total ──► vat_breakdown ──► Sale.net_amount / Sale.vat            │
/// │             └─► change_due(cash) ──► Sale.change                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(as = "String")] Decimal);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a whole-shilling amount.
    ///
    /// ```rust
    /// use mesha_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(150).to_string(), "KSH 150.00");
    /// ```
    #[inline]
    pub fn from_major(shillings: i64) -> Self {
        Money(Decimal::from(shillings))
    }

    /// Creates an amount from cents (used by tests and fixtures).
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal at full precision.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Rounds to two decimal places, midpoint away from zero.
    ///
    /// Presentation boundary only. Values flowing into further arithmetic
    /// (report totals, change) keep full precision.
    ///
    /// ```rust
    /// use mesha_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let net = Money::new(Decimal::new(7327586, 4)); // 732.7586
    /// assert_eq!(net.rounded().amount(), Decimal::new(73276, 2));
    /// ```
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `self × qty`, or `None` on overflow.
    #[inline]
    pub fn checked_mul(self, qty: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// Sums `amounts`, or `None` if any partial sum overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Formats as a bare two-decimal number (`"150.00"`), without currency.
    pub fn to_plain_string(&self) -> String {
        format!("{:.2}", self.rounded().0)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display uses the shop's receipt format: `KSH 150.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KSH {}", self.to_plain_string())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a cart quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1600 bps = 16%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as an exact fraction (`0.16` for 1600 bps).
    pub fn fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// The rate as a display percentage (`16.00` for 1600 bps).
    pub fn percentage(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

/// Kenyan standard VAT, included in every shelf price.
pub const VAT_RATE: TaxRate = TaxRate::from_bps(1600);

// =============================================================================
// VAT Calculator
// =============================================================================

/// A VAT-inclusive total split into its net and tax components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatBreakdown {
    /// VAT-exclusive amount, `total / (1 + r)`.
    pub net: Money,
    /// Tax component, `total - net`.
    pub vat: Money,
    /// The VAT-inclusive total that was split.
    pub total: Money,
}

/// Extracts net amount and VAT from a VAT-inclusive total.
///
/// ## User Workflow
/// ```text
/// Cart total: KSH 850.00 (prices include VAT)
///      │
///      ▼
/// vat_breakdown(850, 16%) ← THIS FUNCTION
///      │
///      ├──► net = 850 / 1.16 = 732.7586...
///      └──► vat = 850 - net  = 117.2413...
///      │
///      ▼
/// Receipt: TOTAL TAXABLE A 732.76 / TOTAL TAX A 117.24
/// ```
///
/// `vat` is derived by subtraction, so `net + vat == total` exactly.
pub fn vat_breakdown(total: Money, rate: TaxRate) -> VatBreakdown {
    let divisor = Decimal::ONE + rate.fraction();
    let net = Money(total.0 / divisor);
    VatBreakdown {
        net,
        vat: total - net,
        total,
    }
}

/// Change owed to a cash customer, or `None` when the cash does not cover
/// the total.
///
/// ```rust
/// use mesha_core::money::{change_due, Money};
///
/// assert_eq!(change_due(Money::from_major(800), Money::from_major(850)), None);
/// assert_eq!(
///     change_due(Money::from_major(850), Money::from_major(850)),
///     Some(Money::zero())
/// );
/// ```
pub fn change_due(cash_received: Money, total: Money) -> Option<Money> {
    if cash_received >= total {
        Some(cash_received - total)
    } else {
        None
    }
}

// =============================================================================
// Stock Display
// =============================================================================

/// Formats a (possibly fractional) stock quantity for display: at most three
/// decimal places, trailing zeros trimmed.
///
/// ```rust
/// use mesha_core::money::format_stock;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_stock(Decimal::new(2500, 3)), "2.5");
/// assert_eq!(format_stock(Decimal::new(3000, 3)), "3");
/// assert_eq!(format_stock(Decimal::new(12345, 4)), "1.235");
/// ```
pub fn format_stock(stock: Decimal) -> String {
    stock
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
