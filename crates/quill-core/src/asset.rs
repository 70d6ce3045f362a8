//! Fixed-point asset amounts and the `Price` type used for market matching
//! and DOLLAR conversion. Grounded on the original chain's `asset.cpp`:
//! amounts are signed 64-bit integers scaled by a symbol-specific decimal
//! precision, and price comparisons cross-multiply rather than convert to
//! floating point.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::constants::{DOLLAR_PRECISION, LIQUID_PRECISION, MAX_SHARE_SUPPLY, VESTS_PRECISION};
use crate::error::QuillError;

/// The three native asset symbols. Unlike the original chain's NAI-encoded
/// symbols, this is a closed enum: no user-issued assets exist in scope.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub enum Symbol {
    Liquid,
    Dollar,
    Vests,
}

impl Symbol {
    pub fn precision(self) -> u8 {
        match self {
            Symbol::Liquid => LIQUID_PRECISION,
            Symbol::Dollar => DOLLAR_PRECISION,
            Symbol::Vests => VESTS_PRECISION,
        }
    }

    pub fn ticker(self) -> &'static str {
        match self {
            Symbol::Liquid => "LIQUID",
            Symbol::Dollar => "DOLLAR",
            Symbol::Vests => "VESTS",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

/// A fixed-point amount of one native asset. `amount` is scaled by
/// `10^symbol.precision()`; e.g. `Asset::new(1_500, Symbol::Liquid)` is
/// 1.500 LIQUID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// Validates that the amount is within the representable range. The
    /// original chain also requires non-negativity for most stored
    /// balances; evaluators that permit negative deltas (e.g. a debit
    /// before a balance check) validate that separately.
    pub fn validate(&self) -> Result<(), QuillError> {
        if self.amount.unsigned_abs() as i64 > MAX_SHARE_SUPPLY {
            return Err(QuillError::AssetOverflow);
        }
        Ok(())
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    fn check_symbol_match(&self, other: &Asset) -> Result<(), QuillError> {
        if self.symbol != other.symbol {
            return Err(QuillError::AssetSymbolMismatch {
                lhs: self.symbol,
                rhs: other.symbol,
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Asset) -> Result<Asset, QuillError> {
        self.check_symbol_match(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(QuillError::AssetOverflow)?;
        let out = Asset::new(amount, self.symbol);
        out.validate()?;
        Ok(out)
    }

    pub fn checked_sub(&self, other: &Asset) -> Result<Asset, QuillError> {
        self.check_symbol_match(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(QuillError::AssetOverflow)?;
        let out = Asset::new(amount, self.symbol);
        out.validate()?;
        Ok(out)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision() as usize;
        let scale = 10i64.pow(precision as u32);
        let whole = self.amount / scale;
        let frac = (self.amount % scale).abs();
        if precision == 0 {
            write!(f, "{} {}", whole, self.symbol.ticker())
        } else {
            write!(
                f,
                "{}.{:0width$} {}",
                whole,
                frac,
                self.symbol.ticker(),
                width = precision
            )
        }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::ops::Add for Asset {
    type Output = Asset;
    fn add(self, rhs: Asset) -> Asset {
        self.checked_add(&rhs).expect("asset addition overflow")
    }
}

impl std::ops::Sub for Asset {
    type Output = Asset;
    fn sub(self, rhs: Asset) -> Asset {
        self.checked_sub(&rhs).expect("asset subtraction overflow")
    }
}

// ── Price ─────────────────────────────────────────────────────────────────────

/// An exchange rate expressed as `base / quote`, e.g. a `LIQUID`/`DOLLAR`
/// price is how many DOLLAR one LIQUID trades for. Comparisons and
/// multiplication use `i128` cross-multiplication, never floating point,
/// matching the original chain's `price` arithmetic.
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl Price {
    pub fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }

    /// The market this price trades in, as an unordered symbol pair; used as
    /// a canonical key so `LIQUID/DOLLAR` and `DOLLAR/LIQUID` orders share
    /// one order book.
    pub fn market_pair(&self) -> (Symbol, Symbol) {
        let (a, b) = (self.base.symbol, self.quote.symbol);
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn is_null(&self) -> bool {
        self.base.amount == 0 || self.quote.amount == 0
    }

    /// Returns the reciprocal price (swaps base and quote).
    pub fn reciprocal(&self) -> Price {
        Price {
            base: self.quote,
            quote: self.base,
        }
    }

    /// Multiplies an asset amount by this price, returning an asset in the
    /// price's base symbol. `asset` must be denominated in the price's
    /// quote symbol. Rounds toward zero, matching the original's floor
    /// division, and asserts against overflow using a widening `i128`
    /// intermediate before the final cast.
    pub fn multiply(&self, asset: &Asset) -> Result<Asset, QuillError> {
        if asset.symbol != self.quote.symbol {
            return Err(QuillError::AssetSymbolMismatch {
                lhs: asset.symbol,
                rhs: self.quote.symbol,
            });
        }
        if self.quote.amount == 0 {
            return Err(QuillError::PriceDivisionByZero);
        }
        let numerator = asset.amount as i128 * self.base.amount as i128;
        let result = numerator / self.quote.amount as i128;
        if result > i64::MAX as i128 || result < i64::MIN as i128 {
            return Err(QuillError::AssetOverflow);
        }
        let out = Asset::new(result as i64, self.base.symbol);
        out.validate()?;
        Ok(out)
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_cross(other) == Ordering::Equal
    }
}
impl Eq for Price {}

impl Price {
    /// Cross-multiplication comparison: `a.base/a.quote` vs `b.base/b.quote`
    /// without ever dividing, matching the original chain's
    /// `operator<(const price&, const price&)`. Both prices must share the
    /// same (possibly swapped) market pair.
    fn cmp_cross(&self, other: &Price) -> Ordering {
        let lhs = self.base.amount as i128 * other.quote.amount as i128;
        let rhs = other.base.amount as i128 * self.quote.amount as i128;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_cross(other)
    }
}

impl fmt::Debug for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
