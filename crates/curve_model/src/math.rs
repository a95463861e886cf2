//! Linear bonding-curve math (p(k) = a + b·k per pricing unit)

use crate::CurveError;

/// Largest pricing unit; keeps `unit²` inside u128 for the partial-step product
pub const MAX_UNIT: u128 = 1 << 64;

/// Linear price curve
///
/// Prices are quoted in capital base units per `unit` token base units, and
/// move once per `unit` sold: with `k = ⌊s / unit⌋` whole units sold, the next
/// unit costs `a + b·k`. A partial unit is charged pro rata, rounded up. With
/// `unit = 1` this is the plain per-base-unit law `p(s) = a + b·s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearCurve {
    /// Price of the very first unit (`a`)
    pub base_price: u128,
    /// Price increase per whole unit sold (`b`)
    pub slope: u128,
    /// Token base units covered by one quoted price (10^decimals for whole tokens)
    pub unit: u128,
}

/// Outcome of spending a payment against the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Base units purchasable
    pub tokens: u128,
    /// Exact cost of those units
    pub cost: u128,
    /// Unspent part of the payment (`payment - cost`)
    pub remainder: u128,
}

impl LinearCurve {
    pub const fn new(base_price: u128, slope: u128) -> Self {
        Self {
            base_price,
            slope,
            unit: 1,
        }
    }

    pub const fn with_unit(self, unit: u128) -> Self {
        Self { unit, ..self }
    }

    /// A curve with `a = b = 0` would hand out unlimited supply for free
    pub fn validate(&self) -> Result<(), CurveError> {
        if self.base_price == 0 && self.slope == 0 {
            return Err(CurveError::InvalidCurve);
        }
        if self.unit == 0 || self.unit > MAX_UNIT {
            return Err(CurveError::InvalidCurve);
        }
        Ok(())
    }

    /// Spot price of the unit containing base unit `supply`
    pub fn price_at(&self, supply: u128) -> Result<u128, CurveError> {
        let steps = supply.checked_div(self.unit).ok_or(CurveError::InvalidCurve)?;
        self.slope
            .checked_mul(steps)
            .and_then(|v| v.checked_add(self.base_price))
            .ok_or(CurveError::Overflow)
    }

    /// Total charged to move supply from 0 to `supply`
    ///
    /// # Formula
    /// With `supply = k·unit + r`:
    /// I = a·k + b·k·(k - 1) / 2 + ⌈r·(a + b·k) / unit⌉
    ///
    /// `k·(k - 1)` is always even, so the halving is exact. I is
    /// non-decreasing in `supply`.
    pub fn integral(&self, supply: u128) -> Result<u128, CurveError> {
        let steps = supply.checked_div(self.unit).ok_or(CurveError::InvalidCurve)?;
        let partial = supply % self.unit;

        let mut total = self.base_price.checked_mul(steps).ok_or(CurveError::Overflow)?;

        // A flat curve never needs the triangle, which overflows long before a·k does
        if self.slope != 0 && steps > 1 {
            let triangle = if steps % 2 == 0 {
                (steps / 2).checked_mul(steps - 1)
            } else {
                steps.checked_mul((steps - 1) / 2)
            }
            .ok_or(CurveError::Overflow)?;
            total = self
                .slope
                .checked_mul(triangle)
                .and_then(|v| total.checked_add(v))
                .ok_or(CurveError::Overflow)?;
        }

        if partial != 0 {
            let price = self.price_at(supply)?;
            let share = mul_div_ceil(partial, price, self.unit)?;
            total = total.checked_add(share).ok_or(CurveError::Overflow)?;
        }
        Ok(total)
    }

    /// Cost to move supply from `s0` to `s1`
    ///
    /// `integral(s1) - integral(s0)`, so costs are exactly additive over
    /// adjacent ranges and a sell refunds precisely what the matching buy paid.
    pub fn cost(&self, s0: u128, s1: u128) -> Result<u128, CurveError> {
        if s1 < s0 {
            return Err(CurveError::InvalidRange);
        }
        if s1 == s0 {
            return Ok(0);
        }
        let high = self.integral(s1)?;
        let low = self.integral(s0)?;
        high.checked_sub(low).ok_or(CurveError::Overflow)
    }

    /// Cost of buying `amount` base units starting at `supply`
    pub fn quote_buy(&self, supply: u128, amount: u128) -> Result<u128, CurveError> {
        if amount == 0 {
            return Err(CurveError::InvalidAmount);
        }
        let end = supply.checked_add(amount).ok_or(CurveError::Overflow)?;
        self.cost(supply, end)
    }

    /// Payout for selling `amount` base units back at `supply`
    ///
    /// Exactly the inverse of [`LinearCurve::quote_buy`] over the same range.
    pub fn quote_sell(&self, supply: u128, amount: u128) -> Result<u128, CurveError> {
        if amount == 0 {
            return Err(CurveError::InvalidAmount);
        }
        if amount > supply {
            return Err(CurveError::InsufficientSupply);
        }
        self.cost(supply - amount, supply)
    }

    /// Largest fill purchasable with `payment` starting at `supply`
    ///
    /// For a flat per-base-unit curve this is `payment / a`. Otherwise the
    /// affordable range is bracketed by doubling and then bisected. A range
    /// whose integral overflows u128 counts as unaffordable.
    pub fn fill_for_payment(&self, supply: u128, payment: u128) -> Result<Fill, CurveError> {
        self.validate()?;
        if payment == 0 {
            return Err(CurveError::InvalidAmount);
        }

        let headroom = u128::MAX - supply;
        let tokens = if self.slope == 0 && self.unit == 1 {
            let n = payment / self.base_price;
            if n > headroom {
                return Err(CurveError::Overflow);
            }
            n
        } else {
            self.max_affordable(supply, payment, headroom)
        };

        if tokens == 0 {
            return Err(CurveError::PaymentTooSmall);
        }

        let cost = self.cost(supply, supply + tokens)?;
        Ok(Fill {
            tokens,
            cost,
            remainder: payment - cost,
        })
    }

    /// Largest n in [0, headroom] with cost(s, s+n) <= payment
    fn max_affordable(&self, supply: u128, payment: u128, headroom: u128) -> u128 {
        let affordable = |n: u128| matches!(self.cost(supply, supply + n), Ok(c) if c <= payment);

        // Bracket: lo affordable, hi not
        let mut lo = 0u128;
        let mut hi = 1u128;
        loop {
            if hi >= headroom {
                if affordable(headroom) {
                    return headroom;
                }
                hi = headroom;
                break;
            }
            if !affordable(hi) {
                break;
            }
            lo = hi;
            hi = hi.saturating_mul(2);
        }

        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if affordable(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

/// ⌈x·y / d⌉ for `x < d <= MAX_UNIT`
fn mul_div_ceil(x: u128, y: u128, d: u128) -> Result<u128, CurveError> {
    let whole = x.checked_mul(y / d).ok_or(CurveError::Overflow)?;
    let rest = x.checked_mul(y % d).ok_or(CurveError::Overflow)?;
    whole.checked_add(rest.div_ceil(d)).ok_or(CurveError::Overflow)
}

/// Integer square root (floor)
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    // Newton iteration from an upper bound converges monotonically downward
    let mut x = 1u128 << ((128 - n.leading_zeros() + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}
