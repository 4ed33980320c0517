//! Fixed-precision vote arithmetic.
//!
//! STV surplus transfers split ballots fractionally. To keep quota
//! comparisons exact and reproducible across platforms, vote weights are
//! integers counting hundred-thousandths of a vote rather than floats.

use std::fmt::Display;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Number of weight units in one whole vote (5 decimal places).
const UNITS_PER_VOTE: u64 = 100_000;

/// A vote weight with 5 decimal places of precision.
///
/// Whole-ballot arithmetic (IRV, PBV, full-weight STV transfers) stays on
/// exact multiples of one vote; only STV surplus portions produce
/// fractional values, and those floor toward zero on the unit grid.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct Weight(u64);

impl Weight {
    pub const ZERO: Weight = Weight(0);
    pub const ONE: Weight = Weight(UNITS_PER_VOTE);

    /// Weight of `n` whole ballots.
    pub fn from_ballots(n: u64) -> Weight {
        Weight(n * UNITS_PER_VOTE)
    }

    /// Number of whole votes, fractions truncated.
    pub fn whole_votes(self) -> u64 {
        self.0 / UNITS_PER_VOTE
    }

    /// Raw unit count (hundred-thousandths of a vote).
    pub fn units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The portion of this weight carried over by a surplus transfer:
    /// `self * surplus / total`, floored on the unit grid.
    ///
    /// Invariant: `surplus <= total` and `total > 0`, so the result never
    /// exceeds `self`.
    pub fn surplus_portion(self, surplus: Weight, total: Weight) -> Weight {
        debug_assert!(surplus <= total && !total.is_zero());
        let units = (self.0 as u128 * surplus.0 as u128) / total.0 as u128;
        Weight(units as u64)
    }

    /// `self - rhs`, stopping at zero. Used where rounding dust could
    /// otherwise underflow an exact subtraction.
    pub fn saturating_sub(self, rhs: Weight) -> Weight {
        Weight(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Weight {
    type Output = Weight;
    fn add(self, rhs: Weight) -> Weight {
        Weight(self.0 + rhs.0)
    }
}

impl AddAssign for Weight {
    fn add_assign(&mut self, rhs: Weight) {
        self.0 += rhs.0;
    }
}

impl Sub for Weight {
    type Output = Weight;
    fn sub(self, rhs: Weight) -> Weight {
        Weight(self.0 - rhs.0)
    }
}

impl SubAssign for Weight {
    fn sub_assign(&mut self, rhs: Weight) {
        self.0 -= rhs.0;
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Weight(iter.map(|w| w.0).sum())
    }
}

impl Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / UNITS_PER_VOTE;
        let frac = self.0 % UNITS_PER_VOTE;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:05}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}
