use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Exact rational time scalar.
///
/// All timeline positions and durations in Prevue are rationals so that frame
/// boundaries at e.g. 30000/1001 fps stay exact no matter how far down the
/// timeline they are. Values are always stored normalized (positive
/// denominator, reduced by gcd, zero as 0/1), so derived equality and hashing
/// are value-based.
///
/// Zero handling follows the media convention: any value constructed with a
/// zero denominator is zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rational {
    num: i64,
    den: i64,
}

impl Rational {
    /// 0/1.
    pub const ZERO: Rational = Rational { num: 0, den: 1 };

    /// Largest representable time; used as the open upper bound in
    /// "everything from here on" ranges.
    pub const MAX: Rational = Rational { num: i64::MAX, den: 1 };

    /// Construct a normalized rational. A zero denominator yields zero.
    pub fn new(num: i64, den: i64) -> Rational {
        reduced(num as i128, den as i128)
    }

    /// Numerator of the normalized form.
    pub fn num(self) -> i64 {
        self.num
    }

    /// Denominator of the normalized form (always > 0).
    pub fn den(self) -> i64 {
        self.den
    }

    /// True iff this value is exactly zero.
    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    /// Absolute value.
    pub fn abs(self) -> Rational {
        Rational {
            num: self.num.saturating_abs(),
            den: self.den,
        }
    }

    /// Lossy conversion for display and diagnostics only.
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Start of the frame containing `self`, on a grid of `timebase`-sized
    /// frames anchored at zero (floor snap).
    ///
    /// A non-positive `timebase` returns `self` unchanged.
    pub fn snapped_to_timebase(self, timebase: Rational) -> Rational {
        if timebase.num <= 0 {
            return self;
        }

        // self / timebase, floored toward negative infinity.
        let n = self.num as i128 * timebase.den as i128;
        let d = self.den as i128 * timebase.num as i128;
        let frames = n.div_euclid(d);

        reduced(frames * timebase.num as i128, timebase.den as i128)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::ZERO
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Rational { num: value, den: 1 }
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        reduced(
            self.num as i128 * rhs.den as i128 + rhs.num as i128 * self.den as i128,
            self.den as i128 * rhs.den as i128,
        )
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        self + (-rhs)
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        reduced(
            self.num as i128 * rhs.num as i128,
            self.den as i128 * rhs.den as i128,
        )
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational {
            num: self.num.saturating_neg(),
            den: self.den,
        }
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Rational) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Rational) -> Ordering {
        // Denominators are positive, so cross multiplication preserves order.
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn reduced(num: i128, den: i128) -> Rational {
    if den == 0 || num == 0 {
        return Rational::ZERO;
    }

    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let g = gcd(num.unsigned_abs(), den as u128) as i128;
    let (num, den) = (num / g, den / g);

    // Values this large only arise from arithmetic against Rational::MAX;
    // clamp rather than wrap so ordering stays sane.
    if num > i64::MAX as i128 {
        return Rational::MAX;
    }
    if num < i64::MIN as i128 {
        return Rational {
            num: i64::MIN,
            den: 1,
        };
    }

    Rational {
        num: num as i64,
        den: den.min(i64::MAX as i128) as i64,
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/rational.rs"]
mod tests;
