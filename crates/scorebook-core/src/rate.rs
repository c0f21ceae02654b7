// Three-decimal rate values (AVG, OBP, SLG and situational averages).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative rate rounded to exactly three decimal places.
///
/// Stored as an integer count of thousandths so that equal inputs always
/// produce bit-identical output, and displayed with trailing zeros kept
/// (`0.300`, never `0.3`). Serializes as that fixed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rate {
    thousandths: u32,
}

impl Rate {
    pub const ZERO: Rate = Rate { thousandths: 0 };

    /// `numerator / denominator` rounded to three decimals.
    ///
    /// Matches rounding the `f64` quotient to three places: values off the
    /// halfway point round to nearest, and a halfway case goes the way the
    /// nearest `f64` lies (to even when that `f64` is exact). A zero
    /// denominator yields [`Rate::ZERO`].
    pub fn ratio(numerator: u32, denominator: u32) -> Self {
        if denominator == 0 {
            return Rate::ZERO;
        }
        let scaled = u64::from(numerator) * 1000;
        let den = u64::from(denominator);
        let mut thousandths = scaled / den;
        let round_up = match ((scaled % den) * 2).cmp(&den) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => tie_rounds_up(numerator, denominator, thousandths),
        };
        if round_up {
            thousandths += 1;
        }
        Rate {
            thousandths: u32::try_from(thousandths).unwrap_or(u32::MAX),
        }
    }

    /// Build a rate from a stored floating-point value (e.g. a REAL column).
    ///
    /// Negative and non-finite values clamp to zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Rate::ZERO;
        }
        let thousandths = (value * 1000.0).round();
        Rate {
            thousandths: if thousandths >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                thousandths as u32
            },
        }
    }

    pub fn from_thousandths(thousandths: u32) -> Self {
        Rate { thousandths }
    }

    pub fn thousandths(&self) -> u32 {
        self.thousandths
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.thousandths) / 1000.0
    }
}

/// Decide a quotient that lies exactly halfway between `thousandths` and
/// `thousandths + 1` (in thousandths).
///
/// The nearest `f64` to the quotient is compared exactly against the
/// halfway value `(2 * thousandths + 1) / 2000`. If the `f64` is the halfway
/// value itself (only when it reduces to a power-of-two denominator, e.g.
/// 1/16) the tie goes to the even thousandth; otherwise the side the `f64`
/// landed on wins (1/80 is stored as 0.01250000000000000069 and rounds up).
fn tie_rounds_up(numerator: u32, denominator: u32, thousandths: u64) -> bool {
    let quotient = f64::from(numerator) / f64::from(denominator);
    let bits = quotient.to_bits();
    // A tie needs a non-zero numerator, and numerator/denominator is never
    // below 2^-32, so the quotient is a normal number below 2^33.
    let biased_exp = ((bits >> 52) & 0x7ff) as u32;
    let mantissa = u128::from((bits & ((1u64 << 52) - 1)) | (1u64 << 52));
    // quotient == mantissa / 2^shift
    let shift = 1075 - biased_exp;

    let lhs = mantissa * 2000;
    let rhs = u128::from(2 * thousandths + 1) << shift;
    match lhs.cmp(&rhs) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => thousandths % 2 == 1,
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.thousandths / 1000, self.thousandths % 1000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rate value: {0:?}")]
pub struct ParseRateError(pub String);

impl FromStr for Rate {
    type Err = ParseRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ParseRateError(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ParseRateError(s.to_string()));
        }
        Ok(Rate::from_f64(value))
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
