use num_bigint::BigUint;
use num_traits::Zero;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

const ETHER_DECIMALS: usize = 18;

/// An integer amount of wei. Every stake and reward figure is summed in wei
/// and only rendered to an ether string when written out.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Wei(BigUint);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountError(String);

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid amount {:?}", self.0)
    }
}

impl std::error::Error for AmountError {}

impl Wei {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Parses a decimal ether string such as `"1.5"` back into wei.
    pub fn from_ether_str(value: &str) -> Result<Self, AmountError> {
        let trimmed = value.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if fraction.len() > ETHER_DECIMALS
            || (whole.is_empty() && fraction.is_empty())
            || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
        {
            return Err(AmountError(value.to_string()));
        }
        let digits = format!(
            "{}{:0<width$}",
            if whole.is_empty() { "0" } else { whole },
            fraction,
            width = ETHER_DECIMALS
        );
        BigUint::from_str(&digits)
            .map(Self)
            .map_err(|_| AmountError(value.to_string()))
    }

    /// Renders the amount in ether with trailing zeros trimmed.
    pub fn to_ether_string(&self) -> String {
        let digits = self.0.to_str_radix(10);
        let padded = format!("{:0>width$}", digits, width = ETHER_DECIMALS + 1);
        let (whole, fraction) = padded.split_at(padded.len() - ETHER_DECIMALS);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, fraction)
        }
    }
}

impl FromStr for Wei {
    type Err = AmountError;

    /// Parses a raw integer wei string as served by the subgraph.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.trim().trim_matches('"');
        if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountError(s.to_string()));
        }
        BigUint::from_str(cleaned)
            .map(Self)
            .map_err(|_| AmountError(s.to_string()))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Wei {
    type Output = Wei;

    fn add(self, rhs: Wei) -> Wei {
        Wei(self.0 + rhs.0)
    }
}

impl<'a> AddAssign<&'a Wei> for Wei {
    fn add_assign(&mut self, rhs: &'a Wei) {
        self.0 += &rhs.0;
    }
}

impl Sum for Wei {
    fn sum<I: Iterator<Item = Wei>>(iter: I) -> Self {
        iter.fold(Wei::zero(), Add::add)
    }
}
