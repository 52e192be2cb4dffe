use crate::parser::{Rule, ValueParser};
use crate::{GnucashError, Result};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use pest::Parser;

use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// An exact rational amount, as GnuCash stores `value`, `quantity` and prices.
///
/// Decoded from the `numerator/denominator` text form without ever passing
/// through floating point, so `150/100` and `3/2` compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Numeric(BigRational);

impl Numeric {
    /// Decodes `"<integer>/<integer>"`.
    pub fn parse(s: &str) -> Result<Numeric> {
        let malformed = || GnucashError::MalformedNumber(s.to_string());

        let numeric = ValueParser::parse(Rule::numeric, s.trim())
            .map_err(|_| malformed())?
            .next()
            .ok_or_else(malformed)?;
        let mut parts = numeric
            .into_inner()
            .filter(|p| p.as_rule() == Rule::integer)
            .map(|p| BigInt::from_str(p.as_str()));

        let numer = parts.next().ok_or_else(malformed)?.map_err(|_| malformed())?;
        let denom = parts.next().ok_or_else(malformed)?.map_err(|_| malformed())?;
        if denom.is_zero() {
            return Err(malformed());
        }

        Ok(Numeric(BigRational::new(numer, denom)))
    }

    pub fn zero() -> Numeric {
        Numeric(BigRational::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }
}

impl FromStr for Numeric {
    type Err = GnucashError;

    fn from_str(s: &str) -> Result<Numeric> {
        Numeric::parse(s)
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Numeric {
        Numeric(BigRational::from_integer(BigInt::from(n)))
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.numer(), self.0.denom())
    }
}

impl std::ops::Add<&Numeric> for &Numeric {
    type Output = Numeric;

    fn add(self, rhs: &Numeric) -> Self::Output {
        Numeric(&self.0 + &rhs.0)
    }
}

impl std::ops::Sub<&Numeric> for &Numeric {
    type Output = Numeric;

    fn sub(self, rhs: &Numeric) -> Self::Output {
        self + &(-rhs)
    }
}

impl std::ops::Mul<&Numeric> for &Numeric {
    type Output = Numeric;

    fn mul(self, rhs: &Numeric) -> Self::Output {
        Numeric(&self.0 * &rhs.0)
    }
}

impl std::ops::Neg for &Numeric {
    type Output = Numeric;

    fn neg(self) -> Self::Output {
        Numeric(-&self.0)
    }
}

impl<'a> Sum<&'a Numeric> for Numeric {
    fn sum<I: Iterator<Item = &'a Numeric>>(iter: I) -> Numeric {
        iter.fold(Numeric::zero(), |acc, n| &acc + n)
    }
}

#[cfg(test)]
mod tests {
    use crate::amount::Numeric;
    use crate::GnucashError;

    use anyhow::Result;

    #[test]
    fn parse_numeric() -> Result<()> {
        let n = Numeric::parse("15000/100")?;
        assert_eq!(n, Numeric::from(150));
        assert_eq!(n.to_string(), "150/1");

        let negative = Numeric::parse("-4599/100")?;
        assert!(negative.is_negative());
        assert_eq!(negative.numer().to_string(), "-4599");
        assert_eq!(negative.denom().to_string(), "100");
        Ok(())
    }

    #[test]
    fn equal_ratios_compare_equal() -> Result<()> {
        assert_eq!(Numeric::parse("150/100")?, Numeric::parse("3/2")?);
        assert_eq!(Numeric::parse(" 6/-4 ")?, Numeric::parse("-3/2")?);
        Ok(())
    }

    #[test]
    fn exact_thirds() -> Result<()> {
        let third = Numeric::parse("1/3")?;
        let sum: Numeric = [third.clone(), third.clone(), third].iter().sum();
        assert_eq!(sum, Numeric::from(1));
        Ok(())
    }

    #[test]
    fn huge_operands_stay_exact() -> Result<()> {
        let big = Numeric::parse("123456789012345678901234567890/1")?;
        let back = &(&big - &Numeric::from(1)) + &Numeric::from(1);
        assert_eq!(back, big);
        Ok(())
    }

    #[test]
    fn malformed_numbers() {
        for input in ["", "12", "1/2/3", "a/2", "1/b", "1.5/2", "1/0", "/", "1 / 2"] {
            match Numeric::parse(input) {
                Err(GnucashError::MalformedNumber(s)) => assert_eq!(s, input),
                other => panic!("`{}' decoded to {:?}", input, other),
            }
        }
    }

    #[test]
    fn sub_op_numeric() -> Result<()> {
        let a = Numeric::parse("1530000/100")?;
        let b = Numeric::parse("1196050/100")?;
        assert_eq!(&a - &b, Numeric::parse("333950/100")?);
        assert_eq!((&b - &a).to_string(), "-6679/2");
        Ok(())
    }
}
