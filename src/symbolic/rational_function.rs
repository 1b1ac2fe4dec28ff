use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use num::{BigRational, One};

use super::parameter::{Parameter, Valuation};
use super::parse::{self, ExpressionParseError};
use super::polynomial::Polynomial;

/// A quotient of two polynomials. Constant denominators are folded into the
/// numerator, so a polynomial always has denominator one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RationalFunction {
	numerator: Polynomial,
	denominator: Polynomial,
}

impl RationalFunction {
	/// Panics if `denominator` is the zero polynomial.
	pub fn new(numerator: Polynomial, denominator: Polynomial) -> Self {
		assert!(!denominator.is_zero(), "Rational function with zero denominator");
		if numerator.is_zero() {
			return Self::zero();
		}
		if let Some(value) = denominator.constant_value() {
			return Self {
				numerator: numerator.scale(&value.recip()),
				denominator: Polynomial::one(),
			};
		}
		Self {
			numerator,
			denominator,
		}
	}

	pub fn zero() -> Self {
		Self::from(Polynomial::zero())
	}

	pub fn one() -> Self {
		Self::from(Polynomial::one())
	}

	pub fn constant(value: BigRational) -> Self {
		Self::from(Polynomial::constant(value))
	}

	/// Shorthand for the constant `numerator / denominator`
	pub fn ratio(numerator: i64, denominator: i64) -> Self {
		Self::constant(BigRational::new(numerator.into(), denominator.into()))
	}

	pub fn parameter(parameter: Parameter) -> Self {
		Self::from(Polynomial::variable(parameter))
	}

	pub fn numerator(&self) -> &Polynomial {
		&self.numerator
	}

	pub fn denominator(&self) -> &Polynomial {
		&self.denominator
	}

	pub fn is_zero(&self) -> bool {
		self.numerator.is_zero()
	}

	pub fn is_one(&self) -> bool {
		self.numerator == self.denominator
	}

	/// Syntactically constant. A function such as `p/p` is not reported as
	/// constant here, but its derivative is zero.
	pub fn is_constant(&self) -> bool {
		self.numerator.is_constant() && self.denominator.is_constant()
	}

	pub fn constant_value(&self) -> Option<BigRational> {
		let numerator = self.numerator.constant_value()?;
		let denominator = self.denominator.constant_value()?;
		Some(numerator / denominator)
	}

	pub fn is_polynomial(&self) -> bool {
		self.denominator.is_one_polynomial()
	}

	pub fn variables(&self) -> BTreeSet<Parameter> {
		let mut variables = self.numerator.variables();
		variables.extend(self.denominator.variables());
		variables
	}

	pub fn contains_variable(&self, parameter: &Parameter) -> bool {
		self.numerator.contains_variable(parameter) || self.denominator.contains_variable(parameter)
	}

	/// Quotient rule: `(n'd - nd') / d^2`
	pub fn derivative(&self, parameter: &Parameter) -> Self {
		if !self.contains_variable(parameter) {
			return Self::zero();
		}
		if self.is_polynomial() {
			return Self::from(self.numerator.derivative(parameter));
		}
		let numerator = &(&self.numerator.derivative(parameter) * &self.denominator)
			- &(&self.numerator * &self.denominator.derivative(parameter));
		Self::new(numerator, &self.denominator * &self.denominator)
	}

	pub fn evaluate(&self, valuation: &Valuation) -> f64 {
		self.numerator.evaluate(valuation) / self.denominator.evaluate(valuation)
	}
}

impl Polynomial {
	fn is_one_polynomial(&self) -> bool {
		self.constant_value().is_some_and(|value| value.is_one())
	}
}

impl From<Polynomial> for RationalFunction {
	fn from(numerator: Polynomial) -> Self {
		Self {
			numerator,
			denominator: Polynomial::one(),
		}
	}
}

impl FromStr for RationalFunction {
	type Err = ExpressionParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse::read_rational_function(s)
	}
}

impl<'a> Add<&'a RationalFunction> for &'a RationalFunction {
	type Output = RationalFunction;

	fn add(self, rhs: &'a RationalFunction) -> RationalFunction {
		if self.denominator == rhs.denominator {
			return RationalFunction::new(&self.numerator + &rhs.numerator, self.denominator.clone());
		}
		RationalFunction::new(
			&(&self.numerator * &rhs.denominator) + &(&rhs.numerator * &self.denominator),
			&self.denominator * &rhs.denominator,
		)
	}
}

impl<'a> Sub<&'a RationalFunction> for &'a RationalFunction {
	type Output = RationalFunction;

	fn sub(self, rhs: &'a RationalFunction) -> RationalFunction {
		self + &(-rhs)
	}
}

impl<'a> Mul<&'a RationalFunction> for &'a RationalFunction {
	type Output = RationalFunction;

	fn mul(self, rhs: &'a RationalFunction) -> RationalFunction {
		RationalFunction::new(
			&self.numerator * &rhs.numerator,
			&self.denominator * &rhs.denominator,
		)
	}
}

impl<'a> Div<&'a RationalFunction> for &'a RationalFunction {
	type Output = RationalFunction;

	/// Panics on division by the zero function.
	fn div(self, rhs: &'a RationalFunction) -> RationalFunction {
		RationalFunction::new(
			&self.numerator * &rhs.denominator,
			&self.denominator * &rhs.numerator,
		)
	}
}

impl Neg for &RationalFunction {
	type Output = RationalFunction;

	fn neg(self) -> RationalFunction {
		RationalFunction {
			numerator: -&self.numerator,
			denominator: self.denominator.clone(),
		}
	}
}

forward_owned_binop!(Add, add, RationalFunction);
forward_owned_binop!(Sub, sub, RationalFunction);
forward_owned_binop!(Mul, mul, RationalFunction);
forward_owned_binop!(Div, div, RationalFunction);

impl fmt::Display for RationalFunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_polynomial() {
			write!(f, "{}", self.numerator)
		} else {
			write!(f, "({})/({})", self.numerator, self.denominator)
		}
	}
}
