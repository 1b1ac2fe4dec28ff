use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num::{BigRational, One, Signed, ToPrimitive, Zero};

use super::parameter::{Parameter, Valuation};

/// Maps each parameter of a monomial to its (positive) exponent. The empty
/// monomial is the constant term.
pub type Monomial = BTreeMap<Parameter, u32>;

/// A multivariate polynomial with exact rational coefficients. Zero
/// coefficients are never stored, so structural equality is equality of
/// polynomials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Polynomial {
	terms: BTreeMap<Monomial, BigRational>,
}

impl Polynomial {
	pub fn zero() -> Self {
		Self::default()
	}

	pub fn one() -> Self {
		Self::constant(BigRational::one())
	}

	pub fn constant(value: BigRational) -> Self {
		let mut polynomial = Self::zero();
		polynomial.add_term(Monomial::new(), value);
		polynomial
	}

	pub fn variable(parameter: Parameter) -> Self {
		let mut polynomial = Self::zero();
		polynomial.add_term(Monomial::from([(parameter, 1)]), BigRational::one());
		polynomial
	}

	pub fn is_zero(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn is_constant(&self) -> bool {
		self.terms.keys().all(|monomial| monomial.is_empty())
	}

	/// The value of a constant polynomial, `None` if it mentions a parameter
	pub fn constant_value(&self) -> Option<BigRational> {
		if !self.is_constant() {
			return None;
		}
		Some(
			self.terms
				.get(&Monomial::new())
				.cloned()
				.unwrap_or_else(BigRational::zero),
		)
	}

	pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
		self.terms.iter()
	}

	pub fn variables(&self) -> BTreeSet<Parameter> {
		self.terms
			.keys()
			.flat_map(|monomial| monomial.keys().cloned())
			.collect()
	}

	pub fn contains_variable(&self, parameter: &Parameter) -> bool {
		self.terms.keys().any(|monomial| monomial.contains_key(parameter))
	}

	/// Whether the polynomial has a positive and/or a negative coefficient
	pub fn coefficient_signs(&self) -> (bool, bool) {
		let positive = self.terms.values().any(|c| c.is_positive());
		let negative = self.terms.values().any(|c| c.is_negative());
		(positive, negative)
	}

	fn add_term(&mut self, monomial: Monomial, coefficient: BigRational) {
		if coefficient.is_zero() {
			return;
		}
		let sum = match self.terms.remove(&monomial) {
			Some(existing) => existing + coefficient,
			None => coefficient,
		};
		if !sum.is_zero() {
			self.terms.insert(monomial, sum);
		}
	}

	pub fn scale(&self, factor: &BigRational) -> Self {
		let mut scaled = Self::zero();
		for (monomial, coefficient) in self.terms.iter() {
			scaled.add_term(monomial.clone(), coefficient * factor);
		}
		scaled
	}

	/// Partial derivative with respect to `parameter`
	pub fn derivative(&self, parameter: &Parameter) -> Self {
		let mut result = Self::zero();
		for (monomial, coefficient) in self.terms.iter() {
			let exponent = match monomial.get(parameter) {
				Some(&e) => e,
				None => continue,
			};
			let mut reduced = monomial.clone();
			if exponent == 1 {
				reduced.remove(parameter);
			} else {
				reduced.insert(parameter.clone(), exponent - 1);
			}
			result.add_term(reduced, coefficient * BigRational::from_integer(exponent.into()));
		}
		result
	}

	/// Evaluates at a valuation. Parameters missing from the valuation yield NaN.
	pub fn evaluate(&self, valuation: &Valuation) -> f64 {
		self.terms
			.iter()
			.map(|(monomial, coefficient)| {
				let c = coefficient.to_f64().unwrap_or(f64::NAN);
				monomial.iter().fold(c, |acc, (parameter, exponent)| {
					let value = valuation.get(parameter).copied().unwrap_or(f64::NAN);
					acc * value.powi(*exponent as i32)
				})
			})
			.sum()
	}
}

fn multiply_monomials(left: &Monomial, right: &Monomial) -> Monomial {
	let mut product = left.clone();
	for (parameter, exponent) in right.iter() {
		*product.entry(parameter.clone()).or_insert(0) += exponent;
	}
	product
}

impl<'a> Add<&'a Polynomial> for &'a Polynomial {
	type Output = Polynomial;

	fn add(self, rhs: &'a Polynomial) -> Polynomial {
		let mut sum = self.clone();
		for (monomial, coefficient) in rhs.terms.iter() {
			sum.add_term(monomial.clone(), coefficient.clone());
		}
		sum
	}
}

impl<'a> Sub<&'a Polynomial> for &'a Polynomial {
	type Output = Polynomial;

	fn sub(self, rhs: &'a Polynomial) -> Polynomial {
		let mut difference = self.clone();
		for (monomial, coefficient) in rhs.terms.iter() {
			difference.add_term(monomial.clone(), -coefficient.clone());
		}
		difference
	}
}

impl<'a> Mul<&'a Polynomial> for &'a Polynomial {
	type Output = Polynomial;

	fn mul(self, rhs: &'a Polynomial) -> Polynomial {
		let mut product = Polynomial::zero();
		for (left_monomial, left_coefficient) in self.terms.iter() {
			for (right_monomial, right_coefficient) in rhs.terms.iter() {
				product.add_term(
					multiply_monomials(left_monomial, right_monomial),
					left_coefficient * right_coefficient,
				);
			}
		}
		product
	}
}

impl Neg for &Polynomial {
	type Output = Polynomial;

	fn neg(self) -> Polynomial {
		self.scale(&-BigRational::one())
	}
}

forward_owned_binop!(Add, add, Polynomial);
forward_owned_binop!(Sub, sub, Polynomial);
forward_owned_binop!(Mul, mul, Polynomial);

impl fmt::Display for Polynomial {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_zero() {
			return write!(f, "0");
		}
		for (i, (monomial, coefficient)) in self.terms.iter().enumerate() {
			let magnitude = coefficient.abs();
			if i == 0 {
				if coefficient.is_negative() {
					write!(f, "-")?;
				}
			} else if coefficient.is_negative() {
				write!(f, " - ")?;
			} else {
				write!(f, " + ")?;
			}
			let factors = monomial
				.iter()
				.map(|(parameter, exponent)| match exponent {
					1 => parameter.to_string(),
					_ => format!("{}^{}", parameter, exponent),
				})
				.collect::<Vec<_>>();
			if factors.is_empty() {
				write!(f, "{}", magnitude)?;
			} else if magnitude.is_one() {
				write!(f, "{}", factors.join("*"))?;
			} else {
				write!(f, "{}*{}", magnitude, factors.join("*"))?;
			}
		}
		Ok(())
	}
}
