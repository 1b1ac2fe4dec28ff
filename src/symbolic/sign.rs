use metaverify::trusted;
use num::{BigRational, Signed, Zero};
use z3::{ast::Bool, Config, Context, SatResult, Solver};

use super::rational_function::RationalFunction;
use crate::error::error::AnalysisError;
use crate::logging::messages::*;
use crate::model::region::ParameterRegion;
use crate::symbolic::polynomial::Polynomial;

/// Solver timeout for a single sign query
const SIGN_QUERY_TIMEOUT_MS: u64 = 5_000;
/// Sampled values closer to zero than this are not used as evidence
const EVALUATION_TOLERANCE: f64 = 1e-12;

/// What is known about the sign of a function over a whole region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionSign {
	pub non_negative: bool,
	pub non_positive: bool,
}

impl RegionSign {
	const ZERO: Self = Self {
		non_negative: true,
		non_positive: true,
	};
	const UNDECIDED: Self = Self {
		non_negative: false,
		non_positive: false,
	};

	fn of_constant(value: &BigRational) -> Self {
		Self {
			non_negative: !value.is_negative(),
			non_positive: !value.is_positive(),
		}
	}
}

/// Decides whether a rational function keeps its sign over a parameter
/// region. Cheap syntactic and sampling checks run first; z3 decides the rest.
pub struct RegionSignChecker {
	ctx: Context,
}

impl Default for RegionSignChecker {
	fn default() -> Self {
		Self::new()
	}
}

impl RegionSignChecker {
	pub fn new() -> Self {
		let mut cfg = Config::new();
		cfg.set_timeout_msec(SIGN_QUERY_TIMEOUT_MS);
		Self {
			ctx: Context::new(&cfg),
		}
	}

	pub fn check_sign(
		&self,
		function: &RationalFunction,
		region: &ParameterRegion,
	) -> Result<RegionSign, AnalysisError> {
		if function.is_zero() {
			return Ok(RegionSign::ZERO);
		}
		if let Some(value) = function.constant_value() {
			return Ok(RegionSign::of_constant(&value));
		}
		if let Some(parameter) = function
			.variables()
			.into_iter()
			.find(|parameter| !region.contains_parameter(parameter))
		{
			return Err(AnalysisError::MissingParameter(parameter.to_string()));
		}
		if let Some(sign) = Self::coefficient_sign(function, region) {
			return Ok(sign);
		}

		let (mut seen_positive, mut seen_negative) = (false, false);
		for valuation in std::iter::once(region.center()).chain(region.vertices()) {
			let value = function.evaluate(&valuation);
			seen_positive |= value > EVALUATION_TOLERANCE;
			seen_negative |= value < -EVALUATION_TOLERANCE;
		}
		if seen_positive && seen_negative {
			return Ok(RegionSign::UNDECIDED);
		}

		let non_negative = !seen_negative && !self.admits(function, region, true)?;
		let non_positive = !seen_positive && !self.admits(function, region, false)?;
		Ok(RegionSign {
			non_negative,
			non_positive,
		})
	}

	/// Sign from the coefficients alone: a polynomial whose coefficients share
	/// a sign keeps it wherever all parameters are non-negative.
	fn coefficient_sign(function: &RationalFunction, region: &ParameterRegion) -> Option<RegionSign> {
		if !region.has_nonnegative_lower_bounds() {
			return None;
		}
		let sign_of = |polynomial: &Polynomial| -> Option<bool> {
			match polynomial.coefficient_signs() {
				(true, false) => Some(true),
				(false, true) => Some(false),
				_ => None,
			}
		};
		let positive = sign_of(function.numerator())? == sign_of(function.denominator())?;
		Some(if positive {
			RegionSign {
				non_negative: true,
				non_positive: false,
			}
		} else {
			RegionSign {
				non_negative: false,
				non_positive: true,
			}
		})
	}

	/// Whether some point of the region makes the function strictly negative
	/// (`negative`) or strictly positive. An `unknown` answer counts as
	/// "admits", so nothing is claimed without a proof.
	#[trusted]
	fn admits(
		&self,
		function: &RationalFunction,
		region: &ParameterRegion,
		negative: bool,
	) -> Result<bool, AnalysisError> {
		let mut encoder = super::smt::SmtEncoder::new(&self.ctx);
		let solver = Solver::new(&self.ctx);
		for constraint in encoder.region_constraints(region)? {
			solver.assert(&constraint);
		}
		let (witness, defined) = encoder.sign_witness(function, region)?;
		solver.assert(&defined);
		let zero = encoder.rational(&BigRational::zero())?;
		let query: Bool = if negative {
			witness.lt(&zero)
		} else {
			witness.gt(&zero)
		};
		solver.assert(&query);
		match solver.check() {
			SatResult::Unsat => Ok(false),
			SatResult::Sat => Ok(true),
			SatResult::Unknown => {
				warning!(
					"Solver could not decide the sign of {} on {}; treating it as unknown.",
					function,
					region
				);
				Ok(true)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sign(expression: &str, region: &str) -> RegionSign {
		let checker = RegionSignChecker::new();
		checker
			.check_sign(&expression.parse().unwrap(), &region.parse().unwrap())
			.unwrap()
	}

	#[test]
	fn constants_and_zero() {
		assert_eq!(sign("0", "0<=p<=1"), RegionSign::ZERO);
		assert!(sign("-2", "0<=p<=1").non_positive);
		assert!(!sign("-2", "0<=p<=1").non_negative);
	}

	#[test]
	fn coefficient_shortcut() {
		let result = sign("p^2 + 3*q", "0<=p<=1,0<=q<=1");
		assert!(result.non_negative && !result.non_positive);
	}

	#[test]
	fn solver_proves_signs() {
		let result = sign("p - 0.1", "0.2<=p<=0.8");
		assert!(result.non_negative && !result.non_positive);
		let result = sign("1/(p - 1)", "0.2<=p<=0.8");
		assert!(result.non_positive && !result.non_negative);
	}

	#[test]
	fn sign_changes_are_refuted() {
		assert_eq!(sign("p - 0.5", "0.1<=p<=0.9"), RegionSign::UNDECIDED);
	}

	#[test]
	fn parameters_outside_region_are_errors() {
		let checker = RegionSignChecker::new();
		let result = checker.check_sign(&"p*q - 1".parse().unwrap(), &"0<=p<=1".parse().unwrap());
		assert!(matches!(result, Err(AnalysisError::MissingParameter(_))));
	}
}
