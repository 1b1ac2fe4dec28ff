use std::collections::BTreeMap;

use num::{BigRational, Signed, Zero};
use z3::{
	ast::{self, Ast},
	Context,
};

use super::parameter::Parameter;
use super::polynomial::Polynomial;
use super::rational_function::RationalFunction;
use crate::error::error::AnalysisError;
use crate::model::region::ParameterRegion;

/// Translates polynomials and rational functions into z3 real arithmetic.
/// Parameters are declared lazily, once per encoder.
pub struct SmtEncoder<'ctx> {
	ctx: &'ctx Context,
	parameters: BTreeMap<Parameter, ast::Real<'ctx>>,
}

impl<'ctx> SmtEncoder<'ctx> {
	pub fn new(ctx: &'ctx Context) -> Self {
		Self {
			ctx,
			parameters: BTreeMap::new(),
		}
	}

	pub fn context(&self) -> &'ctx Context {
		self.ctx
	}

	pub fn parameter(&mut self, parameter: &Parameter) -> ast::Real<'ctx> {
		let ctx = self.ctx;
		self.parameters
			.entry(parameter.clone())
			.or_insert_with(|| ast::Real::new_const(ctx, format!("param_{}", parameter.name())))
			.clone()
	}

	/// Exact rational constant. Negative values are built as the negation of
	/// their magnitude.
	pub fn rational(&self, value: &BigRational) -> Result<ast::Real<'ctx>, AnalysisError> {
		let magnitude = value.abs();
		let numeral = ast::Real::from_real_str(
			self.ctx,
			&magnitude.numer().to_string(),
			&magnitude.denom().to_string(),
		)
		.ok_or_else(|| AnalysisError::Smt(format!("unrepresentable numeral {}", value)))?;
		Ok(if value.is_negative() {
			numeral.unary_minus()
		} else {
			numeral
		})
	}

	/// `lower <= p <= upper` for every parameter of the region
	pub fn region_constraints(
		&mut self,
		region: &ParameterRegion,
	) -> Result<Vec<ast::Bool<'ctx>>, AnalysisError> {
		let mut constraints = Vec::new();
		for parameter in region.parameters() {
			let (lower, upper) = match region.bounds(parameter) {
				Some(bounds) => bounds,
				None => continue,
			};
			let variable = self.parameter(parameter);
			constraints.push(variable.ge(&self.rational(lower)?));
			constraints.push(variable.le(&self.rational(upper)?));
		}
		Ok(constraints)
	}

	/// Every variable of `polynomial` must be bounded by `region`.
	pub fn polynomial(
		&mut self,
		polynomial: &Polynomial,
		region: &ParameterRegion,
	) -> Result<ast::Real<'ctx>, AnalysisError> {
		if polynomial.is_zero() {
			return self.rational(&BigRational::zero());
		}
		let mut summands = Vec::new();
		for (monomial, coefficient) in polynomial.terms() {
			let mut factors = vec![self.rational(coefficient)?];
			for (parameter, exponent) in monomial.iter() {
				if !region.contains_parameter(parameter) {
					return Err(AnalysisError::MissingParameter(parameter.to_string()));
				}
				let variable = self.parameter(parameter);
				factors.extend((0..*exponent).map(|_| variable.clone()));
			}
			summands.push(if factors.len() == 1 {
				factors.remove(0)
			} else {
				ast::Real::mul(self.ctx, &factors.iter().collect::<Vec<_>>())
			});
		}
		Ok(if summands.len() == 1 {
			summands.remove(0)
		} else {
			ast::Real::add(self.ctx, &summands.iter().collect::<Vec<_>>())
		})
	}

	/// The encoded quotient together with the side condition that its
	/// denominator is non-zero.
	pub fn rational_function(
		&mut self,
		function: &RationalFunction,
		region: &ParameterRegion,
	) -> Result<(ast::Real<'ctx>, ast::Bool<'ctx>), AnalysisError> {
		let numerator = self.polynomial(function.numerator(), region)?;
		if function.is_polynomial() {
			return Ok((numerator, ast::Bool::from_bool(self.ctx, true)));
		}
		let denominator = self.polynomial(function.denominator(), region)?;
		let defined = denominator._eq(&self.rational(&BigRational::zero())?).not();
		Ok((numerator.div(&denominator), defined))
	}

	/// `numerator * denominator`, which has the sign of the function wherever
	/// the function is defined.
	pub fn sign_witness(
		&mut self,
		function: &RationalFunction,
		region: &ParameterRegion,
	) -> Result<(ast::Real<'ctx>, ast::Bool<'ctx>), AnalysisError> {
		let numerator = self.polynomial(function.numerator(), region)?;
		if function.is_polynomial() {
			return Ok((numerator, ast::Bool::from_bool(self.ctx, true)));
		}
		let denominator = self.polynomial(function.denominator(), region)?;
		let defined = denominator._eq(&self.rational(&BigRational::zero())?).not();
		Ok((ast::Real::mul(self.ctx, &[&numerator, &denominator]), defined))
	}
}
