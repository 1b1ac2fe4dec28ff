use std::collections::BTreeSet;

use metaverify::trusted;
use num::{BigRational, One, Zero};
use rand::{rngs::StdRng, SeedableRng};
use z3::{
	ast::{self, Ast},
	Config, Context, SatResult, Solver,
};

use super::assumption::{AllowedRelation, Assumption, AssumptionStatus};
use super::order::{NodeComparison, Order};
use crate::error::error::AnalysisError;
use crate::logging::messages::*;
use crate::graph::graph::prob01;
use crate::model::instantiation::reachability_at;
use crate::model::model::SparseMatrix;
use crate::model::region::ParameterRegion;
use crate::property::property::ReachabilityProperty;
use crate::symbolic::smt::SmtEncoder;

/// Samples closer than this are considered equal
const SAMPLE_TOLERANCE: f64 = 1e-9;
/// Solver timeout for a single assumption
const ASSUMPTION_TIMEOUT_MS: u64 = 10_000;

/// Decides whether an assumption about two states holds on a whole region.
pub trait AssumptionValidator {
	fn validate_assumption(
		&self,
		assumption: &Assumption,
		order: &Order,
		region: &ParameterRegion,
	) -> AssumptionStatus;
}

/// Validates assumptions against numeric samples first, then with z3.
pub struct AssumptionChecker<'m> {
	matrix: &'m SparseMatrix,
	ctx: Context,
	/// Reachability probability of every state, one vector per sample
	samples: Vec<Vec<f64>>,
}

impl<'m> AssumptionChecker<'m> {
	pub fn new(matrix: &'m SparseMatrix) -> Self {
		let mut cfg = Config::new();
		cfg.set_timeout_msec(ASSUMPTION_TIMEOUT_MS);
		Self {
			matrix,
			ctx: Context::new(&cfg),
			samples: Vec::new(),
		}
	}

	/// Computes reachability probabilities at the centre of `region` and at
	/// `number_of_samples - 1` further seeded uniform points.
	pub fn initialize_checking_on_samples(
		&mut self,
		property: &ReachabilityProperty,
		region: &ParameterRegion,
		number_of_samples: usize,
		seed: u64,
	) -> Result<(), AnalysisError> {
		let n = self.matrix.row_count();
		property.check_states(n)?;
		let (prob0, prob1) = prob01(self.matrix, &property.constraint(n), property.target());
		let mut rng = StdRng::seed_from_u64(seed);
		let valuations = (0..number_of_samples).map(|i| {
			if i == 0 {
				region.center()
			} else {
				region.sample(&mut rng)
			}
		});
		let mut samples = Vec::with_capacity(number_of_samples);
		for valuation in valuations {
			match reachability_at(self.matrix, &prob0, &prob1, &valuation) {
				Some(values) => samples.push(values.iter().copied().collect()),
				None => warning!("Skipping a sample at {:?}: the instantiated system is singular.", valuation),
			}
		}
		debug_message!("Computed {} samples for assumption checking", samples.len());
		self.samples = samples;
		Ok(())
	}

	/// Replaces the samples, one vector of per-state values per sample.
	pub fn set_sample_values(&mut self, samples: Vec<Vec<f64>>) {
		self.samples = samples;
	}

	pub fn sample_count(&self) -> usize {
		self.samples.len()
	}

	/// `Invalid` if some sample clearly contradicts the assumption
	pub fn check_on_samples(&self, assumption: &Assumption) -> AssumptionStatus {
		let (left, right) = (assumption.left_state(), assumption.right_state());
		let contradicted = self.samples.iter().any(|values| {
			let (Some(&l), Some(&r)) = (values.get(left), values.get(right)) else {
				return false;
			};
			match assumption.relation() {
				AllowedRelation::GreaterThan => l < r - SAMPLE_TOLERANCE,
				AllowedRelation::LessThan => l > r + SAMPLE_TOLERANCE,
				AllowedRelation::Equal => (l - r).abs() > SAMPLE_TOLERANCE,
			}
		});
		if contradicted {
			AssumptionStatus::Invalid
		} else {
			AssumptionStatus::Unknown
		}
	}

	/// `Valid` if the negated assumption is unsatisfiable together with the
	/// order, the equations of both states and the region.
	#[trusted]
	pub fn check_with_solver(
		&self,
		assumption: &Assumption,
		order: &Order,
		region: &ParameterRegion,
	) -> Result<AssumptionStatus, AnalysisError> {
		let (left, right) = (assumption.left_state(), assumption.right_state());
		let mut states = BTreeSet::from([left, right]);
		for state in [left, right] {
			states.extend(self.matrix.row(state).iter().map(|entry| entry.column()));
		}

		let ctx = &self.ctx;
		let mut encoder = SmtEncoder::new(ctx);
		let variable = |state: usize| ast::Real::new_const(ctx, format!("s{}", state));
		let zero = encoder.rational(&BigRational::zero())?;
		let one = encoder.rational(&BigRational::one())?;
		let solver = Solver::new(ctx);

		for constraint in encoder.region_constraints(region)? {
			solver.assert(&constraint);
		}
		for &state in &states {
			let x = variable(state);
			solver.assert(&x.ge(&zero));
			solver.assert(&x.le(&one));
			if order.is_top_state(state) {
				solver.assert(&x._eq(&one));
			} else if order.is_bottom_state(state) {
				solver.assert(&x._eq(&zero));
			}
		}
		for &first in &states {
			for &second in states.range(first + 1..) {
				match order.compare(first, second) {
					NodeComparison::Above => solver.assert(&variable(first).ge(&variable(second))),
					NodeComparison::Below => solver.assert(&variable(first).le(&variable(second))),
					NodeComparison::Same => solver.assert(&variable(first)._eq(&variable(second))),
					NodeComparison::Unknown => {}
				}
			}
		}
		for state in [left, right] {
			let mut summands = Vec::new();
			for entry in self.matrix.row(state) {
				let (weight, defined) = encoder.rational_function(entry.value(), region)?;
				solver.assert(&defined);
				summands.push(ast::Real::mul(ctx, &[&weight, &variable(entry.column())]));
			}
			let sum = match summands.len() {
				0 => zero.clone(),
				1 => summands.remove(0),
				_ => ast::Real::add(ctx, &summands.iter().collect::<Vec<_>>()),
			};
			solver.assert(&variable(state)._eq(&sum));
		}

		// A contradictory context would prove every assumption
		if solver.check() != SatResult::Sat {
			return Ok(AssumptionStatus::Unknown);
		}

		let (l, r) = (variable(left), variable(right));
		let negated = match assumption.relation() {
			AllowedRelation::GreaterThan => l.le(&r),
			AllowedRelation::LessThan => l.ge(&r),
			AllowedRelation::Equal => l._eq(&r).not(),
		};
		solver.assert(&negated);
		Ok(match solver.check() {
			SatResult::Unsat => AssumptionStatus::Valid,
			SatResult::Sat | SatResult::Unknown => AssumptionStatus::Unknown,
		})
	}
}

impl AssumptionValidator for AssumptionChecker<'_> {
	fn validate_assumption(
		&self,
		assumption: &Assumption,
		order: &Order,
		region: &ParameterRegion,
	) -> AssumptionStatus {
		if self.check_on_samples(assumption) == AssumptionStatus::Invalid {
			return AssumptionStatus::Invalid;
		}
		match self.check_with_solver(assumption, order, region) {
			Ok(status) => status,
			Err(err) => {
				error!("Could not check assumption {}: {}", assumption, err);
				AssumptionStatus::Unknown
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::analysis::assumption::StateVariableEnvironment;
	use crate::model::model::{DtmcBuilder, ParametricDtmc, StateSet};

	/// 0 and 1 both move to the goal 2 or the sink 3; 0 with p, 1 with p/2
	fn model() -> ParametricDtmc {
		let mut builder = DtmcBuilder::with_states(4);
		builder
			.transition(0, 2, "p")
			.unwrap()
			.transition(0, 3, "1-p")
			.unwrap()
			.transition(1, 2, "p/2")
			.unwrap()
			.transition(1, 3, "1-p/2")
			.unwrap();
		builder.build().unwrap()
	}

	fn assumption(left: usize, right: usize, relation: AllowedRelation) -> Assumption {
		let mut environment = StateVariableEnvironment::new();
		Assumption::new(environment.variable(left), environment.variable(right), relation)
	}

	#[test]
	fn samples_refute_wrong_assumptions() {
		let dtmc = model();
		let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();
		let mut checker = AssumptionChecker::new(dtmc.matrix());
		let property = ReachabilityProperty::eventually(StateSet::from([2]));
		checker
			.initialize_checking_on_samples(&property, &region, 5, 42)
			.unwrap();
		assert_eq!(checker.sample_count(), 5);
		assert_eq!(
			checker.check_on_samples(&assumption(1, 0, AllowedRelation::GreaterThan)),
			AssumptionStatus::Invalid
		);
		assert_eq!(
			checker.check_on_samples(&assumption(0, 1, AllowedRelation::GreaterThan)),
			AssumptionStatus::Unknown
		);
	}

	#[test]
	fn solver_proves_assumptions() {
		let dtmc = model();
		let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();
		let checker = AssumptionChecker::new(dtmc.matrix());
		let order = Order::new(&StateSet::from([2]), &StateSet::from([3]), 4);
		assert_eq!(
			checker.validate_assumption(&assumption(0, 1, AllowedRelation::GreaterThan), &order, &region),
			AssumptionStatus::Valid
		);
		assert_eq!(
			checker.validate_assumption(&assumption(0, 1, AllowedRelation::Equal), &order, &region),
			AssumptionStatus::Unknown
		);
	}

	#[test]
	fn injected_samples_are_used() {
		let dtmc = model();
		let mut checker = AssumptionChecker::new(dtmc.matrix());
		checker.set_sample_values(vec![vec![0.5, 0.5, 1.0, 0.0]]);
		assert_eq!(
			checker.check_on_samples(&assumption(0, 1, AllowedRelation::Equal)),
			AssumptionStatus::Unknown
		);
		assert_eq!(
			checker.check_on_samples(&assumption(0, 2, AllowedRelation::Equal)),
			AssumptionStatus::Invalid
		);
	}
}
