use std::collections::HashMap;

use super::monotonicity::{accumulate_ranked_monotonicity, Monotonicity};
use super::order::Order;
use crate::error::error::AnalysisError;
use crate::model::model::SparseMatrix;
use crate::model::region::ParameterRegion;
use crate::symbolic::parameter::Parameter;
use crate::symbolic::rational_function::RationalFunction;
use crate::symbolic::sign::{RegionSign, RegionSignChecker};

/// Decides the local monotonicity of single states from the signs of the
/// derivatives of their outgoing transitions and the ranks of their
/// successors in an order.
pub struct MonotonicityChecker<'m> {
	matrix: &'m SparseMatrix,
	derivatives: HashMap<RationalFunction, HashMap<Parameter, RationalFunction>>,
	sign_checker: RegionSignChecker,
}

impl<'m> MonotonicityChecker<'m> {
	pub fn new(matrix: &'m SparseMatrix) -> Self {
		Self {
			matrix,
			derivatives: HashMap::new(),
			sign_checker: RegionSignChecker::new(),
		}
	}

	/// Monotonicity of `state` in `parameter` on `region`, given what `order`
	/// knows about its successors. Panics if the state has no outgoing
	/// transitions.
	pub fn check_local_monotonicity(
		&mut self,
		order: &Order,
		state: usize,
		parameter: &Parameter,
		region: &ParameterRegion,
	) -> Result<Monotonicity, AnalysisError> {
		let matrix = self.matrix;
		let row = matrix.row(state);
		assert!(!row.is_empty(), "State {} has no outgoing transitions", state);
		if !matrix.row_depends_on(state, parameter) {
			return Ok(Monotonicity::Constant);
		}

		let successors = row.iter().map(|entry| entry.column()).collect::<Vec<_>>();
		let sorted = order.sort_states(&successors);
		if sorted.last() == Some(&matrix.column_count()) {
			return Ok(Monotonicity::Unknown);
		}

		// With two successors the lower one carries one minus the higher one
		let considered = if sorted.len() == 2 { 1 } else { sorted.len() };
		let mut ranked = Vec::with_capacity(considered);
		for &successor in &sorted[..considered] {
			let function = match matrix.entry(state, successor) {
				Some(function) => function,
				None => continue,
			};
			ranked.push(self.check_transition_monotonicity(function, parameter, region)?);
		}
		Ok(accumulate_ranked_monotonicity(&ranked))
	}

	/// Classifies a single transition weight by the sign of its derivative
	pub fn check_transition_monotonicity(
		&mut self,
		function: &RationalFunction,
		parameter: &Parameter,
		region: &ParameterRegion,
	) -> Result<Monotonicity, AnalysisError> {
		let derivative = self.derivative(function, parameter);
		let RegionSign {
			non_negative,
			non_positive,
		} = self.sign_checker.check_sign(&derivative, region)?;
		Ok(match (non_negative, non_positive) {
			(true, true) => Monotonicity::Constant,
			(true, false) => Monotonicity::Incr,
			(false, true) => Monotonicity::Decr,
			(false, false) => Monotonicity::Not,
		})
	}

	fn derivative(&mut self, function: &RationalFunction, parameter: &Parameter) -> RationalFunction {
		if function.is_constant() {
			return RationalFunction::zero();
		}
		self.derivatives
			.entry(function.clone())
			.or_default()
			.entry(parameter.clone())
			.or_insert_with(|| function.derivative(parameter))
			.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::model::{DtmcBuilder, ParametricDtmc, StateSet};

	fn coin() -> ParametricDtmc {
		let mut builder = DtmcBuilder::with_states(4);
		builder
			.transition(0, 1, "p")
			.unwrap()
			.transition(0, 2, "1-p")
			.unwrap()
			.transition(3, 1, "0.5")
			.unwrap()
			.transition(3, 2, "0.5")
			.unwrap();
		builder.build().unwrap()
	}

	#[test]
	fn constant_rows_skip_the_region() {
		let dtmc = coin();
		let mut checker = MonotonicityChecker::new(dtmc.matrix());
		let order = Order::new(&StateSet::from([1]), &StateSet::from([2]), 4);
		// the region does not even mention p
		let region = ParameterRegion::new();
		let result = checker.check_local_monotonicity(&order, 3, &Parameter::new("p"), &region);
		assert_eq!(result, Ok(Monotonicity::Constant));
	}

	#[test]
	fn direction_follows_the_ranking() {
		let dtmc = coin();
		let region: ParameterRegion = "0.1<=p<=0.9".parse().unwrap();
		let p = Parameter::new("p");
		let mut checker = MonotonicityChecker::new(dtmc.matrix());
		let order = Order::new(&StateSet::from([1]), &StateSet::from([2]), 4);
		assert_eq!(checker.check_local_monotonicity(&order, 0, &p, &region), Ok(Monotonicity::Incr));
		let order = Order::new(&StateSet::from([2]), &StateSet::from([1]), 4);
		assert_eq!(checker.check_local_monotonicity(&order, 0, &p, &region), Ok(Monotonicity::Decr));
	}

	#[test]
	fn unplaced_successors_are_unknown() {
		let dtmc = coin();
		let region: ParameterRegion = "0.1<=p<=0.9".parse().unwrap();
		let mut checker = MonotonicityChecker::new(dtmc.matrix());
		let order = Order::new(&StateSet::from([1]), &StateSet::new(), 4);
		assert_eq!(
			checker.check_local_monotonicity(&order, 0, &Parameter::new("p"), &region),
			Ok(Monotonicity::Unknown)
		);
	}

	#[test]
	fn non_monotone_transitions() {
		let dtmc = coin();
		let region: ParameterRegion = "0.1<=p<=0.9".parse().unwrap();
		let mut checker = MonotonicityChecker::new(dtmc.matrix());
		let function: RationalFunction = "p*(1-p)".parse().unwrap();
		assert_eq!(
			checker.check_transition_monotonicity(&function, &Parameter::new("p"), &region),
			Ok(Monotonicity::Not)
		);
	}
}
