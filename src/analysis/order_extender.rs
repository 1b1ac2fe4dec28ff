use std::collections::BTreeSet;

use super::assumption::{AllowedRelation, Assumption, AssumptionStatus};
use super::assumption_checker::{AssumptionChecker, AssumptionValidator};
use super::assumption_maker::AssumptionMaker;
use super::local_monotonicity_result::LocalMonotonicityResult;
use super::monotonicity::Monotonicity;
use super::monotonicity_checker::MonotonicityChecker;
use super::order::{NodeComparison, Order, SortConflict};
use super::settings::ExtenderSettings;
use crate::error::error::AnalysisError;
use crate::logging::messages::*;
use crate::graph::graph::{prob01, successors, traversal_order};
use crate::model::model::{ParametricDtmc, SparseMatrix};
use crate::model::region::ParameterRegion;
use crate::property::property::ReachabilityProperty;
use crate::symbolic::parameter::Parameter;

/// An order together with the first pair of states that kept it from being
/// completed. `unresolved` is `None` once every state is placed.
#[derive(Clone, Debug)]
pub struct OrderResult {
	pub order: Order,
	pub unresolved: Option<(usize, usize)>,
}

impl OrderResult {
	pub fn is_complete(&self) -> bool {
		self.unresolved.is_none()
	}
}

/// What one reasoning step achieved for a state.
enum Step {
	/// The order grew; the successors of the given state are now ranked
	Placed(usize),
	/// The given pair has to be compared first
	Blocked(usize, usize),
	/// Nothing to do yet
	Idle,
}

/// Builds and extends orders over the states of one model for one region,
/// recording local monotonicity along the way.
pub struct OrderExtender<'m> {
	matrix: &'m SparseMatrix,
	region: ParameterRegion,
	settings: ExtenderSettings,
	number_of_states: usize,
	parameters: BTreeSet<Parameter>,
	successors: Vec<Vec<usize>>,
	traversal: Vec<usize>,
	cyclic: bool,
	bottom_top_order: Order,
	checker: MonotonicityChecker<'m>,
	assumption_maker: Option<AssumptionMaker<'m>>,
	bounds: Option<(Vec<f64>, Vec<f64>)>,
}

impl<'m> OrderExtender<'m> {
	pub fn new(
		model: &'m ParametricDtmc,
		property: &ReachabilityProperty,
		region: &ParameterRegion,
		settings: ExtenderSettings,
	) -> Result<Self, AnalysisError> {
		Self::from_matrix(model.matrix(), property, region, settings)
	}

	pub fn from_matrix(
		matrix: &'m SparseMatrix,
		property: &ReachabilityProperty,
		region: &ParameterRegion,
		settings: ExtenderSettings,
	) -> Result<Self, AnalysisError> {
		let number_of_states = matrix.row_count();
		if number_of_states == 0 {
			return Err(AnalysisError::InvalidModel("the model has no states".to_string()));
		}
		if let Some(state) = (0..number_of_states).find(|&state| matrix.row(state).is_empty()) {
			return Err(AnalysisError::InvalidModel(format!(
				"state {} has no outgoing transitions",
				state
			)));
		}
		property.check_states(number_of_states)?;
		let parameters = matrix.parameters();
		if let Some(parameter) = parameters.iter().find(|p| !region.contains_parameter(p)) {
			return Err(AnalysisError::MissingParameter(parameter.to_string()));
		}

		let successors = successors(matrix);
		let (traversal, cyclic) = traversal_order(&successors);
		let (prob0, prob1) = prob01(matrix, &property.constraint(number_of_states), property.target());
		let bottom_top_order = Order::new(&prob1, &prob0, number_of_states);
		debug_message!(
			"Order extender: {} states, {} parameters, cyclic: {}, {} top and {} bottom states",
			number_of_states,
			parameters.len(),
			cyclic,
			prob1.len(),
			prob0.len()
		);

		let assumption_maker = if settings.use_assumptions {
			let mut checker = AssumptionChecker::new(matrix);
			checker.initialize_checking_on_samples(
				property,
				region,
				settings.number_of_samples,
				settings.sample_seed,
			)?;
			Some(AssumptionMaker::new(Box::new(checker)))
		} else {
			None
		};

		Ok(Self {
			matrix,
			region: region.clone(),
			settings,
			number_of_states,
			parameters,
			successors,
			traversal,
			cyclic,
			bottom_top_order,
			checker: MonotonicityChecker::new(matrix),
			assumption_maker,
			bounds: None,
		})
	}

	/// Replaces the validator behind the assumption maker
	pub fn set_assumption_validator(&mut self, validator: Box<dyn AssumptionValidator + 'm>) {
		self.assumption_maker = Some(AssumptionMaker::new(validator));
	}

	pub fn number_of_states(&self) -> usize {
		self.number_of_states
	}

	pub fn parameters(&self) -> &BTreeSet<Parameter> {
		&self.parameters
	}

	pub fn region(&self) -> &ParameterRegion {
		&self.region
	}

	pub fn is_cyclic(&self) -> bool {
		self.cyclic
	}

	pub fn settings(&self) -> &ExtenderSettings {
		&self.settings
	}

	/// The order holding only the probability-one and probability-zero states
	pub fn bottom_top_order(&self) -> &Order {
		&self.bottom_top_order
	}

	/// Builds an order from the extremal states and extends it as far as
	/// possible.
	pub fn to_order(&mut self, mon_res: Option<&mut LocalMonotonicityResult>) -> OrderResult {
		let order = self.bottom_top_order.clone();
		self.extend(order, self.settings.use_assumptions, mon_res)
	}

	/// Builds an order from numeric lower and upper bounds on the reachability
	/// probabilities. No assumptions are made, so the order may stay
	/// incomplete.
	pub fn to_order_with_bounds(
		&mut self,
		lower: Vec<f64>,
		upper: Vec<f64>,
		mon_res: Option<&mut LocalMonotonicityResult>,
	) -> Result<OrderResult, AnalysisError> {
		for (what, bounds) in [("lower bounds", &lower), ("upper bounds", &upper)] {
			if bounds.len() != self.number_of_states {
				return Err(AnalysisError::StateCountMismatch {
					what: what.to_string(),
					expected: self.number_of_states,
					found: bounds.len(),
				});
			}
		}
		let mut order = self.bottom_top_order.clone();
		for state in 0..self.number_of_states {
			if order.contains(state) {
				continue;
			}
			if lower[state] >= 1.0 {
				order.add_to_node(state, order.top());
			} else if upper[state] <= 0.0 {
				order.add_to_node(state, order.bottom());
			}
		}
		self.bounds = Some((lower, upper));
		Ok(self.extend(order, false, mon_res))
	}

	/// Continues extending `order`, first folding in `assumption` if given.
	/// The assumption must have been validated.
	pub fn extend_order(
		&mut self,
		mut order: Order,
		mon_res: Option<&mut LocalMonotonicityResult>,
		assumption: Option<&Assumption>,
	) -> OrderResult {
		if let Some(assumption) = assumption {
			Self::handle_assumption(&mut order, assumption);
		}
		self.extend(order, self.settings.use_assumptions, mon_res)
	}

	/// Applies a validated assumption to the order.
	pub fn handle_assumption(order: &mut Order, assumption: &Assumption) {
		debug_message!("Applying assumption {}", assumption);
		match assumption.strict_pair() {
			Some((above, below)) => Self::place_above(order, above, below),
			None => {
				debug_assert_eq!(assumption.relation(), AllowedRelation::Equal);
				Self::place_same(order, assumption.left_state(), assumption.right_state());
			}
		}
	}

	/// Compares two states by their numeric bounds and records what that
	/// proves. `Unknown` if there are no bounds or they overlap.
	pub fn add_states_based_on_min_max(&self, order: &mut Order, state1: usize, state2: usize) -> NodeComparison {
		let Some((lower, upper)) = &self.bounds else {
			return NodeComparison::Unknown;
		};
		if lower[state1] > upper[state2] {
			Self::place_above(order, state1, state2);
			NodeComparison::Above
		} else if lower[state2] > upper[state1] {
			Self::place_above(order, state2, state1);
			NodeComparison::Below
		} else if lower[state1] == upper[state1]
			&& lower[state2] == upper[state2]
			&& lower[state1] == lower[state2]
		{
			Self::place_same(order, state1, state2);
			NodeComparison::Same
		} else {
			NodeComparison::Unknown
		}
	}

	/// Makes `above` rank strictly above `below`, inserting whichever of them
	/// is missing.
	fn place_above(order: &mut Order, above: usize, below: usize) {
		match (order.get_node(above), order.get_node(below)) {
			(Some(_), Some(_)) => order.add_relation(above, below),
			(Some(node), None) => {
				order.add_between(below, node, order.bottom());
			}
			(None, Some(node)) => {
				order.add_between(above, order.top(), node);
			}
			(None, None) => {
				let node = order.add(above);
				order.add_between(below, node, order.bottom());
			}
		}
	}

	fn place_same(order: &mut Order, state1: usize, state2: usize) {
		match (order.get_node(state1), order.get_node(state2)) {
			(Some(node1), Some(node2)) => order.merge_nodes(node1, node2),
			(Some(node), None) => order.add_to_node(state2, node),
			(None, Some(node)) => order.add_to_node(state1, node),
			(None, None) => {
				let node = order.add(state1);
				order.add_to_node(state2, node);
			}
		}
	}

	fn extend(
		&mut self,
		mut order: Order,
		use_assumptions: bool,
		mut mon_res: Option<&mut LocalMonotonicityResult>,
	) -> OrderResult {
		let traversal = self.traversal.clone();
		loop {
			let mut progress = false;
			let mut first_blocked = None;
			for &state in &traversal {
				let step = if order.contains(state) {
					self.extend_by_backward_reasoning(&mut order, state)
				} else {
					self.extend_by_forward_reasoning(&mut order, state)
				};
				match step {
					Step::Placed(ranked) => {
						progress = true;
						if let Some(mon_res) = mon_res.as_deref_mut() {
							self.check_par_on_state_mon_res(&order, ranked, mon_res);
						}
					}
					Step::Blocked(a, b) => {
						first_blocked.get_or_insert((a, b));
						if self.add_states_based_on_min_max(&mut order, a, b) != NodeComparison::Unknown {
							progress = true;
						}
					}
					Step::Idle => {}
				}
			}

			if order.is_complete() {
				break;
			}
			if progress {
				continue;
			}
			match first_blocked {
				Some((a, b)) => {
					if use_assumptions && self.apply_valid_assumption(&mut order, a, b) {
						continue;
					}
					debug_message!("Order extension stalled on states {} and {}", a, b);
					return OrderResult {
						order,
						unresolved: Some((a, b)),
					};
				}
				None => {
					// Only waiting states are left, which happens on cycles
					let Some(state) = traversal.iter().copied().find(|&s| !order.contains(s)) else {
						break;
					};
					debug_message!("Placing state {} between top and bottom to break a cycle", state);
					order.add(state);
				}
			}
		}

		order.set_done_building(true);
		if let Some(mon_res) = mon_res {
			for state in 0..self.number_of_states {
				self.check_par_on_state_mon_res(&order, state, mon_res);
			}
		}
		OrderResult {
			order,
			unresolved: None,
		}
	}

	/// Asks the assumption maker about `a` and `b` and applies a valid answer.
	fn apply_valid_assumption(&mut self, order: &mut Order, a: usize, b: usize) -> bool {
		let Some(maker) = self.assumption_maker.as_mut() else {
			return false;
		};
		let assumptions = maker.create_and_check_assumptions(a, b, order, &self.region);
		let valid = assumptions
			.into_iter()
			.find(|(_, status)| *status == AssumptionStatus::Valid);
		match valid {
			Some((assumption, _)) => {
				message!("Resolved states {} and {} with assumption {}", a, b, assumption);
				Self::handle_assumption(order, &assumption);
				true
			}
			None => false,
		}
	}

	/// Places an unplaced state from its successors: next to a single
	/// successor, or between the highest and the lowest of several.
	fn extend_by_forward_reasoning(&self, order: &mut Order, state: usize) -> Step {
		let successors = &self.successors[state];
		match successors.as_slice() {
			[] => Step::Idle,
			[successor] => match order.get_node(*successor) {
				Some(node) => {
					order.add_to_node(state, node);
					Step::Placed(state)
				}
				None => Step::Idle,
			},
			_ => match order.sort_states_checked(successors) {
				Ok(sorted) => {
					let (highest, lowest) = (sorted[0], sorted[sorted.len() - 1]);
					let (Some(high), Some(low)) = (order.get_node(highest), order.get_node(lowest)) else {
						return Step::Idle;
					};
					if high == low {
						order.add_to_node(state, high);
					} else {
						order.add_between(state, high, low);
					}
					Step::Placed(state)
				}
				Err(SortConflict::Incomparable(a, b)) => Step::Blocked(a, b),
				Err(SortConflict::Unplaced(_)) => Step::Idle,
			},
		}
	}

	/// Places the only unplaced successor of a placed state: its probability
	/// is a weighted average of its successors, so the missing one has to
	/// balance the others.
	fn extend_by_backward_reasoning(&self, order: &mut Order, state: usize) -> Step {
		if order.is_top_state(state) || order.is_bottom_state(state) {
			return Step::Idle;
		}
		let successors = &self.successors[state];
		let mut unplaced = successors.iter().copied().filter(|&s| !order.contains(s));
		let (Some(missing), None) = (unplaced.next(), unplaced.next()) else {
			return Step::Idle;
		};
		if successors.len() < 2 {
			return Step::Idle;
		}
		let Some(node) = order.get_node(state) else {
			return Step::Idle;
		};

		let (mut any_below, mut any_above) = (false, false);
		for &successor in successors.iter().filter(|&&s| s != missing) {
			match order.compare(successor, state) {
				NodeComparison::Below => any_below = true,
				NodeComparison::Above => any_above = true,
				NodeComparison::Same => {}
				NodeComparison::Unknown => return Step::Idle,
			}
		}
		match (any_above, any_below) {
			(false, true) => {
				order.add_between(missing, order.top(), node);
			}
			(true, false) => {
				order.add_between(missing, node, order.bottom());
			}
			(false, false) => order.add_to_node(missing, node),
			(true, true) => return Step::Idle,
		}
		Step::Placed(state)
	}

	/// Records the monotonicity of `state` in every parameter.
	fn check_par_on_state_mon_res(&mut self, order: &Order, state: usize, mon_res: &mut LocalMonotonicityResult) {
		let parameter_free = !self
			.parameters
			.iter()
			.any(|parameter| self.matrix.row_depends_on(state, parameter));
		if order.is_top_state(state) || order.is_bottom_state(state) || parameter_free {
			mon_res.set_constant(state);
			return;
		}
		for parameter in self.parameters.iter() {
			let monotonicity = self
				.checker
				.check_local_monotonicity(order, state, parameter, &self.region)
				.unwrap_or_else(|err| {
					error!("Monotonicity of state {} in {}: {}", state, parameter, err);
					Monotonicity::Unknown
				});
			mon_res.set_monotonicity(state, parameter, monotonicity);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::analysis::assumption::StateVariableEnvironment;
	use crate::model::model::{DtmcBuilder, StateSet};

	fn order() -> Order {
		Order::new(&StateSet::from([0]), &StateSet::from([1]), 5)
	}

	fn assumption(left: usize, right: usize, relation: AllowedRelation) -> Assumption {
		let mut environment = StateVariableEnvironment::new();
		Assumption::new(environment.variable(left), environment.variable(right), relation)
	}

	#[test]
	fn strict_assumptions_insert_missing_states() {
		let mut order = order();
		OrderExtender::handle_assumption(&mut order, &assumption(2, 3, AllowedRelation::GreaterThan));
		assert_eq!(order.compare(2, 3), NodeComparison::Above);
		OrderExtender::handle_assumption(&mut order, &assumption(2, 4, AllowedRelation::LessThan));
		assert_eq!(order.compare(4, 3), NodeComparison::Above);
		assert_eq!(order.compare(0, 4), NodeComparison::Above);
	}

	#[test]
	fn equal_assumptions_merge() {
		let mut order = order();
		order.add(2);
		order.add(3);
		OrderExtender::handle_assumption(&mut order, &assumption(2, 3, AllowedRelation::Equal));
		assert_eq!(order.compare(2, 3), NodeComparison::Same);
		OrderExtender::handle_assumption(&mut order, &assumption(4, 3, AllowedRelation::Equal));
		assert_eq!(order.compare(4, 2), NodeComparison::Same);
	}

	#[test]
	fn bounds_decide_pairs() {
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
		let dtmc = builder.build().unwrap();
		let property = ReachabilityProperty::eventually(StateSet::from([2]));
		let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();
		let mut extender =
			OrderExtender::new(&dtmc, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
		let result = extender
			.to_order_with_bounds(vec![0.2, 0.1, 1.0, 0.0], vec![0.8, 0.4, 1.0, 0.0], None)
			.unwrap();
		assert!(result.is_complete());

		let mut order = extender.bottom_top_order().clone();
		order.add(0);
		order.add(1);
		assert_eq!(extender.add_states_based_on_min_max(&mut order, 0, 1), NodeComparison::Unknown);
		extender
			.to_order_with_bounds(vec![0.5, 0.1, 1.0, 0.0], vec![0.8, 0.4, 1.0, 0.0], None)
			.unwrap();
		assert_eq!(extender.add_states_based_on_min_max(&mut order, 0, 1), NodeComparison::Above);
		assert_eq!(order.compare(0, 1), NodeComparison::Above);
	}

	struct PanickingValidator;

	impl AssumptionValidator for PanickingValidator {
		fn validate_assumption(&self, assumption: &Assumption, _: &Order, _: &ParameterRegion) -> AssumptionStatus {
			panic!("unexpected assumption {}", assumption);
		}
	}

	/// States 0 and 1 both mix target 2 and sink 3, and state 4 chooses
	/// between them, so ranking 4 needs 0 and 1 compared.
	fn two_choices() -> crate::model::model::ParametricDtmc {
		let mut builder = DtmcBuilder::with_states(5);
		builder
			.transition(0, 2, "p")
			.unwrap()
			.transition(0, 3, "1-p")
			.unwrap()
			.transition(1, 2, "p/2")
			.unwrap()
			.transition(1, 3, "1-p/2")
			.unwrap()
			.transition(4, 0, "1/2")
			.unwrap()
			.transition(4, 1, "1/2")
			.unwrap();
		builder.build().unwrap()
	}

	#[test]
	fn bounds_resolve_blocked_pairs_before_assumptions() {
		let dtmc = two_choices();
		let property = ReachabilityProperty::eventually(StateSet::from([2]));
		let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();

		let mut plain =
			OrderExtender::new(&dtmc, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
		assert_eq!(plain.to_order(None).unresolved, Some((0, 1)));

		let mut extender = OrderExtender::new(&dtmc, &property, &region, ExtenderSettings::default()).unwrap();
		extender.set_assumption_validator(Box::new(PanickingValidator));
		let lower = vec![0.5, 0.1, 1.0, 0.0, 0.0];
		let upper = vec![0.8, 0.4, 1.0, 0.0, 1.0];
		let result = extender.to_order_with_bounds(lower, upper, None).unwrap();
		assert!(result.is_complete());
		assert_eq!(result.order.compare(0, 1), NodeComparison::Above);
		assert_eq!(result.order.compare(0, 4), NodeComparison::Above);
		assert_eq!(result.order.compare(4, 1), NodeComparison::Above);

		// the stored bounds also serve later extensions that may use assumptions
		let order = extender.bottom_top_order().clone();
		let extended = extender.extend_order(order, None, None);
		assert!(extended.is_complete());
		assert_eq!(extended.order.compare(0, 1), NodeComparison::Above);
	}

	/// 2 mixes 3 with the sink, and 4 splits evenly between 5 and 6.
	fn backward_model() -> crate::model::model::ParametricDtmc {
		let mut builder = DtmcBuilder::with_states(7);
		builder
			.transition(2, 3, "p")
			.unwrap()
			.transition(2, 1, "1-p")
			.unwrap()
			.transition(4, 5, "1/2")
			.unwrap()
			.transition(4, 6, "1/2")
			.unwrap();
		for state in [3, 5, 6] {
			builder
				.transition(state, 0, "p")
				.unwrap()
				.transition(state, 1, "1-p")
				.unwrap();
		}
		builder.build().unwrap()
	}

	#[test]
	fn backward_reasoning_balances_lower_successors() {
		let dtmc = backward_model();
		let property = ReachabilityProperty::eventually(StateSet::from([0]));
		let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();
		let extender =
			OrderExtender::new(&dtmc, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
		let mut order = extender.bottom_top_order().clone();
		order.add(2);
		assert!(!order.contains(3));
		assert!(matches!(
			extender.extend_by_backward_reasoning(&mut order, 2),
			Step::Placed(2)
		));
		assert_eq!(order.compare(3, 2), NodeComparison::Above);
		assert_eq!(order.compare(0, 3), NodeComparison::Above);
	}

	#[test]
	fn backward_reasoning_joins_equal_successors() {
		let dtmc = backward_model();
		let property = ReachabilityProperty::eventually(StateSet::from([0]));
		let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();
		let extender =
			OrderExtender::new(&dtmc, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
		let mut order = extender.bottom_top_order().clone();
		let node = order.add(4);
		order.add_to_node(5, node);
		assert!(matches!(
			extender.extend_by_backward_reasoning(&mut order, 4),
			Step::Placed(4)
		));
		assert_eq!(order.compare(6, 4), NodeComparison::Same);
		assert_eq!(order.compare(6, 5), NodeComparison::Same);
	}

	#[test]
	fn bound_vectors_must_cover_every_state() {
		let mut builder = DtmcBuilder::with_states(2);
		builder.transition(0, 1, "1").unwrap();
		let dtmc = builder.build().unwrap();
		let property = ReachabilityProperty::eventually(StateSet::from([1]));
		let mut extender = OrderExtender::new(
			&dtmc,
			&property,
			&ParameterRegion::new(),
			ExtenderSettings::without_assumptions(),
		)
		.unwrap();
		assert!(matches!(
			extender.to_order_with_bounds(vec![0.0], vec![1.0, 1.0], None),
			Err(AnalysisError::StateCountMismatch { found: 1, .. })
		));
	}
}
