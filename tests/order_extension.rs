use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use practice_pars::analysis::assumption::{AllowedRelation, Assumption, AssumptionStatus, StateVariableEnvironment};
use practice_pars::analysis::assumption_checker::{AssumptionChecker, AssumptionValidator};
use practice_pars::analysis::local_monotonicity_result::LocalMonotonicityResult;
use practice_pars::analysis::monotonicity::Monotonicity;
use practice_pars::analysis::order::{NodeComparison, Order};
use practice_pars::analysis::order_extender::OrderExtender;
use practice_pars::analysis::settings::ExtenderSettings;
use practice_pars::demos::models;
use practice_pars::error::error::AnalysisError;
use practice_pars::model::model::{DtmcBuilder, ParametricDtmc, StateSet};
use practice_pars::model::region::ParameterRegion;
use practice_pars::property::property::ReachabilityProperty;
use practice_pars::symbolic::parameter::Parameter;

/// Fails the test if the extender ever asks for an assumption
struct PanickingValidator;

impl AssumptionValidator for PanickingValidator {
	fn validate_assumption(&self, assumption: &Assumption, _: &Order, _: &ParameterRegion) -> AssumptionStatus {
		panic!("No assumption should be needed, got {}", assumption);
	}
}

/// Counts queries and never decides anything
struct CountingValidator(Rc<Cell<usize>>);

impl AssumptionValidator for CountingValidator {
	fn validate_assumption(&self, _: &Assumption, _: &Order, _: &ParameterRegion) -> AssumptionStatus {
		self.0.set(self.0.get() + 1);
		AssumptionStatus::Unknown
	}
}

fn p() -> Parameter {
	Parameter::new("p")
}

fn result_for(model: &ParametricDtmc, extender: &OrderExtender) -> LocalMonotonicityResult {
	LocalMonotonicityResult::new(model.state_count(), extender.parameters().clone())
}

/// 4 picks state 0 (goal with p) or state 1 (goal with p/2); 2 is the goal
/// and 3 the sink.
fn weaker_twin() -> ParametricDtmc {
	let mut builder = DtmcBuilder::with_states(5);
	builder
		.transition(4, 0, "1/2")
		.unwrap()
		.transition(4, 1, "1/2")
		.unwrap()
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

#[test]
fn coin_direction_depends_on_the_target() {
	let case = models::coin().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();

	for (target, expected) in [(1, Monotonicity::Incr), (2, Monotonicity::Decr)] {
		let property = ReachabilityProperty::eventually(StateSet::from([target]));
		let mut extender =
			OrderExtender::new(&case.model, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
		let mut mon_res = result_for(&case.model, &extender);
		let result = extender.to_order(Some(&mut mon_res));
		assert!(result.is_complete());
		assert!(result.order.done_building());
		assert_eq!(mon_res.get_monotonicity(0, &p()), expected);
		assert_eq!(mon_res.global_monotonicity_result().get_monotonicity(&p()), expected);
		assert!(mon_res.is_done());
	}
}

#[test]
fn target_ranks_above_non_target_without_assumptions() {
	let case = models::coin().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let mut extender = OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::default()).unwrap();
	extender.set_assumption_validator(Box::new(PanickingValidator));
	let result = extender.to_order(None);
	assert_eq!(result.unresolved, None);
	assert_eq!(result.order.compare(1, 2), NodeComparison::Above);
	assert_eq!(result.order.compare(0, 2), NodeComparison::Above);
	assert_eq!(result.order.compare(1, 0), NodeComparison::Above);
}

#[test]
fn incomparable_pair_is_returned() {
	let case = models::incomparable().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let mut extender =
		OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::without_assumptions()).unwrap();
	let mut mon_res = result_for(&case.model, &extender);
	let result = extender.to_order(Some(&mut mon_res));
	assert_eq!(result.unresolved, Some((0, 1)));
	assert_eq!(result.order.compare(0, 1), NodeComparison::Unknown);
	assert!(!result.order.contains(4));
	// the coins themselves were ranked when they were placed
	assert_eq!(mon_res.get_monotonicity(0, &p()), Monotonicity::Incr);
	assert_eq!(mon_res.get_monotonicity(4, &p()), Monotonicity::Unknown);
}

#[test]
fn undecided_assumptions_leave_the_pair_unresolved() {
	let case = models::incomparable().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let queries = Rc::new(Cell::new(0));
	let mut extender = OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::default()).unwrap();
	extender.set_assumption_validator(Box::new(CountingValidator(queries.clone())));
	let result = extender.to_order(None);
	assert_eq!(result.unresolved, Some((0, 1)));
	assert_eq!(queries.get(), 3);
}

#[test]
fn real_checker_cannot_order_independent_coins() {
	let case = models::incomparable().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let mut extender = OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::default()).unwrap();
	let result = extender.to_order(None);
	assert_eq!(result.unresolved, Some((0, 1)));
}

#[test]
fn repeated_extension_returns_the_same_pair() {
	let case = models::incomparable().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let mut extender =
		OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::without_assumptions()).unwrap();
	let first = extender.to_order(None);
	let second = extender.extend_order(first.order, None, None);
	assert_eq!(second.unresolved, Some((0, 1)));
	let third = extender.extend_order(second.order, None, None);
	assert_eq!(third.unresolved, Some((0, 1)));
}

#[test]
fn external_assumption_completes_the_order() {
	let case = models::incomparable().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let mut extender =
		OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::without_assumptions()).unwrap();
	let mut mon_res = result_for(&case.model, &extender);
	let first = extender.to_order(Some(&mut mon_res));

	let mut environment = StateVariableEnvironment::new();
	let assumption = Assumption::new(environment.variable(0), environment.variable(1), AllowedRelation::GreaterThan);
	let result = extender.extend_order(first.order, Some(&mut mon_res), Some(&assumption));
	assert!(result.is_complete());
	assert_eq!(result.order.compare(0, 4), NodeComparison::Above);
	assert_eq!(result.order.compare(4, 1), NodeComparison::Above);
	// 4 is a constant mix of the two coins
	assert_eq!(mon_res.get_monotonicity(4, &p()), Monotonicity::Constant);
	assert_eq!(mon_res.get_monotonicity(1, &Parameter::new("q")), Monotonicity::Incr);
}

#[test]
fn valid_assumption_is_found_and_applied() {
	let model = weaker_twin();
	let property = ReachabilityProperty::eventually(StateSet::from([2]));
	let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();
	let mut extender = OrderExtender::new(&model, &property, &region, ExtenderSettings::default()).unwrap();
	let result = extender.to_order(None);
	assert!(result.is_complete());
	assert_eq!(result.order.compare(0, 1), NodeComparison::Above);

	let mut without =
		OrderExtender::new(&model, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
	assert_eq!(without.to_order(None).unresolved, Some((0, 1)));
}

#[test]
fn at_most_one_relation_is_valid() {
	let model = weaker_twin();
	let region: ParameterRegion = "0.2<=p<=0.8".parse().unwrap();
	let order = Order::new(&StateSet::from([2]), &StateSet::from([3]), 5);
	let checker = AssumptionChecker::new(model.matrix());
	let mut environment = StateVariableEnvironment::new();
	let (s0, s1) = (environment.variable(0), environment.variable(1));
	let valid = [AllowedRelation::GreaterThan, AllowedRelation::LessThan, AllowedRelation::Equal]
		.into_iter()
		.filter(|&relation| {
			let assumption = Assumption::new(s0.clone(), s1.clone(), relation);
			checker.validate_assumption(&assumption, &order, &region) == AssumptionStatus::Valid
		})
		.collect::<Vec<_>>();
	assert_eq!(valid, vec![AllowedRelation::GreaterThan]);
}

#[test]
fn cycles_are_broken_and_ranked() {
	let case = models::chain().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let mut extender =
		OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::without_assumptions()).unwrap();
	assert!(extender.is_cyclic());
	let mut mon_res = result_for(&case.model, &extender);
	let result = extender.to_order(Some(&mut mon_res));
	assert!(result.is_complete());
	assert_eq!(result.order.sort_states(&[3, 0, 2, 1]), vec![2, 1, 0, 3]);
	assert_eq!(mon_res.get_monotonicity(0, &p()), Monotonicity::Incr);
	assert_eq!(mon_res.get_monotonicity(1, &p()), Monotonicity::Incr);
	assert_eq!(mon_res.global_monotonicity_result().get_monotonicity(&p()), Monotonicity::Incr);
}

#[test]
fn parameter_free_rows_are_constant() {
	let mut builder = DtmcBuilder::with_states(4);
	builder
		.transition(0, 1, "1/3")
		.unwrap()
		.transition(0, 3, "2/3")
		.unwrap()
		.transition(1, 2, "p")
		.unwrap()
		.transition(1, 3, "1-p")
		.unwrap();
	let model = builder.build().unwrap();
	let property = ReachabilityProperty::eventually(StateSet::from([2]));
	let region: ParameterRegion = "0.1<=p<=0.9".parse().unwrap();
	let mut extender =
		OrderExtender::new(&model, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
	let mut mon_res = result_for(&model, &extender);
	extender.to_order(Some(&mut mon_res));
	assert_eq!(mon_res.get_monotonicity(0, &p()), Monotonicity::Constant);
	assert_eq!(mon_res.get_monotonicity(1, &p()), Monotonicity::Incr);
	assert!(mon_res.is_state_monotone(0));
}

#[test]
fn copies_of_results_are_independent() {
	let case = models::coin().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	let mut extender =
		OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::without_assumptions()).unwrap();
	let mut mon_res = result_for(&case.model, &extender);
	extender.to_order(Some(&mut mon_res));
	let mut copy = mon_res.copy();
	copy.set_monotonicity(0, &p(), Monotonicity::Unknown);
	assert_eq!(mon_res.get_monotonicity(0, &p()), Monotonicity::Incr);
	assert_eq!(copy.get_monotonicity(0, &p()), Monotonicity::Unknown);
	assert!(mon_res.is_done());
	assert!(!copy.is_done());
}

#[test]
fn regions_must_cover_the_parameters() {
	let case = models::incomparable().unwrap();
	let region: ParameterRegion = "0.1<=p<=0.9".parse().unwrap();
	let result = OrderExtender::new(&case.model, &case.property, &region, ExtenderSettings::default());
	assert!(matches!(result, Err(AnalysisError::MissingParameter(name)) if name == "q"));
}

#[test]
fn until_constraints_shape_the_extremal_states() {
	let case = models::coin().unwrap();
	let region: ParameterRegion = case.default_region.parse().unwrap();
	// leaving state 0 is not allowed, so only the goal itself reaches the goal
	let property = ReachabilityProperty::until(StateSet::new(), StateSet::from([1]));
	let extender = OrderExtender::new(&case.model, &property, &region, ExtenderSettings::without_assumptions()).unwrap();
	let order = extender.bottom_top_order();
	assert!(order.is_top_state(1));
	assert!(order.is_bottom_state(0));
	assert!(order.is_bottom_state(2));
	assert_eq!(order.number_of_added_states(), 3);
	let expected: BTreeSet<usize> = [0, 2].into_iter().collect();
	assert_eq!(order.states_of(order.bottom()), &expected);
}
