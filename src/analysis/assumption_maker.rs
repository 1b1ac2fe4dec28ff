use std::collections::BTreeMap;

use super::assumption::{AllowedRelation, Assumption, AssumptionStatus, StateVariableEnvironment};
use super::assumption_checker::AssumptionValidator;
use super::order::Order;
use crate::logging::messages::*;
use crate::model::region::ParameterRegion;

/// Proposes relations between two states the order cannot compare yet and
/// keeps those the validator does not reject.
pub struct AssumptionMaker<'a> {
	validator: Box<dyn AssumptionValidator + 'a>,
	environment: StateVariableEnvironment,
}

impl<'a> AssumptionMaker<'a> {
	pub fn new(validator: Box<dyn AssumptionValidator + 'a>) -> Self {
		Self {
			validator,
			environment: StateVariableEnvironment::new(),
		}
	}

	pub fn environment(&self) -> &StateVariableEnvironment {
		&self.environment
	}

	/// Tries `a > b`, `b > a` and `a = b` in this order. A valid candidate is
	/// returned alone; otherwise every candidate that is not invalid is
	/// returned with status `Unknown`.
	pub fn create_and_check_assumptions(
		&mut self,
		a: usize,
		b: usize,
		order: &Order,
		region: &ParameterRegion,
	) -> BTreeMap<Assumption, AssumptionStatus> {
		let (var_a, var_b) = (self.environment.variable(a), self.environment.variable(b));
		let candidates = [
			Assumption::new(var_a.clone(), var_b.clone(), AllowedRelation::GreaterThan),
			Assumption::new(var_b, var_a.clone(), AllowedRelation::GreaterThan),
			Assumption::new(var_a, self.environment.variable(b), AllowedRelation::Equal),
		];

		let mut result = BTreeMap::new();
		for (index, candidate) in candidates.iter().enumerate() {
			match self.validator.validate_assumption(candidate, order, region) {
				AssumptionStatus::Invalid => {}
				AssumptionStatus::Unknown => {
					result.insert(candidate.clone(), AssumptionStatus::Unknown);
				}
				AssumptionStatus::Valid => {
					debug_assert!(
						candidates[index + 1..].iter().all(|other| {
							self.validator.validate_assumption(other, order, region) != AssumptionStatus::Valid
						}),
						"More than one of the assumptions on {} and {} is valid",
						a,
						b
					);
					debug_message!("Assumption {} is valid", candidate);
					return BTreeMap::from([(candidate.clone(), AssumptionStatus::Valid)]);
				}
			}
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use super::*;
	use crate::model::model::StateSet;

	/// Answers from a fixed table and records every query
	struct TableValidator {
		answers: BTreeMap<(usize, usize, AllowedRelation), AssumptionStatus>,
		queries: RefCell<Vec<String>>,
	}

	impl AssumptionValidator for TableValidator {
		fn validate_assumption(&self, assumption: &Assumption, _: &Order, _: &ParameterRegion) -> AssumptionStatus {
			self.queries.borrow_mut().push(assumption.to_string());
			let key = (assumption.left_state(), assumption.right_state(), assumption.relation());
			self.answers.get(&key).copied().unwrap_or(AssumptionStatus::Unknown)
		}
	}

	fn maker(answers: &[((usize, usize, AllowedRelation), AssumptionStatus)]) -> AssumptionMaker<'static> {
		AssumptionMaker::new(Box::new(TableValidator {
			answers: answers.iter().cloned().collect(),
			queries: RefCell::new(Vec::new()),
		}))
	}

	fn order() -> Order {
		Order::new(&StateSet::from([0]), &StateSet::from([1]), 4)
	}

	#[test]
	fn valid_assumption_short_circuits() {
		let mut maker = maker(&[((3, 2, AllowedRelation::GreaterThan), AssumptionStatus::Valid)]);
		let result = maker.create_and_check_assumptions(2, 3, &order(), &ParameterRegion::new());
		assert_eq!(result.len(), 1);
		let (assumption, status) = result.iter().next().unwrap();
		assert_eq!(assumption.to_string(), "s3 > s2");
		assert_eq!(*status, AssumptionStatus::Valid);
		assert_eq!(maker.environment().len(), 2);
	}

	#[test]
	fn invalid_assumptions_are_dropped() {
		let mut maker = maker(&[
			((2, 3, AllowedRelation::GreaterThan), AssumptionStatus::Invalid),
			((2, 3, AllowedRelation::Equal), AssumptionStatus::Invalid),
		]);
		let result = maker.create_and_check_assumptions(2, 3, &order(), &ParameterRegion::new());
		assert_eq!(result.len(), 1);
		assert!(result.keys().all(|assumption| assumption.to_string() == "s3 > s2"));
		assert!(result.values().all(|status| *status == AssumptionStatus::Unknown));
	}

	#[test]
	fn nothing_helps() {
		let mut maker = maker(&[
			((2, 3, AllowedRelation::GreaterThan), AssumptionStatus::Invalid),
			((3, 2, AllowedRelation::GreaterThan), AssumptionStatus::Invalid),
			((2, 3, AllowedRelation::Equal), AssumptionStatus::Invalid),
		]);
		assert!(maker
			.create_and_check_assumptions(2, 3, &order(), &ParameterRegion::new())
			.is_empty());
	}

	#[test]
	#[should_panic]
	#[cfg(debug_assertions)]
	fn two_valid_assumptions_are_a_bug() {
		let mut maker = maker(&[
			((2, 3, AllowedRelation::GreaterThan), AssumptionStatus::Valid),
			((2, 3, AllowedRelation::Equal), AssumptionStatus::Valid),
		]);
		maker.create_and_check_assumptions(2, 3, &order(), &ParameterRegion::new());
	}
}
