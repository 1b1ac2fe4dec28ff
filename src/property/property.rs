use crate::error::error::AnalysisError;
use crate::model::model::{ParametricDtmc, StateSet};

/// Unbounded reachability, `P=? [ F psi ]` or `P=? [ phi U psi ]`, over
/// explicit state sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReachabilityProperty {
	Finally(StateSet),
	Until(StateSet, StateSet),
}

impl ReachabilityProperty {
	pub fn eventually(target: StateSet) -> Self {
		Self::Finally(target)
	}

	pub fn until(constraint: StateSet, target: StateSet) -> Self {
		Self::Until(constraint, target)
	}

	/// `F label`, reading the target states from the model's labelling
	pub fn eventually_label(model: &ParametricDtmc, label: &str) -> Result<Self, AnalysisError> {
		model
			.states_with_label(label)
			.map(|states| Self::Finally(states.clone()))
			.ok_or_else(|| AnalysisError::InvalidModel(format!("no state carries label `{}`", label)))
	}

	pub fn target(&self) -> &StateSet {
		match self {
			Self::Finally(target) | Self::Until(_, target) => target,
		}
	}

	/// The `phi` states; every state for `F psi`
	pub fn constraint(&self, state_count: usize) -> StateSet {
		match self {
			Self::Finally(_) => (0..state_count).collect(),
			Self::Until(constraint, _) => constraint.clone(),
		}
	}

	/// Fails if the property mentions states the model does not have
	pub fn check_states(&self, state_count: usize) -> Result<(), AnalysisError> {
		let sets = match self {
			Self::Finally(target) => vec![target],
			Self::Until(constraint, target) => vec![constraint, target],
		};
		match sets.into_iter().flatten().find(|state| **state >= state_count) {
			Some(state) => Err(AnalysisError::StateCountMismatch {
				what: format!("property state {}", state),
				expected: state_count,
				found: state + 1,
			}),
			None => Ok(()),
		}
	}
}

impl std::fmt::Display for ReachabilityProperty {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Finally(target) => write!(f, "P=? [ F {:?} ]", target),
			Self::Until(constraint, target) => write!(f, "P=? [ {:?} U {:?} ]", constraint, target),
		}
	}
}
