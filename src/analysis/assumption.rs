use std::collections::BTreeMap;
use std::fmt;

/// Relations an assumption may state between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AllowedRelation {
	Equal,
	LessThan,
	GreaterThan,
}

impl fmt::Display for AllowedRelation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let relation_str = match self {
			AllowedRelation::Equal => "=",
			AllowedRelation::LessThan => "<",
			AllowedRelation::GreaterThan => ">",
		};
		write!(f, "{}", relation_str)
	}
}

/// Outcome of validating an assumption on a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssumptionStatus {
	Valid,
	Invalid,
	Unknown,
}

/// The symbolic variable standing for the reachability probability of a state
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateVariable {
	state: usize,
	name: String,
}

impl StateVariable {
	pub fn state(&self) -> usize {
		self.state
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl fmt::Display for StateVariable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name)
	}
}

/// Declares state variables on first use.
#[derive(Debug, Clone, Default)]
pub struct StateVariableEnvironment {
	variables: BTreeMap<usize, StateVariable>,
}

impl StateVariableEnvironment {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn variable(&mut self, state: usize) -> StateVariable {
		self.variables
			.entry(state)
			.or_insert_with(|| StateVariable {
				state,
				name: format!("s{}", state),
			})
			.clone()
	}

	pub fn len(&self) -> usize {
		self.variables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.variables.is_empty()
	}
}

/// `left relation right` between the reachability probabilities of two states
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Assumption {
	left: StateVariable,
	right: StateVariable,
	relation: AllowedRelation,
}

impl Assumption {
	pub fn new(left: StateVariable, right: StateVariable, relation: AllowedRelation) -> Self {
		Self { left, right, relation }
	}

	pub fn left_state(&self) -> usize {
		self.left.state
	}

	pub fn right_state(&self) -> usize {
		self.right.state
	}

	pub fn relation(&self) -> AllowedRelation {
		self.relation
	}

	/// `(above, below)` for a strict assumption, `None` for an equality
	pub fn strict_pair(&self) -> Option<(usize, usize)> {
		match self.relation {
			AllowedRelation::GreaterThan => Some((self.left.state, self.right.state)),
			AllowedRelation::LessThan => Some((self.right.state, self.left.state)),
			AllowedRelation::Equal => None,
		}
	}
}

impl fmt::Display for Assumption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} {}", self.left, self.relation, self.right)
	}
}
