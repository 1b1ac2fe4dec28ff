use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::symbolic::parameter::Parameter;

/// Effect of increasing a parameter on a reachability probability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Monotonicity {
	Incr,
	Decr,
	Constant,
	Not,
	Unknown,
}

impl Monotonicity {
	/// Join of two classifications. `Constant` is neutral, opposite
	/// directions give `Not`, `Unknown` absorbs everything.
	pub fn combine(self, other: Monotonicity) -> Monotonicity {
		use Monotonicity::*;
		match (self, other) {
			(Unknown, _) | (_, Unknown) => Unknown,
			(Not, _) | (_, Not) => Not,
			(Constant, other) | (other, Constant) => other,
			(Incr, Incr) => Incr,
			(Decr, Decr) => Decr,
			(Incr, Decr) | (Decr, Incr) => Not,
		}
	}

	/// Incr, Decr or Constant
	pub fn is_definite(self) -> bool {
		matches!(self, Monotonicity::Incr | Monotonicity::Decr | Monotonicity::Constant)
	}
}

impl fmt::Display for Monotonicity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			Monotonicity::Incr => "Incr",
			Monotonicity::Decr => "Decr",
			Monotonicity::Constant => "Constant",
			Monotonicity::Not => "Not",
			Monotonicity::Unknown => "Unknown",
		};
		write!(f, "{}", text)
	}
}

/// Local monotonicity of a state from the classifications of its
/// transitions, ranked from the highest to the lowest successor.
///
/// The first non-constant transition fixes the direction. After that a single
/// change of direction is tolerated (probability mass moving from high to low
/// successors can still be monotone), but going back to the fixed direction,
/// or meeting a `Not`/`Unknown` transition, gives `Unknown`.
pub fn accumulate_ranked_monotonicity(ranked: &[Monotonicity]) -> Monotonicity {
	let mut local = Monotonicity::Constant;
	let mut index = 0;
	while index < ranked.len() && local == Monotonicity::Constant {
		local = ranked[index];
		if local == Monotonicity::Not && ranked.len() != 1 {
			local = Monotonicity::Unknown;
		}
		index += 1;
	}

	let mut allowed_to_swap = true;
	while index < ranked.len() && local != Monotonicity::Not && local != Monotonicity::Unknown {
		let transition = ranked[index];
		if transition == Monotonicity::Not || transition == Monotonicity::Unknown {
			return Monotonicity::Unknown;
		}
		if allowed_to_swap {
			if transition != Monotonicity::Constant && transition != local {
				allowed_to_swap = false;
			}
		} else if transition == local {
			local = Monotonicity::Unknown;
		}
		index += 1;
	}
	local
}

/// Classification per parameter, plus a `done` flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonotonicityResult {
	results: BTreeMap<Parameter, Monotonicity>,
	done: bool,
}

impl MonotonicityResult {
	pub fn new() -> Self {
		Self::default()
	}

	/// Overwrites the classification of `parameter`
	pub fn add_monotonicity_result(&mut self, parameter: Parameter, monotonicity: Monotonicity) {
		self.results.insert(parameter, monotonicity);
	}

	/// Joins `monotonicity` into the classification of `parameter`
	pub fn update_monotonicity_result(&mut self, parameter: Parameter, monotonicity: Monotonicity) {
		let entry = self.results.entry(parameter).or_insert(Monotonicity::Constant);
		*entry = entry.combine(monotonicity);
	}

	pub fn get_monotonicity(&self, parameter: &Parameter) -> Monotonicity {
		self.results
			.get(parameter)
			.copied()
			.unwrap_or(Monotonicity::Unknown)
	}

	pub fn contains(&self, parameter: &Parameter) -> bool {
		self.results.contains_key(parameter)
	}

	pub fn results(&self) -> &BTreeMap<Parameter, Monotonicity> {
		&self.results
	}

	/// Whether every recorded parameter is Incr, Decr or Constant
	pub fn is_all_monotonicity(&self) -> bool {
		self.results.values().all(|m| m.is_definite())
	}

	/// Partitions `parameters` into monotone and non-monotone ones
	pub fn split_variables(&self, parameters: &BTreeSet<Parameter>) -> (BTreeSet<Parameter>, BTreeSet<Parameter>) {
		parameters
			.iter()
			.cloned()
			.partition(|parameter| self.get_monotonicity(parameter).is_definite())
	}

	pub fn is_done(&self) -> bool {
		self.done
	}

	pub fn set_done(&mut self, done: bool) {
		self.done = done;
	}
}

impl fmt::Display for MonotonicityResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let entries = self
			.results
			.iter()
			.map(|(parameter, monotonicity)| format!("{} {}", parameter, monotonicity))
			.collect::<Vec<_>>();
		write!(f, "{}", entries.join("; "))
	}
}
