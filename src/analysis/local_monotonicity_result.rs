use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::monotonicity::{Monotonicity, MonotonicityResult};
use crate::symbolic::parameter::Parameter;

const KINDS: [Monotonicity; 5] = [
	Monotonicity::Incr,
	Monotonicity::Decr,
	Monotonicity::Constant,
	Monotonicity::Not,
	Monotonicity::Unknown,
];

fn slot(monotonicity: Monotonicity) -> usize {
	match monotonicity {
		Monotonicity::Incr => 0,
		Monotonicity::Decr => 1,
		Monotonicity::Constant => 2,
		Monotonicity::Not => 3,
		Monotonicity::Unknown => 4,
	}
}

/// Monotonicity per state and parameter, with a global summary that is kept
/// in sync as states are classified.
#[derive(Clone, Debug)]
pub struct LocalMonotonicityResult {
	state_results: Vec<Option<MonotonicityResult>>,
	global: MonotonicityResult,
	tallies: BTreeMap<Parameter, [usize; KINDS.len()]>,
	states_monotone: Vec<bool>,
	parameters: BTreeSet<Parameter>,
	done: bool,
	index_minimize: Option<usize>,
	index_maximize: Option<usize>,
}

impl LocalMonotonicityResult {
	pub fn new(number_of_states: usize, parameters: BTreeSet<Parameter>) -> Self {
		Self {
			state_results: vec![None; number_of_states],
			global: MonotonicityResult::new(),
			tallies: BTreeMap::new(),
			states_monotone: vec![false; number_of_states],
			parameters,
			done: false,
			index_minimize: None,
			index_maximize: None,
		}
	}

	pub fn number_of_states(&self) -> usize {
		self.state_results.len()
	}

	pub fn parameters(&self) -> &BTreeSet<Parameter> {
		&self.parameters
	}

	pub fn get_monotonicity(&self, state: usize, parameter: &Parameter) -> Monotonicity {
		match &self.state_results[state] {
			Some(result) => result.get_monotonicity(parameter),
			None if self.states_monotone[state] => Monotonicity::Constant,
			None => Monotonicity::Unknown,
		}
	}

	pub fn state_result(&self, state: usize) -> Option<&MonotonicityResult> {
		self.state_results[state].as_ref()
	}

	pub fn global_monotonicity_result(&self) -> &MonotonicityResult {
		&self.global
	}

	/// Records the classification of `parameter` at `state`. Later calls for
	/// the same pair replace earlier ones.
	pub fn set_monotonicity(&mut self, state: usize, parameter: &Parameter, monotonicity: Monotonicity) {
		let result = self.state_results[state].get_or_insert_with(MonotonicityResult::new);
		let previous = result.contains(parameter).then(|| result.get_monotonicity(parameter));
		result.add_monotonicity_result(parameter.clone(), monotonicity);
		self.update_global(parameter, previous, monotonicity);

		if !monotonicity.is_definite() {
			self.states_monotone[state] = false;
		} else {
			self.states_monotone[state] = self.is_state_definite(state);
			if self.is_done() {
				self.global.set_done(true);
			}
		}
	}

	fn is_state_definite(&self, state: usize) -> bool {
		let Some(result) = &self.state_results[state] else {
			return false;
		};
		if self.parameters.is_empty() {
			return result.is_all_monotonicity();
		}
		self.parameters
			.iter()
			.all(|parameter| result.contains(parameter) && result.get_monotonicity(parameter).is_definite())
	}

	/// The global entry for `parameter` is the join over all states that have
	/// one, kept as a count per kind so a replaced entry can be taken back.
	/// A join of `Not` is reported as `Unknown`: local non-monotonicity does
	/// not prove the reachability probability is non-monotone.
	fn update_global(&mut self, parameter: &Parameter, previous: Option<Monotonicity>, current: Monotonicity) {
		let tally = self.tallies.entry(parameter.clone()).or_insert([0; KINDS.len()]);
		if let Some(previous) = previous {
			tally[slot(previous)] -= 1;
		}
		tally[slot(current)] += 1;
		let joined = KINDS
			.iter()
			.zip(tally.iter())
			.filter(|&(_, &count)| count > 0)
			.fold(Monotonicity::Constant, |acc, (&kind, _)| acc.combine(kind));
		let reported = match joined {
			Monotonicity::Not => Monotonicity::Unknown,
			other => other,
		};
		self.global.add_monotonicity_result(parameter.clone(), reported);
	}

	/// Marks `state` as constant in every parameter
	pub fn set_constant(&mut self, state: usize) {
		self.states_monotone[state] = true;
	}

	pub fn is_state_monotone(&self, state: usize) -> bool {
		self.states_monotone[state]
	}

	/// Independent deep copy, used when a region is split
	pub fn copy(&self) -> Self {
		self.clone()
	}

	pub fn is_done(&self) -> bool {
		self.done || self.states_monotone.iter().all(|&monotone| monotone)
	}

	pub fn set_done(&mut self, done: bool) {
		self.done = done;
	}

	/// Whether no state is known to be monotone
	pub fn is_no_monotonicity(&self) -> bool {
		!self.states_monotone.iter().any(|&monotone| monotone)
	}

	/// Panics if the index was set before.
	pub fn set_index_minimize(&mut self, index: usize) {
		assert!(
			self.index_minimize.is_none(),
			"Minimize index is already set to {:?}",
			self.index_minimize
		);
		self.index_minimize = Some(index);
	}

	pub fn set_index_maximize(&mut self, index: usize) {
		self.index_maximize = Some(index);
	}

	pub fn index_minimize(&self) -> Option<usize> {
		self.index_minimize
	}

	pub fn index_maximize(&self) -> Option<usize> {
		self.index_maximize
	}
}

impl fmt::Display for LocalMonotonicityResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Local Monotonicity Result:")?;
		for (state, result) in self.state_results.iter().enumerate() {
			match result {
				Some(result) => writeln!(f, "state {}: {}", state, result)?,
				None if self.states_monotone[state] => writeln!(f, "state {}: constant", state)?,
				None => writeln!(f, "state {}: not analyzed", state)?,
			}
		}
		write!(f, "global: {}", self.global)
	}
}
