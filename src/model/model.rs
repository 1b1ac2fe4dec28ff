use std::collections::{BTreeMap, BTreeSet};

use crate::error::error::AnalysisError;
use crate::symbolic::parameter::Parameter;
use crate::symbolic::rational_function::RationalFunction;

/// A set of state indices
pub type StateSet = BTreeSet<usize>;

/// A trait representing a model under explicit construction: states are
/// dense indices and transitions are entries of a sparse matrix.
pub trait ExplicitModel: Default {
	type EntryType;
	type MatrixType;

	/// The number of states added to our model so far
	fn state_count(&self) -> usize;

	/// Makes sure `index` is a state of the model. Returns whether the index
	/// was newly reserved.
	fn reserve_index(&mut self, index: usize) -> bool;

	/// Adds an entry to the sparse matrix. Entries for the same pair of
	/// states are summed.
	fn add_entry(&mut self, from_idx: usize, to_idx: usize, entry: Self::EntryType);

	/// Converts this model into a sparse matrix
	fn to_matrix(&self) -> Self::MatrixType;

	/// Whether or not this model has no states yet
	fn is_empty(&self) -> bool {
		self.state_count() == 0
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixEntry {
	column: usize,
	value: RationalFunction,
}

impl MatrixEntry {
	pub fn new(column: usize, value: RationalFunction) -> Self {
		Self { column, value }
	}

	pub fn column(&self) -> usize {
		self.column
	}

	pub fn value(&self) -> &RationalFunction {
		&self.value
	}
}

/// Square row-major sparse matrix of parametric transition weights. Row
/// entries are sorted by column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SparseMatrix {
	rows: Vec<Vec<MatrixEntry>>,
}

impl SparseMatrix {
	pub fn from_rows(rows: Vec<Vec<MatrixEntry>>) -> Result<Self, AnalysisError> {
		let n = rows.len();
		let mut rows = rows;
		for (index, row) in rows.iter_mut().enumerate() {
			if let Some(entry) = row.iter().find(|entry| entry.column >= n) {
				return Err(AnalysisError::InvalidModel(format!(
					"row {} has an entry in column {} but there are only {} states",
					index, entry.column, n
				)));
			}
			row.sort_by_key(|entry| entry.column);
		}
		Ok(Self { rows })
	}

	pub fn row_count(&self) -> usize {
		self.rows.len()
	}

	pub fn column_count(&self) -> usize {
		self.rows.len()
	}

	pub fn row(&self, state: usize) -> &[MatrixEntry] {
		&self.rows[state]
	}

	pub fn rows(&self) -> impl Iterator<Item = &[MatrixEntry]> {
		self.rows.iter().map(Vec::as_slice)
	}

	pub fn entry(&self, row: usize, column: usize) -> Option<&RationalFunction> {
		self.rows
			.get(row)?
			.binary_search_by_key(&column, |entry| entry.column)
			.ok()
			.map(|position| &self.rows[row][position].value)
	}

	/// All parameters occurring in some entry
	pub fn parameters(&self) -> BTreeSet<Parameter> {
		self.rows
			.iter()
			.flatten()
			.flat_map(|entry| entry.value.variables())
			.collect()
	}

	/// Whether some entry of the row depends on `parameter`
	pub fn row_depends_on(&self, state: usize, parameter: &Parameter) -> bool {
		self.rows[state]
			.iter()
			.any(|entry| entry.value.contains_variable(parameter))
	}
}

/// A discrete-time Markov chain whose transition probabilities are rational
/// functions over the parameters.
#[derive(Clone, Debug)]
pub struct ParametricDtmc {
	matrix: SparseMatrix,
	initial_states: StateSet,
	labels: BTreeMap<String, StateSet>,
	parameters: BTreeSet<Parameter>,
}

impl ParametricDtmc {
	pub fn matrix(&self) -> &SparseMatrix {
		&self.matrix
	}

	pub fn state_count(&self) -> usize {
		self.matrix.row_count()
	}

	pub fn initial_states(&self) -> &StateSet {
		&self.initial_states
	}

	pub fn parameters(&self) -> &BTreeSet<Parameter> {
		&self.parameters
	}

	pub fn labels(&self) -> impl Iterator<Item = &str> {
		self.labels.keys().map(String::as_str)
	}

	pub fn states_with_label(&self, label: &str) -> Option<&StateSet> {
		self.labels.get(label)
	}
}

/// Incrementally assembles a [`ParametricDtmc`]. States without outgoing
/// transitions become absorbing.
#[derive(Clone, Debug, Default)]
pub struct DtmcBuilder {
	rows: Vec<BTreeMap<usize, RationalFunction>>,
	initial_states: StateSet,
	labels: BTreeMap<String, StateSet>,
}

impl DtmcBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_states(count: usize) -> Self {
		let mut builder = Self::default();
		if count > 0 {
			builder.reserve_index(count - 1);
		}
		builder
	}

	/// Adds a transition whose weight is read from `weight`, e.g. `"1-p"`
	pub fn transition(&mut self, from: usize, to: usize, weight: &str) -> Result<&mut Self, AnalysisError> {
		let value = weight.parse::<RationalFunction>()?;
		self.add_entry(from, to, value);
		Ok(self)
	}

	pub fn initial_state(&mut self, state: usize) -> &mut Self {
		self.reserve_index(state);
		self.initial_states.insert(state);
		self
	}

	pub fn label(&mut self, label: &str, state: usize) -> &mut Self {
		self.reserve_index(state);
		self.labels.entry(label.to_string()).or_default().insert(state);
		self
	}

	pub fn build(&self) -> Result<ParametricDtmc, AnalysisError> {
		if self.is_empty() {
			return Err(AnalysisError::InvalidModel("the model has no states".to_string()));
		}
		let matrix = self.to_matrix();
		let parameters = matrix.parameters();
		Ok(ParametricDtmc {
			matrix,
			initial_states: if self.initial_states.is_empty() {
				StateSet::from([0])
			} else {
				self.initial_states.clone()
			},
			labels: self.labels.clone(),
			parameters,
		})
	}
}

impl ExplicitModel for DtmcBuilder {
	type EntryType = RationalFunction;
	type MatrixType = SparseMatrix;

	fn state_count(&self) -> usize {
		self.rows.len()
	}

	fn reserve_index(&mut self, index: usize) -> bool {
		if index < self.rows.len() {
			return false;
		}
		self.rows.resize_with(index + 1, BTreeMap::new);
		true
	}

	fn add_entry(&mut self, from_idx: usize, to_idx: usize, entry: RationalFunction) {
		self.reserve_index(from_idx.max(to_idx));
		let row = &mut self.rows[from_idx];
		let sum = match row.remove(&to_idx) {
			Some(existing) => &existing + &entry,
			None => entry,
		};
		if !sum.is_zero() {
			row.insert(to_idx, sum);
		}
	}

	fn to_matrix(&self) -> SparseMatrix {
		let rows = self
			.rows
			.iter()
			.enumerate()
			.map(|(state, row)| {
				if row.is_empty() {
					vec![MatrixEntry::new(state, RationalFunction::one())]
				} else {
					row.iter()
						.map(|(column, value)| MatrixEntry::new(*column, value.clone()))
						.collect()
				}
			})
			.collect();
		SparseMatrix { rows }
	}
}
