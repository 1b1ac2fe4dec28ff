use nalgebra::{DMatrix, DVector};

use super::model::{SparseMatrix, StateSet};
use crate::symbolic::parameter::Valuation;

/// Reachability probabilities of every state at one parameter valuation.
/// States in `prob0`/`prob1` get 0/1; the remaining ones solve
/// `(I - P) x = b`. Returns `None` if the system is singular or the
/// valuation leaves an entry undefined.
pub fn reachability_at(
	matrix: &SparseMatrix,
	prob0: &StateSet,
	prob1: &StateSet,
	valuation: &Valuation,
) -> Option<DVector<f64>> {
	let n = matrix.row_count();
	let maybe = (0..n)
		.filter(|s| !prob0.contains(s) && !prob1.contains(s))
		.collect::<Vec<_>>();
	let mut index_of = vec![None; n];
	for (index, &state) in maybe.iter().enumerate() {
		index_of[state] = Some(index);
	}

	let mut system = DMatrix::<f64>::identity(maybe.len(), maybe.len());
	let mut rhs = DVector::<f64>::zeros(maybe.len());
	for (row, &state) in maybe.iter().enumerate() {
		for entry in matrix.row(state) {
			let value = entry.value().evaluate(valuation);
			if !value.is_finite() {
				return None;
			}
			if prob1.contains(&entry.column()) {
				rhs[row] += value;
			} else if let Some(column) = index_of[entry.column()] {
				system[(row, column)] -= value;
			}
		}
	}

	let solution = if maybe.is_empty() {
		DVector::zeros(0)
	} else {
		system.lu().solve(&rhs)?
	};
	let mut result = DVector::<f64>::zeros(n);
	for state in 0..n {
		result[state] = match index_of[state] {
			Some(index) => solution[index],
			None if prob1.contains(&state) => 1.0,
			None => 0.0,
		};
	}
	Some(result)
}
