use std::collections::VecDeque;

use crate::model::model::{SparseMatrix, StateSet};

/// Successor lists without self-loops or zero-weight entries.
pub fn successors(matrix: &SparseMatrix) -> Vec<Vec<usize>> {
	(0..matrix.row_count())
		.map(|state| {
			matrix
				.row(state)
				.iter()
				.filter(|entry| entry.column() != state && !entry.value().is_zero())
				.map(|entry| entry.column())
				.collect()
		})
		.collect()
}

pub fn predecessors(successors: &[Vec<usize>]) -> Vec<Vec<usize>> {
	let mut predecessors = vec![Vec::new(); successors.len()];
	for (state, targets) in successors.iter().enumerate() {
		for &target in targets {
			predecessors[target].push(state);
		}
	}
	predecessors
}

/// States that reach `from` moving backwards only through `through`
/// (the states of `from` included).
fn backward_reach(predecessors: &[Vec<usize>], from: &StateSet, through: &StateSet) -> StateSet {
	let mut reached = from.clone();
	let mut queue = from.iter().copied().collect::<VecDeque<_>>();
	while let Some(state) = queue.pop_front() {
		for &predecessor in &predecessors[state] {
			if through.contains(&predecessor) && reached.insert(predecessor) {
				queue.push_back(predecessor);
			}
		}
	}
	reached
}

/// The states reaching `psi` along `phi` with probability zero and with
/// probability one, decided on the graph alone.
pub fn prob01(matrix: &SparseMatrix, phi: &StateSet, psi: &StateSet) -> (StateSet, StateSet) {
	let n = matrix.row_count();
	let predecessors = predecessors(&successors(matrix));
	let phi_not_psi = phi.difference(psi).copied().collect::<StateSet>();

	let can_reach = backward_reach(&predecessors, psi, &phi_not_psi);
	let prob0 = (0..n).filter(|s| !can_reach.contains(s)).collect::<StateSet>();

	let can_fail = backward_reach(&predecessors, &prob0, &phi_not_psi);
	let prob1 = (0..n).filter(|s| !can_fail.contains(s)).collect::<StateSet>();
	(prob0, prob1)
}

/// Depth-first post-order over all states (successors before their
/// predecessors where the graph allows it), and whether a cycle was found.
pub fn traversal_order(successors: &[Vec<usize>]) -> (Vec<usize>, bool) {
	#[derive(Clone, Copy, PartialEq)]
	enum Mark {
		Unvisited,
		OnStack,
		Finished,
	}
	let n = successors.len();
	let mut marks = vec![Mark::Unvisited; n];
	let mut order = Vec::with_capacity(n);
	let mut cyclic = false;
	for root in 0..n {
		if marks[root] != Mark::Unvisited {
			continue;
		}
		// (state, index of the next successor to explore)
		let mut stack = vec![(root, 0usize)];
		marks[root] = Mark::OnStack;
		while let Some((state, next)) = stack.last_mut() {
			let state = *state;
			if let Some(&successor) = successors[state].get(*next) {
				*next += 1;
				match marks[successor] {
					Mark::Unvisited => {
						marks[successor] = Mark::OnStack;
						stack.push((successor, 0));
					}
					Mark::OnStack => cyclic = true,
					Mark::Finished => {}
				}
			} else {
				marks[state] = Mark::Finished;
				order.push(state);
				stack.pop();
			}
		}
	}
	(order, cyclic)
}
