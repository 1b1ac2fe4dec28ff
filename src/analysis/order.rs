use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

/// Index of a node (an equivalence class of states) inside an [`Order`]
pub type NodeId = usize;

/// Position of a first state/node relative to a second one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeComparison {
	Unknown,
	Below,
	Above,
	Same,
}

/// Why a list of states could not be ranked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortConflict {
	/// The state is not in the order yet
	Unplaced(usize),
	/// The two states are both placed but incomparable
	Incomparable(usize, usize),
}

#[derive(Clone, Debug, Default)]
struct Node {
	states: BTreeSet<usize>,
	/// Every node strictly above this one (transitively closed)
	above: BTreeSet<NodeId>,
	/// Every node strictly below this one (transitively closed)
	below: BTreeSet<NodeId>,
}

/// A partial order over states, ranking them by their probability of
/// reaching the target. The top node holds the states reaching it with
/// probability one, the bottom node those with probability zero; every other
/// node lies strictly between them.
#[derive(Clone, Debug)]
pub struct Order {
	nodes: Vec<Option<Node>>,
	state_node: Vec<Option<NodeId>>,
	top: NodeId,
	bottom: NodeId,
	done_building: bool,
}

impl Order {
	pub fn new(top_states: &BTreeSet<usize>, bottom_states: &BTreeSet<usize>, number_of_states: usize) -> Self {
		let mut order = Self {
			nodes: Vec::new(),
			state_node: vec![None; number_of_states],
			top: 0,
			bottom: 1,
			done_building: false,
		};
		order.nodes.push(Some(Node {
			below: BTreeSet::from([1]),
			..Node::default()
		}));
		order.nodes.push(Some(Node {
			above: BTreeSet::from([0]),
			..Node::default()
		}));
		for &state in top_states {
			order.add_to_node(state, order.top);
		}
		for &state in bottom_states {
			order.add_to_node(state, order.bottom);
		}
		order
	}

	pub fn number_of_states(&self) -> usize {
		self.state_node.len()
	}

	pub fn number_of_added_states(&self) -> usize {
		self.state_node.iter().filter(|node| node.is_some()).count()
	}

	/// Whether every state has been placed
	pub fn is_complete(&self) -> bool {
		self.state_node.iter().all(Option::is_some)
	}

	pub fn top(&self) -> NodeId {
		self.top
	}

	pub fn bottom(&self) -> NodeId {
		self.bottom
	}

	pub fn is_top_state(&self, state: usize) -> bool {
		self.get_node(state) == Some(self.top)
	}

	pub fn is_bottom_state(&self, state: usize) -> bool {
		self.get_node(state) == Some(self.bottom)
	}

	pub fn contains(&self, state: usize) -> bool {
		self.get_node(state).is_some()
	}

	pub fn get_node(&self, state: usize) -> Option<NodeId> {
		self.state_node.get(state).copied().flatten()
	}

	pub fn states_of(&self, node: NodeId) -> &BTreeSet<usize> {
		&self.node(node).states
	}

	pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.nodes
			.iter()
			.enumerate()
			.filter_map(|(id, node)| node.as_ref().map(|_| id))
	}

	pub fn done_building(&self) -> bool {
		self.done_building
	}

	pub fn set_done_building(&mut self, done: bool) {
		self.done_building = done;
	}

	fn node(&self, id: NodeId) -> &Node {
		self.nodes[id]
			.as_ref()
			.unwrap_or_else(|| panic!("Node {} was merged away", id))
	}

	fn node_mut(&mut self, id: NodeId) -> &mut Node {
		self.nodes[id]
			.as_mut()
			.unwrap_or_else(|| panic!("Node {} was merged away", id))
	}

	/// How `state1` relates to `state2`; `Unknown` if either is unplaced
	pub fn compare(&self, state1: usize, state2: usize) -> NodeComparison {
		match (self.get_node(state1), self.get_node(state2)) {
			(Some(node1), Some(node2)) => self.compare_nodes(node1, node2),
			_ => NodeComparison::Unknown,
		}
	}

	pub fn compare_nodes(&self, node1: NodeId, node2: NodeId) -> NodeComparison {
		if node1 == node2 {
			NodeComparison::Same
		} else if self.node(node1).above.contains(&node2) {
			NodeComparison::Below
		} else if self.node(node1).below.contains(&node2) {
			NodeComparison::Above
		} else {
			NodeComparison::Unknown
		}
	}

	/// Places `state` strictly between top and bottom.
	pub fn add(&mut self, state: usize) -> NodeId {
		self.add_between(state, self.top, self.bottom)
	}

	/// Places `state` in a new node strictly below `above` and strictly above
	/// `below`. Panics if the state is already placed or `above` is not above
	/// `below`.
	pub fn add_between(&mut self, state: usize, above: NodeId, below: NodeId) -> NodeId {
		assert!(!self.contains(state), "State {} is already in the order", state);
		assert_eq!(
			self.compare_nodes(above, below),
			NodeComparison::Above,
			"Cannot insert state {} between unordered nodes {} and {}",
			state,
			above,
			below
		);
		let id = self.nodes.len();
		self.nodes.push(Some(Node {
			states: BTreeSet::from([state]),
			..Node::default()
		}));
		self.state_node[state] = Some(id);
		self.add_relation_nodes(above, id);
		self.add_relation_nodes(id, below);
		id
	}

	/// Places `state` into an existing node
	pub fn add_to_node(&mut self, state: usize, node: NodeId) {
		assert!(!self.contains(state), "State {} is already in the order", state);
		self.node_mut(node).states.insert(state);
		self.state_node[state] = Some(node);
	}

	/// Records that `above_state` ranks strictly above `below_state`
	pub fn add_relation(&mut self, above_state: usize, below_state: usize) {
		let above = self
			.get_node(above_state)
			.unwrap_or_else(|| panic!("State {} is not in the order", above_state));
		let below = self
			.get_node(below_state)
			.unwrap_or_else(|| panic!("State {} is not in the order", below_state));
		self.add_relation_nodes(above, below);
	}

	/// Records that node `above` ranks strictly above node `below`, closing
	/// the relation transitively. Panics on a contradiction.
	pub fn add_relation_nodes(&mut self, above: NodeId, below: NodeId) {
		match self.compare_nodes(above, below) {
			NodeComparison::Above => return,
			NodeComparison::Unknown => {}
			comparison => panic!(
				"Adding {} above {} contradicts the order ({:?})",
				above, below, comparison
			),
		}
		let mut ups = self.node(above).above.clone();
		ups.insert(above);
		let mut downs = self.node(below).below.clone();
		downs.insert(below);
		for &up in &ups {
			self.node_mut(up).below.extend(downs.iter().copied());
		}
		for &down in &downs {
			self.node_mut(down).above.extend(ups.iter().copied());
		}
	}

	/// Merges `remove` into `keep`. Panics if the nodes are ordered or the
	/// merge would close a cycle.
	pub fn merge_nodes(&mut self, keep: NodeId, remove: NodeId) {
		if keep == remove {
			return;
		}
		assert_eq!(
			self.compare_nodes(keep, remove),
			NodeComparison::Unknown,
			"Cannot merge ordered nodes {} and {}",
			keep,
			remove
		);
		let removed = self.nodes[remove]
			.take()
			.unwrap_or_else(|| panic!("Node {} was merged away", remove));
		let kept = self.node(keep);
		let ups = kept.above.union(&removed.above).copied().collect::<BTreeSet<_>>();
		let downs = kept.below.union(&removed.below).copied().collect::<BTreeSet<_>>();
		assert!(
			ups.is_disjoint(&downs),
			"Merging nodes {} and {} would create a cycle",
			keep,
			remove
		);

		for &up in &ups {
			let node = self.node_mut(up);
			node.below.remove(&remove);
			node.below.insert(keep);
			node.below.extend(downs.iter().copied());
		}
		for &down in &downs {
			let node = self.node_mut(down);
			node.above.remove(&remove);
			node.above.insert(keep);
			node.above.extend(ups.iter().copied());
		}
		for &state in &removed.states {
			self.state_node[state] = Some(keep);
		}
		let node = self.node_mut(keep);
		node.states.extend(removed.states);
		node.above = ups;
		node.below = downs;
		if self.top == remove {
			self.top = keep;
		}
		if self.bottom == remove {
			self.bottom = keep;
		}
	}

	/// Ranks `states` from highest to lowest, or reports the first reason it
	/// cannot.
	pub fn sort_states_checked(&self, states: &[usize]) -> Result<Vec<usize>, SortConflict> {
		let mut sorted: Vec<usize> = Vec::with_capacity(states.len());
		for &state in states {
			if !self.contains(state) {
				return Err(SortConflict::Unplaced(state));
			}
			let mut position = 0;
			for &ranked in &sorted {
				match self.compare(ranked, state) {
					NodeComparison::Above | NodeComparison::Same => position += 1,
					NodeComparison::Below => {}
					NodeComparison::Unknown => return Err(SortConflict::Incomparable(ranked, state)),
				}
			}
			sorted.insert(position, state);
		}
		Ok(sorted)
	}

	/// Ranks `states` from highest to lowest. If that is impossible, the
	/// vector is padded with `number_of_states` after the states that could
	/// be ranked.
	pub fn sort_states(&self, states: &[usize]) -> Vec<usize> {
		match self.sort_states_checked(states) {
			Ok(sorted) => sorted,
			Err(_) => {
				let ranked = states
					.iter()
					.copied()
					.filter(|&state| self.contains(state))
					.collect::<Vec<_>>();
				let mut result = self
					.sort_states_checked(&ranked)
					.unwrap_or_else(|_| Vec::new());
				result.resize(states.len(), self.number_of_states());
				result
			}
		}
	}

	/// The first pair of placed states among `states` whose relation is unknown
	pub fn first_incomparable(&self, states: &[usize]) -> Option<(usize, usize)> {
		states
			.iter()
			.copied()
			.filter(|&state| self.contains(state))
			.tuple_combinations()
			.find(|&(a, b)| self.compare(a, b) == NodeComparison::Unknown)
	}

	/// Edges of the Hasse diagram (covering relation) between live nodes
	fn covering_edges(&self) -> Vec<(NodeId, NodeId)> {
		let mut edges = Vec::new();
		for up in self.nodes() {
			let below = &self.node(up).below;
			for &down in below {
				let covered = below
					.iter()
					.any(|&middle| middle != down && self.node(middle).below.contains(&down));
				if !covered {
					edges.push((up, down));
				}
			}
		}
		edges
	}

	/// Graphviz rendering of the order, highest nodes on top
	pub fn to_dot(&self) -> String {
		let mut dot = String::from("digraph order {\n");
		for id in self.nodes() {
			let states = self.node(id).states.iter().join(", ");
			dot.push_str(&format!("\tn{} [label=\"{{{}}}\"];\n", id, states));
		}
		for (up, down) in self.covering_edges() {
			dot.push_str(&format!("\tn{} -> n{};\n", up, down));
		}
		dot.push_str("}\n");
		dot
	}
}

impl fmt::Display for Order {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut ids = self.nodes().collect::<Vec<_>>();
		ids.sort_by_key(|&id| (self.node(id).above.len(), id));
		for id in ids {
			let node = self.node(id);
			let below = node
				.below
				.iter()
				.map(|&other| format!("{{{}}}", self.node(other).states.iter().join(",")))
				.join(" ");
			writeln!(f, "{{{}}} above: [{}]", node.states.iter().join(","), below)?;
		}
		Ok(())
	}
}
