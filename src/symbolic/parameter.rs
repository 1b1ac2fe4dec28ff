use std::collections::BTreeMap;
use std::fmt;

/// A symbolic model parameter, identified by its name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Parameter(String);

impl Parameter {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn name(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Parameter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for Parameter {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

/// A concrete point in parameter space
pub type Valuation = BTreeMap<Parameter, f64>;
