use std::fmt;

use crate::symbolic::parse::ExpressionParseError;

/// Errors raised while setting up or running an order/monotonicity analysis.
/// Analytical inconclusiveness is never reported through this type; it is a
/// regular result (`Unknown`, an unresolved pair, ...).
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisError {
	/// A weight expression could not be read
	ExpressionParse(ExpressionParseError),
	/// A region string could not be read (the offending fragment)
	RegionParse(String),
	/// A parameter occurring in the model has no bounds in the region
	MissingParameter(String),
	/// An input vector does not have one entry per state
	StateCountMismatch {
		what: String,
		expected: usize,
		found: usize,
	},
	/// The model is malformed (description)
	InvalidModel(String),
	/// A value could not be handed to the SMT solver
	Smt(String),
}

impl fmt::Display for AnalysisError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ExpressionParse(err) => write!(f, "{}", err),
			Self::RegionParse(fragment) => {
				write!(f, "Unable to read region fragment `{}`.", fragment)
			}
			Self::MissingParameter(name) => {
				write!(f, "Parameter `{}` occurs in the model but not in the region.", name)
			}
			Self::StateCountMismatch {
				what,
				expected,
				found,
			} => write!(
				f,
				"Expected {} entries for {} (one per state), got {}.",
				expected, what, found
			),
			Self::InvalidModel(desc) => write!(f, "Invalid model: {}", desc),
			Self::Smt(desc) => write!(f, "SMT encoding failed: {}", desc),
		}
	}
}

impl std::error::Error for AnalysisError {}

impl From<ExpressionParseError> for AnalysisError {
	fn from(err: ExpressionParseError) -> Self {
		Self::ExpressionParse(err)
	}
}
