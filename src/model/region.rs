use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use num::{BigRational, Signed, ToPrimitive};
use rand::Rng;

use crate::error::error::AnalysisError;
use crate::symbolic::parameter::{Parameter, Valuation};
use crate::symbolic::parse::read_decimal;

/// Regions with more parameters than this are not enumerated vertex by vertex
const MAX_VERTEX_PARAMETERS: usize = 10;

/// A hyper-rectangle of parameter valuations: a closed interval per parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterRegion {
	bounds: BTreeMap<Parameter, (BigRational, BigRational)>,
}

impl ParameterRegion {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds (or replaces) the bounds of `parameter`. Fails if `lower > upper`.
	pub fn add_bound(
		&mut self,
		parameter: Parameter,
		lower: BigRational,
		upper: BigRational,
	) -> Result<(), AnalysisError> {
		if lower > upper {
			return Err(AnalysisError::RegionParse(format!(
				"{}<={}<={}",
				lower, parameter, upper
			)));
		}
		self.bounds.insert(parameter, (lower, upper));
		Ok(())
	}

	pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
		self.bounds.keys()
	}

	pub fn contains_parameter(&self, parameter: &Parameter) -> bool {
		self.bounds.contains_key(parameter)
	}

	pub fn bounds(&self, parameter: &Parameter) -> Option<&(BigRational, BigRational)> {
		self.bounds.get(parameter)
	}

	pub fn lower(&self, parameter: &Parameter) -> Option<&BigRational> {
		self.bounds.get(parameter).map(|(lower, _)| lower)
	}

	pub fn upper(&self, parameter: &Parameter) -> Option<&BigRational> {
		self.bounds.get(parameter).map(|(_, upper)| upper)
	}

	pub fn has_nonnegative_lower_bounds(&self) -> bool {
		self.bounds.values().all(|(lower, _)| !lower.is_negative())
	}

	pub fn center(&self) -> Valuation {
		self.bounds
			.iter()
			.map(|(parameter, (lower, upper))| {
				let mid = (lower + upper) / BigRational::from_integer(2.into());
				(parameter.clone(), mid.to_f64().unwrap_or(f64::NAN))
			})
			.collect()
	}

	/// All corners of the region. Empty when the region has too many parameters
	/// to enumerate.
	pub fn vertices(&self) -> Vec<Valuation> {
		if self.bounds.len() > MAX_VERTEX_PARAMETERS {
			return Vec::new();
		}
		let mut vertices = vec![Valuation::new()];
		for (parameter, (lower, upper)) in self.bounds.iter() {
			let lower = lower.to_f64().unwrap_or(f64::NAN);
			let upper = upper.to_f64().unwrap_or(f64::NAN);
			vertices = vertices
				.into_iter()
				.flat_map(|vertex| {
					let mut low = vertex.clone();
					low.insert(parameter.clone(), lower);
					let mut high = vertex;
					high.insert(parameter.clone(), upper);
					[low, high]
				})
				.collect();
		}
		vertices
	}

	/// A uniformly drawn valuation
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Valuation {
		self.bounds
			.iter()
			.map(|(parameter, (lower, upper))| {
				let lower = lower.to_f64().unwrap_or(0.0);
				let upper = upper.to_f64().unwrap_or(lower).max(lower);
				(parameter.clone(), rng.random_range(lower..=upper))
			})
			.collect()
	}

	/// Splits the region at its centre into `2^n` subregions
	pub fn split_at_center(&self) -> Vec<ParameterRegion> {
		let mut regions = vec![ParameterRegion::new()];
		for (parameter, (lower, upper)) in self.bounds.iter() {
			let mid = (lower + upper) / BigRational::from_integer(2.into());
			regions = regions
				.into_iter()
				.flat_map(|region| {
					let mut low = region.clone();
					low.bounds
						.insert(parameter.clone(), (lower.clone(), mid.clone()));
					let mut high = region;
					high.bounds
						.insert(parameter.clone(), (mid.clone(), upper.clone()));
					[low, high]
				})
				.collect();
		}
		regions
	}
}

impl FromStr for ParameterRegion {
	type Err = AnalysisError;

	/// Reads regions written as `0.1<=p<=0.9,0.2<=q<=0.8`
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut region = ParameterRegion::new();
		for fragment in s.split([',', ';']).map(str::trim).filter(|f| !f.is_empty()) {
			let parts = fragment.split("<=").map(str::trim).collect::<Vec<_>>();
			let [lower, name, upper] = parts[..] else {
				return Err(AnalysisError::RegionParse(fragment.to_string()));
			};
			let lower = read_decimal(lower).ok_or_else(|| AnalysisError::RegionParse(fragment.to_string()))?;
			let upper = read_decimal(upper).ok_or_else(|| AnalysisError::RegionParse(fragment.to_string()))?;
			if name.is_empty() {
				return Err(AnalysisError::RegionParse(fragment.to_string()));
			}
			region.add_bound(Parameter::new(name), lower, upper)?;
		}
		Ok(region)
	}
}

impl fmt::Display for ParameterRegion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let fragments = self
			.bounds
			.iter()
			.map(|(parameter, (lower, upper))| format!("{}<={}<={}", lower, parameter, upper))
			.collect::<Vec<_>>();
		write!(f, "{}", fragments.join(","))
	}
}
