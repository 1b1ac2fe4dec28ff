use colored::{ColoredString, Colorize};
use metaverify::*;

use crate::model::model::ParametricDtmc;
use crate::model::region::ParameterRegion;
use crate::symbolic::rational_function::RationalFunction;

/// Row sums further than this from one fail the graph preservation check
const ROW_SUM_TOLERANCE: f64 = 1e-9;

#[trusted]
fn check_row_distributions(model: &ParametricDtmc) -> Vec<String> {
	let mut errors = Vec::new();
	for (state, row) in model.matrix().rows().enumerate() {
		if row.is_empty() {
			errors.push(format!("State {} has no outgoing transitions", state));
			continue;
		}
		if let Some(entry) = row.iter().find(|entry| entry.column() >= model.state_count()) {
			errors.push(format!(
				"State {} has a transition to unknown state {}",
				state,
				entry.column()
			));
		}
		let sum = row
			.iter()
			.fold(RationalFunction::zero(), |acc, entry| &acc + entry.value());
		if !sum.is_one() {
			errors.push(format!("Outgoing probabilities of state {} sum to {}", state, sum));
		}
	}
	errors
}

#[trusted]
fn check_region_covers_parameters(model: &ParametricDtmc, region: &ParameterRegion) -> Vec<String> {
	model
		.parameters()
		.iter()
		.filter(|parameter| !region.contains_parameter(parameter))
		.map(|parameter| format!("Parameter {} has no bounds in the region", parameter))
		.collect()
}

#[trusted]
fn check_region_bounds(region: &ParameterRegion) -> Vec<String> {
	region
		.parameters()
		.filter_map(|parameter| {
			let (lower, upper) = region.bounds(parameter)?;
			(lower > upper).then(|| format!("Bounds of {} are reversed: {} > {}", parameter, lower, upper))
		})
		.collect()
}

/// Every transition must stay a probability in `(0, 1]` at the centre of the
/// region, so instantiating there keeps the graph of the model.
#[trusted]
fn check_graph_preservation(model: &ParametricDtmc, region: &ParameterRegion) -> Vec<String> {
	let mut errors = Vec::new();
	let center = region.center();
	for (state, row) in model.matrix().rows().enumerate() {
		let mut sum = 0.0;
		for entry in row {
			let value = entry.value().evaluate(&center);
			if !(value > 0.0 && value <= 1.0) {
				errors.push(format!(
					"Transition {} -> {} evaluates to {} at the region centre",
					state,
					entry.column(),
					value
				));
			}
			sum += value;
		}
		if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
			errors.push(format!("Row of state {} sums to {} at the region centre", state, sum));
		}
	}
	errors
}

#[trusted]
pub fn write_outcome(test_name: &str, errors: Vec<String>) -> String {
	let fail = "FAIL".red();
	let pass = "PASS".green();
	fn explain(text: String) -> ColoredString {
		text.purple()
	}
	let mut result = String::new();
	if errors.is_empty() {
		result.push_str(&format!("[{}]\t{}\n", pass, test_name));
	} else {
		result.push_str(&format!("[{}]\t{}\n", fail, test_name));
		for error in errors {
			result.push_str(&format!("\t{}\n", explain(error)));
		}
	}
	result
}

/// Sanity report for a model and the region it is analysed on. `Err` carries
/// the report if any check failed.
#[trusted]
pub fn validate_dtmc(model: &ParametricDtmc, region: &ParameterRegion) -> Result<String, String> {
	let mut result = String::new();

	result.push_str("===============================================\n");
	result.push_str("         Parametric DTMC Validation            \n");
	result.push_str("===============================================\n");

	let checks = [
		("Check Row Distributions", check_row_distributions(model)),
		("Check Region Covers Parameters", check_region_covers_parameters(model, region)),
		("Check Region Bounds", check_region_bounds(region)),
		("Check Graph Preservation At Centre", check_graph_preservation(model, region)),
	];
	let failed = checks.iter().any(|(_, errors)| !errors.is_empty());
	for (name, errors) in checks {
		result.push_str(&write_outcome(name, errors));
	}

	if failed {
		Err(result)
	} else {
		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::model::DtmcBuilder;

	#[test]
	fn well_formed_models_pass() {
		let mut builder = DtmcBuilder::with_states(3);
		builder
			.transition(0, 1, "p/(p+q)")
			.unwrap()
			.transition(0, 2, "q/(p+q)")
			.unwrap();
		let dtmc = builder.build().unwrap();
		let region: ParameterRegion = "0.1<=p<=0.9,0.1<=q<=0.9".parse().unwrap();
		assert!(validate_dtmc(&dtmc, &region).is_ok());
	}

	#[test]
	fn broken_rows_and_regions_fail() {
		let mut builder = DtmcBuilder::with_states(3);
		builder
			.transition(0, 1, "p")
			.unwrap()
			.transition(0, 2, "1-2*p")
			.unwrap();
		let dtmc = builder.build().unwrap();
		assert!(!check_row_distributions(&dtmc).is_empty());
		assert_eq!(check_region_covers_parameters(&dtmc, &ParameterRegion::new()).len(), 1);
		let region: ParameterRegion = "0.6<=p<=0.9".parse().unwrap();
		assert!(!check_graph_preservation(&dtmc, &region).is_empty());
		assert!(validate_dtmc(&dtmc, &region).is_err());
	}
}
