use crate::analysis::local_monotonicity_result::LocalMonotonicityResult;
use crate::analysis::order_extender::OrderExtender;
use crate::analysis::settings::ExtenderSettings;
use crate::demos::models::built_in_model;
use crate::error::error::AnalysisError;
use crate::logging::messages::*;
use crate::model::region::ParameterRegion;
use crate::validator::dtmc_validator::validate_dtmc;

fn region_for(text: Option<&str>, default_region: &str) -> Result<ParameterRegion, AnalysisError> {
	text.unwrap_or(default_region).parse()
}

/// Builds the order of a built-in model and reports local and global
/// monotonicity.
pub fn monotonicity_demo(
	model_name: &str,
	region: Option<&str>,
	settings: ExtenderSettings,
	dot: bool,
) -> Result<(), AnalysisError> {
	let case = built_in_model(model_name)?;
	let region = region_for(region, case.default_region)?;
	message!(
		"Analysing `{}` ({} states) for {} on {}",
		model_name,
		case.model.state_count(),
		case.property,
		region
	);

	let mut extender = OrderExtender::new(&case.model, &case.property, &region, settings)?;
	let mut mon_res = LocalMonotonicityResult::new(case.model.state_count(), extender.parameters().clone());
	let result = extender.to_order(Some(&mut mon_res));

	message!("Order:\n{}", result.order);
	message!("{}", mon_res);
	match result.unresolved {
		None => message!("Every state was placed."),
		Some((a, b)) => {
			warning!("States {} and {} could not be ordered, splitting the region.", a, b);
			for part in region.split_at_center() {
				let mut part_extender = OrderExtender::new(&case.model, &case.property, &part, settings)?;
				let mut part_res = mon_res.copy();
				let part_result = part_extender.to_order(Some(&mut part_res));
				match part_result.unresolved {
					None => message!("On {} every state was placed. {}", part, part_res.global_monotonicity_result()),
					Some((a, b)) => warning!("On {} states {} and {} stay unordered.", part, a, b),
				}
			}
		}
	}
	let (monotone, other) = mon_res
		.global_monotonicity_result()
		.split_variables(extender.parameters());
	message!("Monotone parameters: {:?}, others: {:?}", monotone, other);
	if dot {
		println!("{}", result.order.to_dot());
	}
	Ok(())
}

/// Prints the validator report of a built-in model.
pub fn validation_demo(model_name: &str, region: Option<&str>) -> Result<bool, AnalysisError> {
	let case = built_in_model(model_name)?;
	let region = region_for(region, case.default_region)?;
	Ok(match validate_dtmc(&case.model, &region) {
		Ok(report) => {
			println!("{}", report);
			true
		}
		Err(report) => {
			println!("{}", report);
			false
		}
	})
}
