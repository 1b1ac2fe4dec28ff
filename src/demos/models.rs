use crate::error::error::AnalysisError;
use crate::model::model::{DtmcBuilder, ParametricDtmc};
use crate::property::property::ReachabilityProperty;

/// Names accepted by [`built_in_model`]
pub const MODEL_NAMES: [&str; 3] = ["coin", "incomparable", "chain"];

/// A model with the property and region it is meant to be analysed with.
pub struct DemoCase {
	pub model: ParametricDtmc,
	pub property: ReachabilityProperty,
	pub default_region: &'static str,
}

/// One biased coin flip: heads (state 1) is the goal, tails (state 2) a sink.
pub fn coin() -> Result<DemoCase, AnalysisError> {
	let mut builder = DtmcBuilder::with_states(3);
	builder
		.transition(0, 1, "p")?
		.transition(0, 2, "1-p")?
		.label("goal", 1)
		.initial_state(0);
	let model = builder.build()?;
	Ok(DemoCase {
		property: ReachabilityProperty::eventually_label(&model, "goal")?,
		model,
		default_region: "0.1<=p<=0.9",
	})
}

/// State 4 picks coin 0 (bias p) or coin 1 (bias q) uniformly. Which coin is
/// better depends on the valuation, so states 0 and 1 cannot be ordered.
pub fn incomparable() -> Result<DemoCase, AnalysisError> {
	let mut builder = DtmcBuilder::with_states(5);
	builder
		.transition(4, 0, "1/2")?
		.transition(4, 1, "1/2")?
		.transition(0, 2, "p")?
		.transition(0, 3, "1-p")?
		.transition(1, 2, "q")?
		.transition(1, 3, "1-q")?
		.label("goal", 2)
		.initial_state(4);
	let model = builder.build()?;
	Ok(DemoCase {
		property: ReachabilityProperty::eventually_label(&model, "goal")?,
		model,
		default_region: "0.1<=p<=0.9,0.1<=q<=0.9",
	})
}

/// A two-step ladder where a failed second step falls back to the first:
/// 0 climbs to 1 with p or drops to the sink 3; 1 reaches the goal 2 with p
/// or slides back to 0.
pub fn chain() -> Result<DemoCase, AnalysisError> {
	let mut builder = DtmcBuilder::with_states(4);
	builder
		.transition(0, 1, "p")?
		.transition(0, 3, "1-p")?
		.transition(1, 2, "p")?
		.transition(1, 0, "1-p")?
		.label("goal", 2)
		.initial_state(0);
	let model = builder.build()?;
	Ok(DemoCase {
		property: ReachabilityProperty::eventually_label(&model, "goal")?,
		model,
		default_region: "0.1<=p<=0.9",
	})
}

pub fn built_in_model(name: &str) -> Result<DemoCase, AnalysisError> {
	match name {
		"coin" => coin(),
		"incomparable" => incomparable(),
		"chain" => chain(),
		other => Err(AnalysisError::InvalidModel(format!(
			"unknown built-in model `{}` (expected one of {})",
			other,
			MODEL_NAMES.join(", ")
		))),
	}
}
