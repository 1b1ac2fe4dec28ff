pub mod assumption;
pub mod assumption_checker;
pub mod assumption_maker;
pub mod local_monotonicity_result;
pub mod monotonicity;
pub mod monotonicity_checker;
pub mod order;
pub mod order_extender;
pub mod settings;
