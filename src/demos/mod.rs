pub mod models;
pub mod monotonicity_demo;
