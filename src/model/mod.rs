pub mod instantiation;
pub mod model;
pub mod region;
