pub mod logging;

pub mod analysis;
pub mod demos;
pub mod error;
pub mod graph;
pub mod model;
pub mod property;
pub mod symbolic;
pub mod validator;
