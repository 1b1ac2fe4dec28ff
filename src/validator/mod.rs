pub mod dtmc_validator;
