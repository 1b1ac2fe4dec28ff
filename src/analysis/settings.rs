/// Use assumptions to resolve stalled pairs unless told otherwise
pub const DEFAULT_USE_ASSUMPTIONS: bool = true;
/// Samples computed by the assumption checker (the first is the region centre)
pub const DEFAULT_NUMBER_OF_SAMPLES: usize = 10;
pub const DEFAULT_SAMPLE_SEED: u64 = 0x5eed;

/// Tunables of an [`OrderExtender`](super::order_extender::OrderExtender).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtenderSettings {
	pub use_assumptions: bool,
	pub number_of_samples: usize,
	pub sample_seed: u64,
}

impl Default for ExtenderSettings {
	fn default() -> Self {
		Self {
			use_assumptions: DEFAULT_USE_ASSUMPTIONS,
			number_of_samples: DEFAULT_NUMBER_OF_SAMPLES,
			sample_seed: DEFAULT_SAMPLE_SEED,
		}
	}
}

impl ExtenderSettings {
	pub fn without_assumptions() -> Self {
		Self {
			use_assumptions: false,
			..Self::default()
		}
	}
}
