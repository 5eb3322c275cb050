use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::text_provider::SeededTextProvider;

// Separate streams so swapping the text provider leaves numeric fields stable.
const TEXT_STREAM_SALT: u64 = 0x5EED_7E47;

/// Everything a generator run depends on; two runs with equal contexts
/// produce identical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorContext {
    pub seed: u64,
    /// Calendar date of the run: anchors birth-date ages and storage keys.
    pub run_date: NaiveDate,
}

impl GeneratorContext {
    pub fn new(seed: u64, run_date: NaiveDate) -> Self {
        Self { seed, run_date }
    }

    pub fn record_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    pub fn text_provider(&self) -> SeededTextProvider {
        SeededTextProvider::new(self.seed ^ TEXT_STREAM_SALT)
    }
}
