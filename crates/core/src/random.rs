use rand::SeedableRng;
use rand::rngs::StdRng;

/// Source of randomness for draws and option shuffles.
///
/// `Seeded` makes batches and option orders reproducible in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RngSource {
    #[default]
    Entropy,
    Seeded(u64),
}

impl RngSource {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(seed)
    }

    /// A fresh generator owned by the caller.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self {
            RngSource::Entropy => StdRng::from_os_rng(),
            RngSource::Seeded(seed) => StdRng::seed_from_u64(*seed),
        }
    }
}
