//! Core environment context trait for LidarScope.

use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// The central interface for clock and entropy.
///
/// This trait abstracts the "real world" so that the viewer can run both
/// interactively (wall clock, OS entropy) and inside the deterministic
/// simulation harness (virtual clock, seeded RNG).
///
/// # Determinism
///
/// Every source of non-determinism the viewer consumes goes through this
/// trait. Two contexts with the same seed must hand out identical RNG
/// streams for the same `stream` id.
pub trait ScopeContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    ///
    /// Animation timelines are evaluated against this value.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns a fresh RNG for the given stream id.
    ///
    /// In production the stream id is ignored and the generator is seeded
    /// from OS entropy. In simulation it is combined with the master seed.
    ///
    /// # Arguments
    /// * `stream` - Distinguishes independent consumers of randomness
    fn rng(&self, stream: u64) -> ChaCha8Rng;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
