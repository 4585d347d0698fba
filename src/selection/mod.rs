//! Deterministic, date-seeded selection
//!
//! Every random decision of a run (which history events to feature, which art
//! style each image gets) is drawn from one stream seeded by the run's date.
//! The same date therefore always produces the same quiz, no matter how often
//! or on which host the generator runs.
//!
//! # Determinism
//!
//! - The seed is the first 8 bytes of the SHA-256 of the ISO date string
//! - The stream is a ChaCha8 generator seeded from that value
//! - Draws are consumed in a fixed order by the pipeline
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use newsquiz::selection::SeedState;
//!
//! let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
//! let pool = vec!["a", "b", "c", "d", "e"];
//!
//! let first = SeedState::for_date(date).sample_without_replacement(&pool, 3);
//! let again = SeedState::for_date(date).sample_without_replacement(&pool, 3);
//! assert_eq!(first, again);
//! ```

pub mod events;

use chrono::NaiveDate;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

pub use events::{EventSelector, RankedEvent, Selection, DRAMATIC_KEYWORDS};

/// Derive the run seed for a calendar date
pub fn derive_seed(date: NaiveDate) -> u64 {
    let digest = Sha256::digest(date.format("%Y-%m-%d").to_string().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Draw `k` distinct elements from `pool` for a seed
///
/// Returns `min(k, pool.len())` elements; the order is a function of the seed
/// and the pool's order only.
pub fn sample_without_replacement<T: Clone>(pool: &[T], k: usize, seed: u64) -> Vec<T> {
    SeedState::from_seed(seed).sample_without_replacement(pool, k)
}

/// The pseudo-random stream owned by one run
#[derive(Debug, Clone)]
pub struct SeedState {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeedState {
    /// Stream for a calendar date
    pub fn for_date(date: NaiveDate) -> Self {
        Self::from_seed(derive_seed(date))
    }

    /// Stream for an explicit seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The seed this stream started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw up to `k` distinct elements, consuming the stream
    pub fn sample_without_replacement<T: Clone>(&mut self, pool: &[T], k: usize) -> Vec<T> {
        let amount = k.min(pool.len());
        rand::seq::index::sample(&mut self.rng, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect()
    }

    /// Draw one element, consuming the stream
    ///
    /// Returns `None` for an empty slice without consuming anything.
    pub fn choice<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        options.choose(&mut self.rng)
    }
}
