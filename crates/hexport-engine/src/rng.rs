//! Deterministic random number generation.
//!
//! Every random draw the engine makes (board shuffles, dice, steal-card
//! selection) flows through [`GameRng`], a ChaCha8-backed generator that is
//! seeded once at game creation and whose stream position travels with the
//! game state. Replaying the same seed and action sequence reproduces the
//! same game exactly, which is what the tests lean on.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seedable CSPRNG carried inside [`crate::game::GameState`].
///
/// Serializes as `(seed, word_pos)` so a deserialized state continues the
/// exact stream it left off at, regardless of how many draws happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RngState", into = "RngState")]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

/// Flat serialized form of [`GameRng`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub word_pos: u128,
}

impl GameRng {
    /// Create a generator from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Roll a single six-sided die.
    pub fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=6)
    }

    /// Random index into a collection of the given length.
    pub fn index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Pick a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }
}

impl From<RngState> for GameRng {
    fn from(state: RngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

impl From<GameRng> for RngState {
    fn from(rng: GameRng) -> Self {
        Self {
            seed: rng.seed,
            word_pos: rng.inner.get_word_pos(),
        }
    }
}
