use inherent::inherent;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;

/// Number of distinct alias codes (`0000` through `9999`).
const ALIAS_CODE_SPACE: u16 = 10_000;

/// Source of the 4-digit codes that namespace merged entries.
///
/// Codes are not checked for collisions: two entries of the same batch that
/// draw the same code will produce a corrupt merged document.
pub trait AliasGenerator: Send {
    /// Returns a code in `0..10_000`.
    fn next_code(&mut self) -> u16;
}

/// Draws alias codes uniformly at random.
#[derive(Debug)]
pub struct RandomAliasGenerator {
    rng: StdRng,
}
impl RandomAliasGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A generator with a reproducible sequence of codes.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}
impl Default for RandomAliasGenerator {
    fn default() -> Self {
        Self::new()
    }
}
#[inherent]
impl AliasGenerator for RandomAliasGenerator {
    pub fn next_code(&mut self) -> u16 {
        self.rng.gen_range(0..ALIAS_CODE_SPACE)
    }
}

/// Replays a fixed list of codes, cycling back to the start once exhausted.
#[derive(Clone, Debug)]
pub struct SequenceAliasGenerator {
    codes: VecDeque<u16>,
}
impl SequenceAliasGenerator {
    /// A generator replaying `codes` in order. Codes of `10_000` and above
    /// wrap around.
    ///
    /// # Panics
    ///
    /// Panics if `codes` is empty.
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        let codes: VecDeque<u16> = codes.into_iter().collect();
        assert!(!codes.is_empty(), "SequenceAliasGenerator needs at least one code");
        Self { codes }
    }
}
#[inherent]
impl AliasGenerator for SequenceAliasGenerator {
    pub fn next_code(&mut self) -> u16 {
        let code = self.codes.pop_front().unwrap_or_default();
        self.codes.push_back(code);
        code % ALIAS_CODE_SPACE
    }
}

/// The alias for a merged entry: `merge` followed by the zero-padded code.
pub(crate) fn format_alias(code: u16) -> String {
    format!("merge{:04}", code % ALIAS_CODE_SPACE)
}
