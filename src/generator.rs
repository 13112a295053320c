//! Building candidate replies: seed a context from the priority tokens, then
//! walk the reverse chain for what comes before it and the forward chain for
//! what comes after.

use crate::chain::{ChainModel, ContextKey, Successor, Token, TokenSet};
use crate::error::{ChainError, Result};
use crate::pair::ChainPair;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Longest extension a single walk may produce before it is cut off.
pub const DEFAULT_MAX_WALK_STEPS: usize = 300;
pub const DEFAULT_CANDIDATE_ATTEMPTS: usize = 14;

/// Walk `model` from `start`, collecting tokens until the chain ends, hits a
/// context it has never seen, or `max_steps` tokens have been produced.
pub fn emit_forward<R: Rng>(
    model: &ChainModel,
    start: &ContextKey,
    max_steps: usize,
    rng: &mut R,
) -> Vec<Token> {
    let mut out = Vec::new();
    let mut key = start.clone();

    loop {
        if out.len() >= max_steps {
            debug!("Walk from ({}, {}) cut off after {} tokens", start.0, start.1, max_steps);
            break;
        }
        match model.sample(&key, rng) {
            Ok(Successor::Token(next)) => {
                out.push(next.clone());
                key = key.shift(next.clone());
            }
            Ok(Successor::End) => break,
            // Unknown context or empty distribution: a dead end.
            Err(_) => break,
        }
    }
    out
}

/// Borrows a [`ChainPair`] for the length of one generation batch.
pub struct ResponseGenerator<'a> {
    pair: &'a ChainPair,
    max_steps: usize,
}

impl<'a> ResponseGenerator<'a> {
    pub fn new(pair: &'a ChainPair) -> Self {
        Self {
            pair,
            max_steps: DEFAULT_MAX_WALK_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// A forward context whose first token is a priority token, chosen uniformly.
    pub fn seed<R: Rng>(&self, priority: &TokenSet, rng: &mut R) -> Result<ContextKey> {
        let keys = self.pair.forward.keys_starting_with(priority);
        keys.choose(rng)
            .map(|key| (*key).clone())
            .ok_or(ChainError::NoSeedFound)
    }

    /// `[backward extension] + [a, b] + [forward extension]` around one seed `(a, b)`.
    pub fn generate_candidate<R: Rng>(&self, priority: &TokenSet, rng: &mut R) -> Result<Vec<Token>> {
        let seed = self.seed(priority, rng)?;

        let mut candidate = emit_forward(&self.pair.reverse, &seed.reversed(), self.max_steps, rng);
        candidate.reverse();
        candidate.push(seed.0.clone());
        candidate.push(seed.1.clone());
        candidate.extend(emit_forward(&self.pair.forward, &seed, self.max_steps, rng));
        Ok(candidate)
    }

    /// Up to `attempts` candidates; failed attempts are dropped.
    pub fn generate_candidates<R: Rng>(
        &self,
        priority: &TokenSet,
        attempts: usize,
        rng: &mut R,
    ) -> Vec<Vec<Token>> {
        let mut candidates = Vec::with_capacity(attempts);
        for _ in 0..attempts {
            match self.generate_candidate(priority, rng) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => debug!("Can't respond: {}", e),
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn toks(line: &str) -> Vec<Token> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn set(words: &[&str]) -> TokenSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_emit_on_unknown_key_is_empty() {
        let model = ChainModel::new();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(emit_forward(&model, &ContextKey::new("a", "b"), 50, &mut rng).is_empty());
    }

    #[test]
    fn test_emit_single_line() {
        let mut model = ChainModel::new();
        model.learn(&toks("a b c"));
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(emit_forward(&model, &ContextKey::new("a", "b"), 50, &mut rng), toks("c"));
    }

    #[test]
    fn test_emit_stops_at_cap_on_cycle() {
        let mut model = ChainModel::new();
        model.insert_weight(ContextKey::new("a", "b"), Successor::Token("a".to_string()), 1);
        model.insert_weight(ContextKey::new("b", "a"), Successor::Token("b".to_string()), 1);
        let mut rng = StdRng::seed_from_u64(3);

        let out = emit_forward(&model, &ContextKey::new("a", "b"), 25, &mut rng);
        assert_eq!(out.len(), 25);
        assert_eq!(&out[..4], toks("a b a b").as_slice());
    }

    #[test]
    fn test_seed_respects_priority() {
        let mut pair = ChainPair::new();
        pair.learn(&toks("the dog runs home"));
        pair.learn(&toks("a cat sleeps"));
        pair.learn(&toks("my dog barks"));
        let generator = ResponseGenerator::new(&pair);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..50 {
            let key = generator.seed(&set(&["dog"]), &mut rng).unwrap();
            assert_eq!(key.first(), "dog");
            assert!(pair.forward.has(&key));
        }
    }

    #[test]
    fn test_seed_without_match() {
        let mut pair = ChainPair::new();
        pair.learn(&toks("the dog runs home"));
        let generator = ResponseGenerator::new(&pair);
        let mut rng = StdRng::seed_from_u64(11);

        let err = generator.seed(&set(&["zebra"]), &mut rng).unwrap_err();
        assert!(matches!(err, ChainError::NoSeedFound));
    }

    #[test]
    fn test_candidate_extends_both_ways() {
        let mut pair = ChainPair::new();
        pair.learn(&toks("the dog runs home"));
        let generator = ResponseGenerator::new(&pair);
        let mut rng = StdRng::seed_from_u64(5);

        let candidate = generator.generate_candidate(&set(&["dog"]), &mut rng).unwrap();
        assert_eq!(candidate, toks("the dog runs home"));
    }

    #[test]
    fn test_candidate_from_sentence_start() {
        let mut pair = ChainPair::new();
        pair.learn(&toks("the dog runs home"));
        let generator = ResponseGenerator::new(&pair);
        let mut rng = StdRng::seed_from_u64(5);

        // Seeding on the first token leaves nothing to extend backwards.
        let candidate = generator.generate_candidate(&set(&["the"]), &mut rng).unwrap();
        assert_eq!(candidate, toks("the dog runs home"));
    }

    #[test]
    fn test_generate_candidates_counts() {
        let mut pair = ChainPair::new();
        pair.learn(&toks("the dog runs home"));
        let generator = ResponseGenerator::new(&pair);
        let mut rng = StdRng::seed_from_u64(9);

        let found = generator.generate_candidates(&set(&["dog"]), DEFAULT_CANDIDATE_ATTEMPTS, &mut rng);
        assert_eq!(found.len(), DEFAULT_CANDIDATE_ATTEMPTS);
        assert!(found.iter().all(|c| c == &toks("the dog runs home")));

        let none = generator.generate_candidates(&set(&["zebra"]), DEFAULT_CANDIDATE_ATTEMPTS, &mut rng);
        assert!(none.is_empty());
    }
}
