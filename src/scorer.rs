//! Choosing one reply out of several candidates.

use crate::chain::{Token, TokenSet};
use crate::error::{ChainError, Result};
use crate::vocab::NounVocabulary;
use log::debug;

pub const DEFAULT_IDEAL_RATIO: f64 = 0.8;
pub const DEFAULT_NOUN_OFFSET: f64 = 0.1;

/// Scores a candidate by how far its share of on-topic nouns sits from an
/// ideal ratio. Lower is better.
#[derive(Clone, Copy, Debug)]
pub struct ResponseScorer {
    pub ideal_ratio: f64,
    pub noun_offset: f64,
}

impl Default for ResponseScorer {
    fn default() -> Self {
        Self {
            ideal_ratio: DEFAULT_IDEAL_RATIO,
            noun_offset: DEFAULT_NOUN_OFFSET,
        }
    }
}

impl ResponseScorer {
    pub fn new(ideal_ratio: f64, noun_offset: f64) -> Self {
        Self {
            ideal_ratio,
            noun_offset,
        }
    }

    pub fn score(&self, candidate: &[Token], priority: &TokenSet, nouns: &NounVocabulary) -> f64 {
        let nouns_in: TokenSet = candidate
            .iter()
            .filter(|t| nouns.contains(t))
            .cloned()
            .collect();
        let overlap = nouns_in.iter().filter(|t| priority.contains(*t)).count();
        let ratio = overlap as f64 / (nouns_in.len() as f64 + self.noun_offset);
        (ratio - self.ideal_ratio).abs()
    }

    /// Lowest-scoring candidate; the first one wins a tie. Scores are compared
    /// with `total_cmp`, so a NaN never displaces an earlier candidate.
    pub fn pick_best<'a>(
        &self,
        candidates: &'a [Vec<Token>],
        priority: &TokenSet,
        nouns: &NounVocabulary,
    ) -> Result<&'a [Token]> {
        let mut best: Option<(&'a [Token], f64)> = None;
        for candidate in candidates {
            let score = self.score(candidate, priority, nouns);
            debug!("{:.4} : {}", score, candidate.join(" "));
            match best {
                Some((_, best_score)) if !score.total_cmp(&best_score).is_lt() => {}
                _ => best = Some((candidate.as_slice(), score)),
            }
        }
        best.map(|(candidate, _)| candidate)
            .ok_or(ChainError::NoCandidates)
    }
}
