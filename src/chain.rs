//! Second-order Markov chain: a growable table from a two-token context to a
//! weighted distribution over what came next.

use crate::error::{ChainError, Result};
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

pub type Token = String;
pub type TokenSet = FxHashSet<Token>;

const MODEL_MAGIC: [u8; 4] = *b"MKV2";
const MODEL_VERSION: u16 = 1;
const ZSTD_LEVEL: i32 = 10;

/// Two consecutive tokens: the state of the chain.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(pub Token, pub Token);

impl ContextKey {
    pub fn new(first: impl Into<Token>, second: impl Into<Token>) -> Self {
        Self(first.into(), second.into())
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }

    /// The same pair read in the opposite direction, for walking the reverse model.
    pub fn reversed(&self) -> Self {
        Self(self.1.clone(), self.0.clone())
    }

    /// Slide the window one token along: `(a, b)` + `c` becomes `(b, c)`.
    pub fn shift(&self, next: Token) -> Self {
        Self(self.1.clone(), next)
    }
}

/// What may follow a context: another token, or the end of the message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Successor {
    Token(Token),
    End,
}

/// Successor weights for one context, with the running total kept in step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Distribution {
    weights: FxHashMap<Successor, u64>,
    total: u64,
}

impl Distribution {
    fn add(&mut self, successor: Successor, weight: u64) {
        *self.weights.entry(successor).or_insert(0) += weight;
        self.total += weight;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn get(&self, successor: &Successor) -> u64 {
        self.weights.get(successor).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Successor, u64)> {
        self.weights.iter().map(|(s, w)| (s, *w))
    }
}

/// On-disk layout. Entries are sorted so equal models encode to equal bytes.
#[derive(Serialize, Deserialize)]
struct PersistedModel {
    magic: [u8; 4],
    version: u16,
    entries: Vec<(ContextKey, Vec<(Successor, u64)>)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChainModel {
    table: FxHashMap<ContextKey, Distribution>,
}

impl ChainModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every `(t[i], t[i+1]) -> t[i+2]` transition, with the last pair
    /// pointing at [`Successor::End`]. Sequences shorter than two tokens teach
    /// nothing.
    pub fn learn(&mut self, tokens: &[Token]) {
        if tokens.len() < 2 {
            return;
        }

        for i in 0..tokens.len() - 1 {
            let key = ContextKey(tokens[i].clone(), tokens[i + 1].clone());
            let next = match tokens.get(i + 2) {
                Some(token) => Successor::Token(token.clone()),
                None => Successor::End,
            };
            self.table.entry(key).or_default().add(next, 1);
        }
    }

    pub fn has(&self, key: &ContextKey) -> bool {
        self.table.contains_key(key)
    }

    pub fn distribution(&self, key: &ContextKey) -> Option<&Distribution> {
        self.table.get(key)
    }

    /// Weight stored for `successor` after `key`, zero when never seen.
    pub fn weight(&self, key: &ContextKey, successor: &Successor) -> u64 {
        self.table.get(key).map_or(0, |dist| dist.get(successor))
    }

    /// Weighted draw: pick an index in `[0, total)` and scan the entries until
    /// the running weight passes it.
    pub fn sample<R: Rng>(&self, key: &ContextKey, rng: &mut R) -> Result<&Successor> {
        let dist = self
            .table
            .get(key)
            .ok_or_else(|| ChainError::UnknownKey(key.0.clone(), key.1.clone()))?;

        if dist.total == 0 {
            return Err(ChainError::EmptyDistribution(key.0.clone(), key.1.clone()));
        }

        let mut index = rng.gen_range(0..dist.total);
        for (successor, weight) in &dist.weights {
            if *weight > index {
                return Ok(successor);
            }
            index -= weight;
        }

        // Only reachable if total drifted from the stored weights.
        Err(ChainError::EmptyDistribution(key.0.clone(), key.1.clone()))
    }

    /// Every context whose first token is in `tokens`.
    pub fn keys_starting_with(&self, tokens: &TokenSet) -> Vec<&ContextKey> {
        self.table
            .keys()
            .filter(|key| tokens.contains(&key.0))
            .collect()
    }

    /// Fold another model's counts into this one, as if its corpus had been
    /// learned here too.
    pub fn merge(&mut self, other: ChainModel) {
        for (key, dist) in other.table {
            let entry = self.table.entry(key).or_default();
            for (successor, weight) in dist.weights {
                entry.add(successor, weight);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_weight(&mut self, key: ContextKey, successor: Successor, weight: u64) {
        self.table.entry(key).or_default().add(successor, weight);
    }

    pub fn keys(&self) -> impl Iterator<Item = &ContextKey> {
        self.table.keys()
    }

    /// Number of distinct contexts.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Sum of every stored weight across all contexts.
    pub fn total_weight(&self) -> u64 {
        self.table.values().map(|dist| dist.total).sum()
    }

    /// Serialize with compression.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut entries: Vec<(ContextKey, Vec<(Successor, u64)>)> = self
            .table
            .iter()
            .map(|(key, dist)| {
                let mut weights: Vec<(Successor, u64)> =
                    dist.weights.iter().map(|(s, w)| (s.clone(), *w)).collect();
                weights.sort();
                (key.clone(), weights)
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let persisted = PersistedModel {
            magic: MODEL_MAGIC,
            version: MODEL_VERSION,
            entries,
        };
        let serialized = bincode::serialize(&persisted)?;
        let compressed = zstd::encode_all(&serialized[..], ZSTD_LEVEL)?;
        Ok(compressed)
    }

    /// Rebuild a model from [`ChainModel::to_bytes`] output. Totals are
    /// recomputed from the stored weights; zero weights and emptied contexts
    /// are dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let serialized =
            zstd::decode_all(bytes).map_err(|e| ChainError::Persistence(e.to_string()))?;
        let persisted: PersistedModel = bincode::deserialize(&serialized)
            .map_err(|e| ChainError::Persistence(e.to_string()))?;

        if persisted.magic != MODEL_MAGIC {
            return Err(ChainError::Persistence(format!(
                "bad magic {:?}",
                persisted.magic
            )));
        }
        if persisted.version != MODEL_VERSION {
            return Err(ChainError::Persistence(format!(
                "unsupported model version {}",
                persisted.version
            )));
        }

        let mut model = ChainModel::new();
        for (key, weights) in persisted.entries {
            let mut dist = Distribution::default();
            for (successor, weight) in weights.into_iter().filter(|(_, w)| *w > 0) {
                dist.add(successor, weight);
            }
            if !dist.is_empty() {
                model.table.insert(key, dist);
            }
        }
        Ok(model)
    }
}
