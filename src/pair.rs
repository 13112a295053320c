//! The forward and reverse chains, always trained together.

use crate::chain::{ChainModel, Token};
use crate::error::{ChainError, Result};
use crate::store::{model_key, ModelStore};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};

pub const FORWARD: &str = "forward";
pub const REVERSE: &str = "reverse";

/// One pair shared by every session of a bot identity. Each learn and each
/// whole generation batch holds the lock for its full duration.
pub type SharedBrain = Arc<Mutex<ChainPair>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChainPair {
    pub forward: ChainModel,
    pub reverse: ChainModel,
}

/// Result of [`ChainPair::load`]: the pair plus whether anything was actually
/// restored from the store.
pub struct LoadedPair {
    pub pair: ChainPair,
    pub restored: bool,
}

impl ChainPair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedBrain {
        Arc::new(Mutex::new(self))
    }

    /// Learn `tokens` forwards and, reversed, backwards.
    pub fn learn(&mut self, tokens: &[Token]) {
        self.forward.learn(tokens);
        let reversed: Vec<Token> = tokens.iter().rev().cloned().collect();
        self.reverse.learn(&reversed);
    }

    pub fn merge(&mut self, other: ChainPair) {
        self.forward.merge(other.forward);
        self.reverse.merge(other.reverse);
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.reverse.is_empty()
    }

    /// Persist both directions under `<identity>.forward` / `<identity>.reverse`.
    /// Both blobs are encoded before either is written. Each write is atomic
    /// on its own but the pair is not: if the reverse write fails, the store
    /// holds the new forward model next to the previous reverse one.
    pub fn save(&self, store: &dyn ModelStore, identity: &str) -> Result<()> {
        let forward = self.forward.to_bytes()?;
        let reverse = self.reverse.to_bytes()?;
        let forward_key = model_key(identity, FORWARD);
        let reverse_key = model_key(identity, REVERSE);

        store.save(&forward_key, &forward)?;
        debug!("[✓] Wrote {}", forward_key);
        if let Err(e) = store.save(&reverse_key, &reverse) {
            warn!(
                "[!] {} was written but {} was not: {} - stored pair is out of step",
                forward_key, reverse_key, e
            );
            return Err(e);
        }
        debug!("[✓] Wrote {}", reverse_key);
        info!(
            "[✓] Saved {} ({} + {} bytes, compressed)",
            identity,
            forward.len(),
            reverse.len()
        );
        Ok(())
    }

    /// Load both directions. A missing or unreadable direction starts empty
    /// instead of failing.
    pub fn load(store: &dyn ModelStore, identity: &str) -> LoadedPair {
        let (forward, forward_ok) = load_or_empty(store, &model_key(identity, FORWARD));
        let (reverse, reverse_ok) = load_or_empty(store, &model_key(identity, REVERSE));
        LoadedPair {
            pair: ChainPair { forward, reverse },
            restored: forward_ok || reverse_ok,
        }
    }
}

/// The stored model under `key`, or an empty one. The flag says whether a
/// stored model was actually decoded.
pub fn load_or_empty(store: &dyn ModelStore, key: &str) -> (ChainModel, bool) {
    let loaded = store.load(key).and_then(|bytes| match bytes {
        Some(bytes) => ChainModel::from_bytes(&bytes).map(Some),
        None => Ok(None),
    });

    match loaded {
        Ok(Some(model)) => {
            info!("[✓] Model loaded: {} ({} contexts)", key, model.len());
            (model, true)
        }
        Ok(None) => {
            info!("[◐] No stored model for {} - starting empty", key);
            (ChainModel::new(), false)
        }
        Err(ChainError::Io(e)) => {
            warn!("[!] Can't read {}: {} - starting empty", key, e);
            (ChainModel::new(), false)
        }
        Err(e) => {
            warn!("[!] Corrupt model {}: {} - starting empty", key, e);
            (ChainModel::new(), false)
        }
    }
}
