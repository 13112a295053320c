//! One conversation: learns every inbound message and sometimes answers it.

use crate::chain::{Token, TokenSet};
use crate::config::BotConfig;
use crate::corpus::learn_file;
use crate::error::Result;
use crate::generator::ResponseGenerator;
use crate::pair::{ChainPair, SharedBrain};
use crate::store::ModelStore;
use crate::tokenizer::{render, tokenize};
use crate::vocab::{prioritise, NounVocabulary};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Silent,
    Say(String),
}

/// Load the identity's pair from `store`. When nothing was stored yet, learn
/// the seed file instead so a fresh bot has something to say.
pub fn bootstrap_brain(store: &dyn ModelStore, config: &BotConfig) -> ChainPair {
    let loaded = ChainPair::load(store, &config.identity);
    if loaded.restored {
        return loaded.pair;
    }

    let mut pair = loaded.pair;
    match learn_file(&config.seed_file) {
        Ok((seeded, lines)) => {
            pair.merge(seeded);
            info!("[✓] Loaded seedfile {} ({} lines)", config.seed_file.display(), lines);
        }
        Err(e) => warn!("[!] Can't load seedfile {}: {}", config.seed_file.display(), e),
    }
    pair
}

pub struct Session {
    brain: SharedBrain,
    nouns: Arc<NounVocabulary>,
    store: Arc<dyn ModelStore>,
    config: BotConfig,
    output_enabled: bool,
    rng: StdRng,
}

impl Session {
    pub fn new(
        brain: SharedBrain,
        nouns: Arc<NounVocabulary>,
        store: Arc<dyn ModelStore>,
        config: BotConfig,
    ) -> Self {
        Self::with_rng(brain, nouns, store, config, StdRng::from_entropy())
    }

    /// Same as [`Session::new`] with a fixed random source.
    pub fn with_rng(
        brain: SharedBrain,
        nouns: Arc<NounVocabulary>,
        store: Arc<dyn ModelStore>,
        config: BotConfig,
        rng: StdRng,
    ) -> Self {
        let output_enabled = config.output_enabled;
        Self {
            brain,
            nouns,
            store,
            config,
            output_enabled,
            rng,
        }
    }

    pub fn output_enabled(&self) -> bool {
        self.output_enabled
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn nouns(&self) -> &NounVocabulary {
        &self.nouns
    }

    fn lock_brain(&self) -> MutexGuard<'_, ChainPair> {
        self.brain.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Process one message from `sender`.
    pub fn handle_message(&mut self, sender: &str, text: &str) -> Reply {
        let marker = &self.config.bot_marker;
        if !marker.is_empty() && sender.contains(marker.as_str()) {
            return Reply::Silent;
        }

        match text.trim() {
            "!enable" => {
                self.output_enabled = !self.output_enabled;
                return Reply::Say(format!("Output to channel: {}", self.output_enabled));
            }
            "!save" => {
                return match self.save() {
                    Ok(()) => Reply::Say("I feel pickled.".to_string()),
                    Err(e) => {
                        warn!("[!] Save failed: {}", e);
                        Reply::Say(format!("Save failed: {}", e))
                    }
                };
            }
            _ => {}
        }

        let tokens = tokenize(text);
        self.lock_brain().learn(&tokens);

        let mut chance = self.config.respond_probability;
        if text.contains(&self.config.identity) {
            chance += self.config.mention_bonus;
        }
        if self.rng.gen::<f64>() >= chance {
            return Reply::Silent;
        }

        let priority = prioritise(&tokens, &self.nouns);
        let mut shown: Vec<&str> = priority.iter().map(String::as_str).collect();
        shown.sort_unstable();
        info!("Attempting to respond, using '{}'", shown.join(", "));

        let response = match self.respond(&priority) {
            Ok(response) => response,
            Err(e) if e.is_silence() => {
                info!("No possible responses.");
                return Reply::Silent;
            }
            Err(e) => {
                warn!("[!] Response failed: {}", e);
                return Reply::Silent;
            }
        };

        let line = render(&response);
        if !self.output_enabled {
            info!("Output disabled, withholding: {}", line);
            return Reply::Silent;
        }
        Reply::Say(line)
    }

    /// Generate a batch of candidates around `priority` and keep the best one.
    /// The brain stays locked for the whole batch.
    pub fn respond(&mut self, priority: &TokenSet) -> Result<Vec<Token>> {
        let brain = self.brain.lock().unwrap_or_else(|e| e.into_inner());
        let generator = ResponseGenerator::new(&brain).with_max_steps(self.config.max_walk_steps);
        let candidates =
            generator.generate_candidates(priority, self.config.candidate_attempts, &mut self.rng);
        let best = self
            .config
            .scorer()
            .pick_best(&candidates, priority, &self.nouns)?;
        Ok(best.to_vec())
    }

    /// Persist the shared pair under this session's identity.
    pub fn save(&self) -> Result<()> {
        let brain = self.lock_brain();
        brain.save(self.store.as_ref(), &self.config.identity)
    }
}
