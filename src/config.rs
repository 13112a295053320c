//! Bot settings. Every field has a default; a TOML file may override any of them.

use crate::generator::{DEFAULT_CANDIDATE_ATTEMPTS, DEFAULT_MAX_WALK_STEPS};
use crate::scorer::{ResponseScorer, DEFAULT_IDEAL_RATIO, DEFAULT_NOUN_OFFSET};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Nickname; also qualifies the stored model keys.
    pub identity: String,
    pub model_dir: PathBuf,
    pub noun_file: PathBuf,
    /// Learned line by line when no stored model exists yet.
    pub seed_file: PathBuf,
    /// Baseline chance of answering an ordinary message.
    pub respond_probability: f64,
    /// Added to the chance when the message mentions the bot's nickname.
    pub mention_bonus: f64,
    pub candidate_attempts: usize,
    pub ideal_ratio: f64,
    pub noun_offset: f64,
    pub max_walk_steps: usize,
    /// Messages from senders whose name contains this are ignored.
    pub bot_marker: String,
    pub output_enabled: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            identity: "mark_v_bot".to_string(),
            model_dir: PathBuf::from("."),
            noun_file: PathBuf::from("nounlist.txt"),
            seed_file: PathBuf::from("seed.txt"),
            respond_probability: 0.4,
            mention_bonus: 1.0,
            candidate_attempts: DEFAULT_CANDIDATE_ATTEMPTS,
            ideal_ratio: DEFAULT_IDEAL_RATIO,
            noun_offset: DEFAULT_NOUN_OFFSET,
            max_walk_steps: DEFAULT_MAX_WALK_STEPS,
            bot_marker: "bot".to_string(),
            output_enabled: true,
        }
    }
}

impl BotConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BotConfig = toml::from_str(text).context("invalid bot config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make scoring or sampling meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.noun_offset.is_nan() || self.noun_offset <= 0.0 {
            bail!("noun_offset must be positive, got {}", self.noun_offset);
        }
        if !self.ideal_ratio.is_finite() {
            bail!("ideal_ratio must be finite, got {}", self.ideal_ratio);
        }
        if self.candidate_attempts == 0 {
            bail!("candidate_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("can't read config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn scorer(&self) -> ResponseScorer {
        ResponseScorer::new(self.ideal_ratio, self.noun_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.identity, "mark_v_bot");
        assert_eq!(config.candidate_attempts, 14);
        assert_eq!(config.ideal_ratio, 0.8);
        assert_eq!(config.noun_offset, 0.1);
        assert_eq!(config.respond_probability, 0.4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BotConfig::from_toml_str(
            "identity = \"chatty\"\nrespond_probability = 1.0\nmodel_dir = \"models\"\n",
        )
        .unwrap();
        assert_eq!(config.identity, "chatty");
        assert_eq!(config.respond_probability, 1.0);
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.max_walk_steps, DEFAULT_MAX_WALK_STEPS);
        assert!(config.output_enabled);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(BotConfig::from_toml_str("candidate_attempts = \"many\"").is_err());
    }

    #[test]
    fn test_non_positive_noun_offset_is_rejected() {
        assert!(BotConfig::from_toml_str("noun_offset = 0.0").is_err());
        assert!(BotConfig::from_toml_str("noun_offset = -0.5").is_err());
        assert!(BotConfig::from_toml_str("noun_offset = 0.25").is_ok());
    }
}
