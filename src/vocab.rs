//! The noun list, and picking which input tokens a reply should be about.

use crate::chain::{Token, TokenSet};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Read-only set of known nouns.
#[derive(Clone, Debug, Default)]
pub struct NounVocabulary {
    nouns: TokenSet,
}

impl NounVocabulary {
    /// One noun per line. Blank lines and anything after `#` are ignored.
    pub fn from_lines(text: &str) -> Self {
        let mut nouns = TokenSet::default();
        for line in text.lines() {
            let raw = line.split('#').next().unwrap_or("");
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                nouns.insert(trimmed.to_string());
            }
        }
        Self { nouns }
    }

    /// Load a noun file; an unreadable file yields an empty vocabulary.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                let vocab = Self::from_lines(&text);
                info!("[✓] Loaded {} nouns from {}", vocab.len(), path.display());
                vocab
            }
            Err(e) => {
                warn!("[!] Can't load nounfile {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.nouns.contains(token)
    }

    pub fn len(&self) -> usize {
        self.nouns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nouns.is_empty()
    }

    pub fn as_set(&self) -> &TokenSet {
        &self.nouns
    }
}

impl FromIterator<Token> for NounVocabulary {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            nouns: iter.into_iter().collect(),
        }
    }
}

/// The nouns in `tokens`, or every token when none of them is a noun.
pub fn prioritise(tokens: &[Token], nouns: &NounVocabulary) -> TokenSet {
    let all: TokenSet = tokens.iter().cloned().collect();
    let overlap: TokenSet = all.iter().filter(|t| nouns.contains(t)).cloned().collect();
    if overlap.is_empty() {
        all
    } else {
        overlap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> TokenSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn toks(words: &[&str]) -> Vec<Token> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_from_lines() {
        let vocab = NounVocabulary::from_lines("dog\n  cat  \n\n# header\nhouse # trailing\n");
        assert_eq!(vocab.as_set(), &set(&["dog", "cat", "house"]));
    }

    #[test]
    fn test_prioritise_prefers_nouns() {
        let nouns: NounVocabulary = toks(&["dog"]).into_iter().collect();
        assert_eq!(prioritise(&toks(&["run", "the", "dog"]), &nouns), set(&["dog"]));
    }

    #[test]
    fn test_prioritise_falls_back_to_all_tokens() {
        let nouns: NounVocabulary = toks(&["dog"]).into_iter().collect();
        assert_eq!(prioritise(&toks(&["run", "the"]), &nouns), set(&["run", "the"]));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let vocab = NounVocabulary::load(Path::new("/definitely/not/here/nouns.txt"));
        assert!(vocab.is_empty());
    }
}
