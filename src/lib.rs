//! A chat bot brain built from two second-order Markov chains.
//!
//! Every message is learned forwards and backwards. A reply is grown outwards
//! from a context that starts with one of the message's nouns: the reverse
//! chain supplies what comes before it, the forward chain what comes after.
//! Several such candidates are generated and the one whose noun mix is
//! closest to an ideal on-topic ratio is chosen.

pub mod chain;
pub mod config;
pub mod corpus;
pub mod error;
pub mod generator;
pub mod pair;
pub mod scorer;
pub mod session;
pub mod store;
pub mod tokenizer;
pub mod vocab;

pub use chain::{ChainModel, ContextKey, Distribution, Successor, Token, TokenSet};
pub use config::BotConfig;
pub use error::{ChainError, Result};
pub use generator::{emit_forward, ResponseGenerator};
pub use pair::{ChainPair, SharedBrain};
pub use scorer::ResponseScorer;
pub use session::{bootstrap_brain, Reply, Session};
pub use store::{FileStore, MemoryStore, ModelStore};
pub use tokenizer::{render, tokenize};
pub use vocab::{prioritise, NounVocabulary};
