//! Splitting chat lines into tokens and joining tokens back into a line.

use regex::Regex;
use std::sync::OnceLock;

/// Words (allowing inner apostrophes, dots, slashes and bangs) or a single
/// punctuation mark.
const TOKEN_PATTERN: &str = r"[/!\w.]*[!\w'.]?\w+|,|:|\.|!|'|\?";

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern compiles"))
}

/// Punctuation that attaches to the previous token when rendered.
pub fn is_punct(token: &str) -> bool {
    matches!(token, "," | "?" | "!" | "." | ":")
}

/// Tokenize one chat line. Case is preserved so tokens match the noun list as
/// written. A leading address such as `nick: hello` or `nick, hello` is
/// dropped together with its separator.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = token_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    if tokens.len() > 1 && matches!(tokens[1].as_str(), ":" | ",") {
        tokens.drain(..2);
    }
    tokens
}

/// Join tokens with single spaces, pulling punctuation onto the word before it.
pub fn render(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        if !out.is_empty() && !is_punct(token) {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}
