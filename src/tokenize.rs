use crate::rules::{exact_num, RuleClass};
use itertools::Itertools;
use std::num::NonZeroUsize;
use std::sync::Arc;

const DEFAULT_CACHE_CAPACITY: usize = 8192;

/// One maximal run of characters of a single rule class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    rule: RuleClass,
    run_len: usize,
}

impl Token {
    /// Rendered form: literal text for letter runs, an exact-count bracket
    /// expression for digit and symbol runs.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rule(&self) -> RuleClass {
        self.rule
    }

    /// Number of source characters in the run.
    pub fn run_len(&self) -> usize {
        self.run_len
    }
}

/// Tokenized form of one raw piece; a pure function of the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPiece {
    tokens: Vec<Token>,
    rendered: String,
    fuzzy_rule: String,
    piece_length: usize,
}

impl ParsedPiece {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Concatenated token texts: the piece as it appears in a pattern.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Sorted, duplicate-free concatenation of the rule strings present.
    /// The primary clustering key: run lengths and literal content are
    /// invisible here.
    pub fn fuzzy_rule(&self) -> &str {
        &self.fuzzy_rule
    }

    /// Generalized character count: bracket and escape syntax contributes
    /// zero, a repeat-count suffix contributes its numeric count.
    pub fn piece_length(&self) -> usize {
        self.piece_length
    }
}

/// Tokenize one raw piece: scan left to right, a class boundary always starts
/// a new token even if the class recurs later.
pub fn tokenize(raw: &str) -> ParsedPiece {
    let mut tokens: Vec<Token> = Vec::new();
    let mut run = String::new();
    let mut run_len = 0usize;
    let mut current: Option<RuleClass> = None;

    fn push_token(tokens: &mut Vec<Token>, rule: RuleClass, run: &mut String, run_len: usize) {
        let text = if rule.is_bracketed() {
            exact_num(&rule.rule_str(), run_len)
        } else {
            std::mem::take(run)
        };
        run.clear();
        tokens.push(Token { text, rule, run_len });
    }

    for c in raw.chars() {
        let rule = RuleClass::of(c);
        if current != Some(rule) {
            if let Some(prev) = current {
                push_token(&mut tokens, prev, &mut run, run_len);
            }
            current = Some(rule);
            run_len = 0;
        }
        run.push(c);
        run_len += 1;
    }
    if let Some(prev) = current {
        push_token(&mut tokens, prev, &mut run, run_len);
    }

    let rendered = tokens.iter().map(|t| t.text.as_str()).collect();
    let fuzzy_rule = tokens
        .iter()
        .map(|t| t.rule.rule_str())
        .sorted()
        .dedup()
        .collect();
    let piece_length = tokens.iter().map(|t| t.run_len).sum();
    ParsedPiece { tokens, rendered, fuzzy_rule, piece_length }
}

/// Memoizing piece tokenizer. Entries are pure functions of the raw text, so
/// repeated identical pieces are tokenized once and shared.
pub struct PieceParser {
    cache: lru::LruCache<String, Arc<ParsedPiece>>,
}

impl PieceParser {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { cache: lru::LruCache::new(cap) }
    }

    pub fn parse(&mut self, raw: &str) -> Arc<ParsedPiece> {
        if let Some(hit) = self.cache.get(raw) {
            return hit.clone();
        }
        let parsed = Arc::new(tokenize(raw));
        self.cache.put(raw.to_string(), parsed.clone());
        parsed
    }
}

impl Default for PieceParser {
    fn default() -> Self {
        Self::new()
    }
}
