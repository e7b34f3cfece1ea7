/// Character class used for tokenization. Letters and digits share one class
/// per category; every other character is its own singleton class so unrelated
/// punctuation never conflates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleClass {
    Lower,
    Upper,
    Digit,
    Symbol(char),
}

impl RuleClass {
    pub fn of(c: char) -> RuleClass {
        match c {
            'a'..='z' => RuleClass::Lower,
            'A'..='Z' => RuleClass::Upper,
            '0'..='9' => RuleClass::Digit,
            other => RuleClass::Symbol(other),
        }
    }

    /// Rule string as it appears inside bracket expressions: `a-z`, `A-Z`,
    /// `0-9`, or the symbol itself (escaped when it is a metacharacter).
    pub fn rule_str(&self) -> String {
        match self {
            RuleClass::Lower => "a-z".to_string(),
            RuleClass::Upper => "A-Z".to_string(),
            RuleClass::Digit => "0-9".to_string(),
            RuleClass::Symbol(c) => escape_rule_char(*c),
        }
    }

    /// Whether runs of this class render as an exact-count bracket
    /// expression. Letter runs stay literal: case-homogeneous text is
    /// structural signal, not noise.
    pub fn is_bracketed(&self) -> bool {
        matches!(self, RuleClass::Digit | RuleClass::Symbol(_))
    }
}

fn is_pattern_meta(c: char) -> bool {
    matches!(
        c,
        '.' | '?' | '+' | '*' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\' | '^' | '$' | '-'
    )
}

pub fn escape_rule_char(c: char) -> String {
    if is_pattern_meta(c) {
        format!("\\{c}")
    } else {
        c.to_string()
    }
}

/// `[rule]` for a run of one, `[rule]{n}` otherwise.
pub fn exact_num(rule: &str, n: usize) -> String {
    if n == 1 {
        format!("[{rule}]")
    } else {
        format!("[{rule}]{{{n}}}")
    }
}

/// Bracket rule covering a whole piece: exact count when the generalized
/// length is uniform across the cluster, variable-length otherwise.
pub fn fuzzy_pattern(fuzzy_rule: &str, length: Option<usize>) -> String {
    match length {
        Some(n) => exact_num(fuzzy_rule, n),
        None => format!("[{fuzzy_rule}]+"),
    }
}
