//! OSC 1.0 address-pattern compilation and matching.
//!
//! A pattern is a `/`-separated address whose segments may use the OSC
//! metacharacters: `?` (one non-`/` character), `*` (zero or more non-`/`
//! characters), `[a-c]` / `[!a-c]` character classes, and `{foo,bar}`
//! alternation of literal substrings. Metacharacters never cross a `/`.
//!
//! Compilation translates each segment into a small token program that is
//! matched with bounded backtracking (only `*` backtracks, and only within
//! its own segment). Patterns are anchored at both ends.

use crate::RouteError;

/// How the dispatcher compares a registered address against an incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The registered string must equal the incoming address byte for byte.
    Exact,
    /// The registered string is compiled as a pattern.
    #[default]
    Pattern,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(char),
    /// `?`
    AnyChar,
    /// `*`
    Wildcard,
    /// `[...]`, optionally negated.
    Class {
        negated: bool,
        entries: Vec<ClassEntry>,
    },
    /// `{a,b,c}` — whole-substring alternatives, each literal.
    Alt(Vec<Vec<char>>),
}

#[derive(Debug, Clone, PartialEq)]
enum ClassEntry {
    Char(char),
    Range(char, char),
}

impl ClassEntry {
    fn contains(&self, c: char) -> bool {
        match *self {
            ClassEntry::Char(e) => e == c,
            ClassEntry::Range(lo, hi) => (lo..=hi).contains(&c),
        }
    }
}

/// A compiled OSC address pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Vec<Token>>,
}

impl Pattern {
    /// Compiles `pattern` into a matcher.
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let segments = pattern
            .split('/')
            .map(|segment| compile_segment(pattern, segment))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern string this matcher was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `address` matches. Segments pair up one to one, so a
    /// pattern and an address with different path depths never match.
    pub fn matches(&self, address: &str) -> bool {
        let parts: Vec<&str> = address.split('/').collect();
        if parts.len() != self.segments.len() {
            return false;
        }
        self.segments.iter().zip(parts).all(|(tokens, part)| {
            let chars: Vec<char> = part.chars().collect();
            match_tokens(tokens, &chars)
        })
    }
}

fn bad(pattern: &str, reason: impl Into<String>) -> RouteError {
    RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

fn compile_segment(pattern: &str, segment: &str) -> Result<Vec<Token>, RouteError> {
    let chars: Vec<char> = segment.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '*' => {
                // Consecutive wildcards collapse to one.
                if tokens.last() != Some(&Token::Wildcard) {
                    tokens.push(Token::Wildcard);
                }
                i += 1;
            }
            '[' => {
                let (token, next) = compile_class(pattern, &chars, i + 1)?;
                tokens.push(token);
                i = next;
            }
            ']' => return Err(bad(pattern, "unmatched ']'")),
            '{' => {
                let (token, next) = compile_alt(pattern, &chars, i + 1)?;
                tokens.push(token);
                i = next;
            }
            '}' => return Err(bad(pattern, "unmatched '}'")),
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Parses a character class starting just past the `[`. Returns the token
/// and the index just past the closing `]`.
fn compile_class(
    pattern: &str,
    chars: &[char],
    mut i: usize,
) -> Result<(Token, usize), RouteError> {
    let mut negated = false;
    if matches!(chars.get(i), Some('!') | Some('^')) {
        negated = true;
        i += 1;
    }

    let mut entries = Vec::new();
    let mut first = true;
    loop {
        let c = match chars.get(i) {
            Some(c) => *c,
            None => return Err(bad(pattern, "unterminated '['")),
        };
        // ']' closes the class unless it is the first member.
        if c == ']' && !first {
            return Ok((Token::Class { negated, entries }, i + 1));
        }
        first = false;

        // A 'lo-hi' range, unless the '-' is the last member.
        if chars.get(i + 1) == Some(&'-') && chars.get(i + 2).is_some_and(|&c| c != ']') {
            let hi = chars[i + 2];
            if c > hi {
                return Err(bad(pattern, format!("reversed range {c}-{hi}")));
            }
            entries.push(ClassEntry::Range(c, hi));
            i += 3;
        } else {
            entries.push(ClassEntry::Char(c));
            i += 1;
        }
    }
}

/// Parses an alternation starting just past the `{`. Returns the token and
/// the index just past the closing `}`.
fn compile_alt(
    pattern: &str,
    chars: &[char],
    mut i: usize,
) -> Result<(Token, usize), RouteError> {
    let mut alts = Vec::new();
    let mut current = Vec::new();
    loop {
        match chars.get(i) {
            None => return Err(bad(pattern, "unterminated '{'")),
            Some('{') => return Err(bad(pattern, "nested '{'")),
            Some('}') => {
                alts.push(current);
                return Ok((Token::Alt(alts), i + 1));
            }
            Some(',') => {
                alts.push(std::mem::take(&mut current));
                i += 1;
            }
            Some(&c) => {
                current.push(c);
                i += 1;
            }
        }
    }
}

fn match_tokens(tokens: &[Token], chars: &[char]) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return chars.is_empty();
    };
    match token {
        Token::Literal(expected) => {
            chars.first() == Some(expected) && match_tokens(rest, &chars[1..])
        }
        Token::AnyChar => !chars.is_empty() && match_tokens(rest, &chars[1..]),
        Token::Wildcard => (0..=chars.len()).any(|skip| match_tokens(rest, &chars[skip..])),
        Token::Class { negated, entries } => chars.first().is_some_and(|&c| {
            let hit = entries.iter().any(|e| e.contains(c));
            hit != *negated && match_tokens(rest, &chars[1..])
        }),
        Token::Alt(alts) => alts.iter().any(|alt| {
            chars.len() >= alt.len()
                && chars[..alt.len()] == alt[..]
                && match_tokens(rest, &chars[alt.len()..])
        }),
    }
}
