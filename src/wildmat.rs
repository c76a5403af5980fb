//! Wildmat pattern compilation
//!
//! Newsgroup names are filtered with the wildmat dialect used by NNTP
//! (`LIST ACTIVE comp.*,!comp.binaries.*`):
//!
//! - `*` matches any run of characters, `?` exactly one
//! - `[abc]`, `[a-z]` match one character from a class; `[!...]` or `[^...]`
//!   negate it; a `]` right after the opening bracket is a class member
//! - `\` makes the next character literal
//! - `,` separates alternatives and a leading `!` negates one
//!
//! Alternatives are evaluated left to right and the last one that matches a
//! candidate decides the outcome, so `alt.*,!alt.binaries.*` accepts
//! `alt.test` but rejects `alt.binaries.pictures`.
//!
//! Each alternative is translated to an anchored regular expression once at
//! compile time. The same expressions are handed to SQLite's `REGEXP`
//! function so group filtering runs inside the query.

use crate::error::PatternError;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

// Compiled DFA limit, same bound we apply to user-supplied filters elsewhere
const REGEX_SIZE_LIMIT: usize = 1024 * 1024;

/// A compiled wildmat pattern
#[derive(Debug, Clone)]
pub struct Wildmat {
    source: String,
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone)]
struct Alternative {
    negated: bool,
    regex: Regex,
}

impl Wildmat {
    /// Compile a wildmat pattern
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let alternatives = translate(pattern)?
            .into_iter()
            .map(|(negated, expr)| {
                RegexBuilder::new(&expr)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                    .map(|regex| Alternative { negated, regex })
                    .map_err(|e| PatternError::Regex(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: pattern.to_string(),
            alternatives,
        })
    }

    /// Check whether `candidate` is accepted by the pattern
    pub fn matches(&self, candidate: &str) -> bool {
        self.alternatives
            .iter()
            .rev()
            .find(|alt| alt.regex.is_match(candidate))
            .is_some_and(|alt| !alt.negated)
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Translated alternatives in pattern order as `(negated, regex source)`
    pub fn alternatives(&self) -> impl Iterator<Item = (bool, &str)> + '_ {
        self.alternatives
            .iter()
            .map(|alt| (alt.negated, alt.regex.as_str()))
    }

    /// False when every alternative is negated; such a pattern matches nothing.
    pub fn can_match(&self) -> bool {
        self.alternatives.iter().any(|alt| !alt.negated)
    }
}

impl fmt::Display for Wildmat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Wildmat {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

/// Split a pattern into alternatives and translate each into an anchored
/// regular expression.
fn translate(pattern: &str) -> Result<Vec<(bool, String)>, PatternError> {
    let mut alternatives = Vec::new();
    let mut chars = pattern.char_indices().peekable();
    let mut negated = false;
    let mut at_start = true;
    let mut body = String::new();

    while let Some((offset, c)) = chars.next() {
        match c {
            '!' if at_start => {
                negated = true;
                at_start = false;
                continue;
            }
            ',' => {
                if body.is_empty() {
                    return Err(PatternError::Empty);
                }
                alternatives.push((negated, anchor(&body)));
                body.clear();
                negated = false;
                at_start = true;
                continue;
            }
            '*' => body.push_str(".*"),
            '?' => body.push('.'),
            '\\' => {
                let (_, literal) = chars.next().ok_or(PatternError::DanglingEscape)?;
                push_literal(&mut body, literal);
            }
            '[' => translate_class(offset, &mut chars, &mut body)?,
            ']' => return Err(PatternError::UnbalancedBracket(offset)),
            _ => push_literal(&mut body, c),
        }
        at_start = false;
    }
    if body.is_empty() {
        return Err(PatternError::Empty);
    }
    alternatives.push((negated, anchor(&body)));

    Ok(alternatives)
}

fn translate_class(
    open: usize,
    chars: &mut Peekable<CharIndices<'_>>,
    body: &mut String,
) -> Result<(), PatternError> {
    let negated = matches!(chars.peek(), Some(&(_, '!' | '^')));
    if negated {
        chars.next();
    }

    let mut ranges: Vec<(char, char)> = Vec::new();
    loop {
        let (_, c) = chars.next().ok_or(PatternError::UnterminatedClass(open))?;
        let start = match c {
            ']' if !ranges.is_empty() => break,
            '\\' => chars.next().ok_or(PatternError::DanglingEscape)?.1,
            _ => c,
        };

        // `a-z` is a range; a `-` right before the closing bracket is literal
        let mut ahead = chars.clone();
        let is_range = matches!(ahead.next(), Some((_, '-')))
            && matches!(ahead.peek(), Some(&(_, end)) if end != ']');
        if !is_range {
            ranges.push((start, start));
            continue;
        }

        chars.next();
        let end = match chars.next() {
            Some((_, '\\')) => chars.next().ok_or(PatternError::DanglingEscape)?.1,
            Some((_, end)) => end,
            None => return Err(PatternError::UnterminatedClass(open)),
        };
        if end < start {
            return Err(PatternError::InvalidRange { start, end });
        }
        ranges.push((start, end));
    }

    body.push('[');
    if negated {
        body.push('^');
    }
    for (start, end) in ranges {
        // Hex escapes keep class syntax (`^`, `-`, `&&`, `~~`) out of the members
        body.push_str(&format!("\\x{{{:X}}}", start as u32));
        if start != end {
            body.push_str(&format!("-\\x{{{:X}}}", end as u32));
        }
    }
    body.push(']');

    Ok(())
}

fn push_literal(body: &mut String, c: char) {
    let mut buf = [0u8; 4];
    body.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn anchor(body: &str) -> String {
    format!("^(?s:{})$", body)
}
