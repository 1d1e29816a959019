//! Rename rules.
//!
//! Rules are written the way they are in a browser's address bar:
//! `/pattern/flags` deletes whatever matches, `/pattern/replacement/flags`
//! substitutes it. `$1`, `$&` and `$<name>` refer to capture groups.

use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use crate::error::{Error, ErrorKind, Result};

/// A parsed rename rule.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    replacement: String,
    global: bool,
}

impl Rule {
    /// Apply the rule to `input`: every match with the `g` flag, otherwise
    /// the first.
    pub fn apply(&self, input: &str) -> String {
        if self.global {
            self.regex.replace_all(input, self.replacement.as_str()).into_owned()
        } else {
            self.regex.replace(input, self.replacement.as_str()).into_owned()
        }
    }
}

impl FromStr for Rule {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || exn::Exn::from(ErrorKind::InvalidRule(s.to_string()));
        let body = s.trim().strip_prefix('/').ok_or_else(invalid)?;
        let parts = split_unescaped(body);
        let (pattern, replacement, flags) = match parts.as_slice() {
            [pattern, flags] => (pattern, "", flags),
            [pattern, replacement, flags] => (pattern, replacement.as_str(), flags),
            _ => return Err(invalid()),
        };

        let mut builder = RegexBuilder::new(pattern);
        let mut global = false;
        for flag in flags.chars() {
            match flag {
                'g' => global = true,
                'i' => {
                    builder.case_insensitive(true);
                },
                'm' => {
                    builder.multi_line(true);
                },
                's' => {
                    builder.dot_matches_new_line(true);
                },
                'x' => {
                    builder.ignore_whitespace(true);
                },
                // Unicode is always on, and sticky matching has no meaning
                // for whole-name rewrites.
                'u' | 'y' => {},
                _ => return Err(invalid()),
            }
        }
        let regex = builder.build().map_err(|_| invalid())?;
        Ok(Self { regex, replacement: translate_replacement(replacement), global })
    }
}

/// Parse every rule, failing on the first invalid one.
pub fn parse_rules<S: AsRef<str>>(rules: impl IntoIterator<Item = S>) -> Result<Vec<Rule>> {
    rules.into_iter().map(|rule| rule.as_ref().parse()).collect()
}

/// Split on `/`, except where escaped as `\/`. Other escapes are kept for the
/// regex engine.
fn split_unescaped(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('/') => current.push('/'),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                },
                None => current.push('\\'),
            },
            '/' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Convert `$1`, `$&`, `$<name>` and `$$` into the `regex` crate's syntax.
/// Any other `$` is literal.
fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut rest = replacement;
    while let Some(index) = rest.find('$') {
        out.push_str(&rest[..index]);
        let tail = &rest[index + 1..];
        let digits = tail.bytes().take(2).take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            out.push_str(&format!("${{{}}}", &tail[..digits]));
            rest = &tail[digits..];
        } else if let Some(after) = tail.strip_prefix('&') {
            out.push_str("${0}");
            rest = after;
        } else if let Some(after) = tail.strip_prefix('$') {
            out.push_str("$$");
            rest = after;
        } else if let Some((name, after)) = tail.strip_prefix('<').and_then(|t| t.split_once('>')) {
            out.push_str(&format!("${{{name}}}"));
            rest = after;
        } else {
            out.push_str("$$");
            rest = tail;
        }
    }
    out.push_str(rest);
    out
}
