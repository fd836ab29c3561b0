use std::fmt;

use regex::Regex;

use crate::error::{Result, StevedoreError};

/// Regex fragment for `**/`: zero or more whole directories.
const ANY_DIRS: &str = "(?:[^/]*/)*";
/// Regex fragment for a trailing `/**` or `/`: the directory itself or
/// anything below it.
const DIR_AND_BELOW: &str = "(?:/.*)?";
/// Regex fragment for `*`: any run of characters within one segment.
const ANY_IN_SEGMENT: &str = "[^/]*";
/// Regex fragment for `?`: exactly one non-separator character.
const ONE_CHAR: &str = "[^/]";

/// How a compiled glob is evaluated against a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// The glob must match the whole path.
    #[default]
    Full,
    /// The glob must match somewhere within the path.
    Find,
}

/// An Ant-style glob compiled once into a regular expression.
///
/// Supported syntax:
///
/// | Glob        | Meaning                                        |
/// |-------------|------------------------------------------------|
/// | `*`         | any run of characters within one path segment |
/// | `**/`       | zero or more directories                       |
/// | `/**` (end) | the directory itself or anything below it      |
/// | `**`        | any run of characters, separators included     |
/// | `?`         | one character other than `/`                   |
/// | `{a,b}`     | either `a` or `b` (groups may nest)            |
/// | `\x`        | the literal character `x`                      |
///
/// A trailing `/` is shorthand for `/**`. Surrounding whitespace is ignored.
#[derive(Clone, Debug)]
pub struct AntGlob {
    glob: String,
    whole: Regex,
    anywhere: Regex,
}

impl AntGlob {
    /// Compiles `glob`.
    ///
    /// # Errors
    ///
    /// Returns [`StevedoreError::InvalidGlob`] for unbalanced braces, runs of
    /// three or more `*`, or a trailing `\`.
    pub fn compile(glob: &str) -> Result<Self> {
        let trimmed = glob.trim();
        let body = translate(trimmed)?;

        let whole = Regex::new(&format!("^(?:{body})$")).map_err(|e| invalid(trimmed, e))?;
        let anywhere = Regex::new(&body).map_err(|e| invalid(trimmed, e))?;

        Ok(Self {
            glob: trimmed.to_string(),
            whole,
            anywhere,
        })
    }

    /// The glob this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Returns `true` if the glob matches all of `path`.
    pub fn full_match(&self, path: &str) -> bool {
        self.whole.is_match(path)
    }

    /// Returns `true` if the glob matches somewhere within `path`.
    pub fn find(&self, path: &str) -> bool {
        self.anywhere.is_match(path)
    }

    /// Evaluates the glob under `mode`.
    pub fn is_match(&self, path: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Full => self.full_match(path),
            MatchMode::Find => self.find(path),
        }
    }
}

impl fmt::Display for AntGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

fn invalid(glob: &str, message: impl fmt::Display) -> StevedoreError {
    StevedoreError::InvalidGlob {
        glob: glob.to_string(),
        message: message.to_string(),
    }
}

/// Translates an Ant glob into an unanchored regex body.
fn translate(glob: &str) -> Result<String> {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 4);
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' => {
                let run = chars[i..].iter().take_while(|&&ch| ch == '*').count();
                if run > 2 {
                    return Err(invalid(glob, "more than two consecutive '*'"));
                }
                if run == 1 {
                    out.push_str(ANY_IN_SEGMENT);
                    i += 1;
                    continue;
                }

                let segment_start = i == 0
                    || chars[i - 1] == '/'
                    || (depth > 0 && matches!(chars[i - 1], '{' | ','));
                if segment_start && chars.get(i + 2) == Some(&'/') {
                    out.push_str(ANY_DIRS);
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '/' if depth == 0 && is_dir_suffix(&chars[i + 1..]) => {
                out.push_str(DIR_AND_BELOW);
                break;
            }
            '?' => {
                out.push_str(ONE_CHAR);
                i += 1;
            }
            '{' => {
                depth += 1;
                out.push_str("(?:");
                i += 1;
            }
            '}' => {
                if depth == 0 {
                    return Err(invalid(glob, "'}' without a matching '{'"));
                }
                depth -= 1;
                out.push(')');
                i += 1;
            }
            ',' if depth > 0 => {
                out.push('|');
                i += 1;
            }
            '\\' => {
                let Some(&escaped) = chars.get(i + 1) else {
                    return Err(invalid(glob, "dangling '\\' at end of glob"));
                };
                push_literal(&mut out, escaped);
                i += 2;
            }
            _ => {
                push_literal(&mut out, c);
                i += 1;
            }
        }
    }

    if depth > 0 {
        return Err(invalid(glob, "'{' without a matching '}'"));
    }

    Ok(out)
}

/// `rest` follows a `/`; a trailing `/` or `/**` selects the directory and
/// everything below it.
fn is_dir_suffix(rest: &[char]) -> bool {
    matches!(rest, [] | ['*', '*'])
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
