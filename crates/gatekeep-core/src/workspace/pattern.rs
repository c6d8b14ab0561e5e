//! Regex substitution patterns for `edit_file`.

use regex::{Captures, Match, Regex, RegexBuilder, Replacer};
use std::fmt;
use thiserror::Error;

/// Flags used when a request leaves them blank.
pub const DEFAULT_FLAGS: &str = "g";

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Invalid regular expression: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid regular expression flags: {0:?}")]
    InvalidFlags(String),
}

/// A compiled find pattern plus its substitution mode.
///
/// Flags follow the usual single-letter convention:
///
/// | Flag | Effect |
/// |------|--------|
/// | `g`  | Replace every match (otherwise only the first) |
/// | `i`  | Case-insensitive |
/// | `m`  | `^` / `$` match at line boundaries |
/// | `s`  | `.` matches newline |
/// | `u`  | Accepted; patterns are always Unicode-aware |
#[derive(Clone)]
pub struct EditPattern {
    regex: Regex,
    global: bool,
    flags: String,
}

impl EditPattern {
    /// Compile `find` with the given flags. Blank flags mean [`DEFAULT_FLAGS`].
    pub fn new(find: &str, flags: &str) -> Result<Self, EditError> {
        let flags = if flags.trim().is_empty() {
            DEFAULT_FLAGS
        } else {
            flags.trim()
        };

        let mut builder = RegexBuilder::new(find);
        let mut global = false;
        let mut seen = String::new();
        for flag in flags.chars() {
            if seen.contains(flag) {
                return Err(EditError::InvalidFlags(flags.to_string()));
            }
            seen.push(flag);
            match flag {
                'g' => global = true,
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'u' => {}
                _ => return Err(EditError::InvalidFlags(flags.to_string())),
            }
        }

        Ok(Self {
            regex: builder.build()?,
            global,
            flags: flags.to_string(),
        })
    }

    /// Compile a pattern that replaces every match.
    pub fn global(find: &str) -> Result<Self, EditError> {
        Self::new(find, DEFAULT_FLAGS)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Substitute `replacement` into `text`.
    ///
    /// Replacement tokens follow the JavaScript `String.replace` rules:
    /// `$$`, `$&`, `` $` ``, `$'`, `$n` / `$nn` for groups that exist, and
    /// `$<name>` when the pattern has named groups. Anything else, such as
    /// `$10` with fewer groups or `$HOME`, is kept literally.
    pub fn apply(&self, text: &str, replacement: &str) -> String {
        let substitution = Substitution {
            template: replacement,
            haystack: text,
            has_names: self.regex.capture_names().flatten().next().is_some(),
        };
        if self.global {
            self.regex.replace_all(text, substitution).into_owned()
        } else {
            self.regex.replace(text, substitution).into_owned()
        }
    }

    /// Number of non-overlapping matches in `text`, regardless of `g`.
    pub fn match_count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }
}

struct Substitution<'a> {
    template: &'a str,
    haystack: &'a str,
    has_names: bool,
}

impl Replacer for Substitution<'_> {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut String) {
        let Some(whole) = caps.get(0) else {
            return;
        };
        let mut rest = self.template;
        while let Some(pos) = rest.find('$') {
            dst.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let consumed = self.expand(after, caps, whole, dst);
            rest = &after[consumed..];
        }
        dst.push_str(rest);
    }
}

impl Substitution<'_> {
    /// Expand the token following a `$`. Returns the bytes consumed; zero
    /// means the `$` was literal.
    fn expand(&self, after: &str, caps: &Captures<'_>, whole: Match<'_>, dst: &mut String) -> usize {
        let groups = caps.len() - 1;
        let bytes = after.as_bytes();
        match bytes.first().copied() {
            Some(b'$') => {
                dst.push('$');
                1
            }
            Some(b'&') => {
                dst.push_str(whole.as_str());
                1
            }
            Some(b'`') => {
                dst.push_str(&self.haystack[..whole.start()]);
                1
            }
            Some(b'\'') => {
                dst.push_str(&self.haystack[whole.end()..]);
                1
            }
            Some(first) if first.is_ascii_digit() => {
                let one = usize::from(first - b'0');
                if let Some(second) = bytes.get(1).copied().filter(u8::is_ascii_digit) {
                    let two = one * 10 + usize::from(second - b'0');
                    if (1..=groups).contains(&two) {
                        push_group(caps, two, dst);
                        return 2;
                    }
                }
                if (1..=groups).contains(&one) {
                    push_group(caps, one, dst);
                    return 1;
                }
                dst.push('$');
                0
            }
            Some(b'<') if self.has_names => match after.find('>') {
                Some(close) => {
                    if let Some(group) = caps.name(&after[1..close]) {
                        dst.push_str(group.as_str());
                    }
                    close + 1
                }
                None => {
                    dst.push('$');
                    0
                }
            },
            _ => {
                dst.push('$');
                0
            }
        }
    }
}

/// Unmatched groups expand to nothing.
fn push_group(caps: &Captures<'_>, index: usize, dst: &mut String) {
    if let Some(group) = caps.get(index) {
        dst.push_str(group.as_str());
    }
}

impl fmt::Debug for EditPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.regex.as_str(), self.flags)
    }
}
