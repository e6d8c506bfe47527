//! Dot-chain extraction and splitting.
//!
//! A dot-chain is the member-access expression that ends at the cursor, e.g.
//! `list.stream().filter(x -> x.ok()).co`. Extraction scans backwards from the
//! cursor, splitting scans the extracted text forwards. Both track parenthesis
//! depth and string quoting so that dots inside arguments or literals are
//! never mistaken for chain links.

use crate::registry::nameify;

const NEW_KEYWORD: &str = "new";

/// Characters that end a chain when met at depth zero outside quotes.
const TERMINATORS: &[char] = &[
    ';', '{', '}', '=', ',', '!', '&', '|', '+', '-', '*', '/', '%', '<', '>', '?', ':', '^', '~',
];

/// Classification of the backward scanner before it looks at a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Depth zero, copying chain characters.
    Scanning,
    /// Inside an argument list (depth > 0).
    InParens,
    /// Inside a string literal.
    Quoted,
    /// Depth zero after whitespace; `seen_dot` records whether a dot joined the run.
    Transitioning { seen_dot: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Keep,
    Drop,
    Stop,
    /// Stop at the boundary between a keyword or statement and the chain.
    StopAtBoundary,
}

struct BackwardScanner {
    depth: i32,
    quoted: bool,
    transition: Option<bool>,
}

impl BackwardScanner {
    fn new() -> Self {
        Self {
            depth: 0,
            quoted: false,
            transition: None,
        }
    }

    fn state(&self) -> ScanState {
        if self.quoted {
            ScanState::Quoted
        } else if self.depth > 0 {
            ScanState::InParens
        } else if let Some(seen_dot) = self.transition {
            ScanState::Transitioning { seen_dot }
        } else {
            ScanState::Scanning
        }
    }

    /// Decide what to do with `ch`; `escaped` is true when the preceding
    /// character (in forward order) is a backslash.
    fn step(&mut self, ch: char, escaped: bool, accumulated: bool) -> Action {
        let before = self.state();
        if before == (ScanState::Transitioning { seen_dot: false })
            && !ch.is_whitespace()
            && ch != '.'
        {
            return Action::StopAtBoundary;
        }

        match ch {
            '"' if !escaped => self.quoted = !self.quoted,
            ')' if !self.quoted => self.depth += 1,
            '(' if !self.quoted => self.depth -= 1,
            _ => {}
        }

        if before == ScanState::Quoted || self.quoted {
            if !self.quoted && self.depth == 0 {
                self.transition = None;
            }
            return Action::Keep;
        }
        if self.depth < 0 {
            return Action::Stop;
        }
        if self.depth > 0 || ch == '(' {
            if ch.is_whitespace() {
                return Action::Drop;
            }
            if self.depth == 0 {
                self.transition = None;
            }
            return Action::Keep;
        }
        if TERMINATORS.contains(&ch) {
            return Action::Stop;
        }
        if ch.is_whitespace() {
            if accumulated {
                self.transition.get_or_insert(false);
            }
            return Action::Drop;
        }
        if ch == '.' {
            self.transition = Some(true);
            return Action::Keep;
        }
        self.transition = None;
        Action::Keep
    }
}

/// Extract the dot-chain ending at byte offset `end` of `text`.
///
/// Whitespace between links and inside argument lists is removed. When the
/// chain is directly preceded by the `new` keyword the result starts with
/// `"new "`. Returns an empty string when nothing qualifies.
pub fn extract_trailing_chain(text: &str, end: usize) -> String {
    let end = end.min(text.len());
    let Some(head) = text.get(..end) else {
        return String::new();
    };
    let chars: Vec<char> = head.chars().collect();

    let mut scanner = BackwardScanner::new();
    let mut reversed: Vec<char> = Vec::new();
    let mut keyword_new = false;

    for i in (0..chars.len()).rev() {
        let ch = chars[i];
        let escaped = i > 0 && chars[i - 1] == '\\';
        match scanner.step(ch, escaped, !reversed.is_empty()) {
            Action::Keep => reversed.push(ch),
            Action::Drop => {}
            Action::Stop => break,
            Action::StopAtBoundary => {
                keyword_new = ends_with_keyword_new(&chars[..=i]);
                break;
            }
        }
    }

    let chain: String = reversed.into_iter().rev().collect();
    if keyword_new && !chain.is_empty() {
        format!("{NEW_KEYWORD} {chain}")
    } else {
        chain
    }
}

fn ends_with_keyword_new(chars: &[char]) -> bool {
    let keyword: Vec<char> = NEW_KEYWORD.chars().collect();
    if chars.len() < keyword.len() || chars[chars.len() - keyword.len()..] != keyword[..] {
        return false;
    }
    match chars.len().checked_sub(keyword.len() + 1) {
        Some(before) => !is_identifier_char(chars[before]),
        None => true,
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Split a chain on its top-level dots.
///
/// Dots inside parentheses or string literals do not split. A trailing dot
/// yields an empty final segment. Unbalanced parentheses or an unterminated
/// string make the chain malformed, reported as an empty vector.
pub fn split_chain_top_level(chain: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quoted = false;
    let mut previous: Option<char> = None;

    for ch in chain.chars() {
        match ch {
            '"' if previous != Some('\\') => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth -= 1;
                if depth < 0 {
                    return vec![];
                }
            }
            '.' if !quoted && depth == 0 => {
                segments.push(std::mem::take(&mut current));
                previous = Some(ch);
                continue;
            }
            _ => {}
        }
        current.push(ch);
        previous = Some(ch);
    }

    if depth != 0 || quoted {
        return vec![];
    }
    segments.push(current);
    segments
}

/// A split chain with at least one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotChain {
    segments: Vec<String>,
}

impl DotChain {
    pub fn parse(chain: &str) -> Option<Self> {
        let segments = split_chain_top_level(chain);
        (!segments.is_empty()).then_some(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every segment but the one being typed.
    pub fn links(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The segment being typed, used as the member prefix.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_member_access(&self) -> bool {
        self.segments.len() > 1
    }

    /// Class prefix of a single-segment `new Foo` chain.
    pub fn constructor_prefix(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [only] => only.strip_prefix("new ").map(str::trim_start),
            _ => None,
        }
    }
}

/// Lexical state of a line prefix, read left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Code,
    StringLiteral,
    CharLiteral,
    LineComment,
    BlockComment,
}

/// Whether `prefix`, the text of a line up to the cursor, ends inside a
/// string or char literal or a comment opened on that line.
///
/// Covers literals the parser cannot close yet, such as `"hello Arr` while
/// it is being typed.
pub fn ends_in_literal_or_comment(prefix: &str) -> bool {
    let mut state = LineState::Code;
    let mut chars = prefix.chars().peekable();

    while let Some(ch) = chars.next() {
        state = match (state, ch) {
            (LineState::Code, '"') => LineState::StringLiteral,
            (LineState::Code, '\'') => LineState::CharLiteral,
            (LineState::Code, '/') if chars.peek() == Some(&'/') => LineState::LineComment,
            (LineState::Code, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                LineState::BlockComment
            }
            (LineState::StringLiteral | LineState::CharLiteral, '\\') => {
                chars.next();
                state
            }
            (LineState::StringLiteral, '"') | (LineState::CharLiteral, '\'') => LineState::Code,
            (LineState::BlockComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                LineState::Code
            }
            (LineState::LineComment, _) => return true,
            _ => state,
        };
    }
    state != LineState::Code
}

/// Name part of a segment with call arguments removed.
pub fn plain_name(segment: &str) -> &str {
    nameify(segment).trim()
}
