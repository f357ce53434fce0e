//
// latex/scanner.rs
//
// Command invocation scanner for LaTeX source
//

use regex::Regex;
use std::sync::OnceLock;
use tower_lsp::lsp_types::{Position, Range};

/// A `{...}` group following a command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredParam {
    /// Raw group text, delimiters included
    pub text: String,
    /// Range of the group, delimiters included
    pub range: Range,
}

/// A command token together with the required parameter groups that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Command token including the leading backslash, e.g. `\usepackage`
    pub name: String,
    pub name_range: Range,
    /// Required parameters in source order
    pub required: Vec<RequiredParam>,
    /// From the backslash to the end of the last argument group
    pub range: Range,
}

impl CommandInvocation {
    /// The command name without its leading backslash.
    pub fn command_name(&self) -> Option<&str> {
        let name = self.name.strip_prefix('\\')?;
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\\[A-Za-z@]+\*?").unwrap())
}

/// Byte offset plus the LSP position it corresponds to.
#[derive(Debug, Clone)]
struct Cursor<'a> {
    text: &'a str,
    offset: usize,
    line: u32,
    character: u32,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            line: 0,
            character: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += c.len_utf16() as u32;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.character)
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Skip whitespace between argument groups. A blank line ends the argument list.
    fn skip_argument_gap(&mut self) -> bool {
        let mut newlines = 0;
        while let Some(c) = self.peek() {
            if c == '\n' {
                newlines += 1;
                if newlines > 1 {
                    return false;
                }
            } else if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
        true
    }

    /// Consume a balanced group opened by `open`. Returns false if the input ends first.
    fn skip_group(&mut self, open: char, close: char) -> bool {
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '%' => self.skip_line_comment(),
                '{' if open != '{' => {
                    // Braces hide brackets inside optional arguments: [a={x]y}]
                    if !self.skip_group_from_open('{', '}') {
                        return false;
                    }
                }
                c if c == open => depth += 1,
                c if c == close => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Like `skip_group`, but the opening delimiter has already been consumed.
    fn skip_group_from_open(&mut self, open: char, close: char) -> bool {
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '%' => self.skip_line_comment(),
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }
}

/// Read the argument groups that follow a command name.
///
/// Returns the required parameters and the position where the last group ended.
fn scan_arguments(mut cursor: Cursor<'_>) -> (Vec<RequiredParam>, Position) {
    let mut required = Vec::new();
    let mut end = cursor.position();

    loop {
        let mut lookahead = cursor.clone();
        if !lookahead.skip_argument_gap() {
            break;
        }
        match lookahead.peek() {
            Some('{') => {
                let start_offset = lookahead.offset;
                let start = lookahead.position();
                if !lookahead.skip_group('{', '}') {
                    log::trace!("Unterminated required group at {:?}", start);
                    break;
                }
                required.push(RequiredParam {
                    text: lookahead.text[start_offset..lookahead.offset].to_string(),
                    range: Range::new(start, lookahead.position()),
                });
            }
            Some('[') => {
                if !lookahead.skip_group('[', ']') {
                    break;
                }
            }
            _ => break,
        }
        end = lookahead.position();
        cursor = lookahead;
    }

    (required, end)
}

/// Scan LaTeX source for command invocations, in document order.
///
/// Commands inside `%` comments are ignored. Commands nested inside another
/// command's arguments are reported too, after their enclosing command.
pub fn scan_commands(text: &str) -> Vec<CommandInvocation> {
    let mut invocations = Vec::new();
    let mut cursor = Cursor::new(text);

    while let Some(c) = cursor.peek() {
        match c {
            '%' => cursor.skip_line_comment(),
            '\\' => {
                let Some(m) = command_pattern().find(cursor.rest()) else {
                    // Control symbol such as \\ or \%
                    cursor.bump();
                    cursor.bump();
                    continue;
                };
                let start = cursor.position();
                let name = m.as_str().to_string();
                for _ in name.chars() {
                    cursor.bump();
                }
                let name_end = cursor.position();
                let (required, end) = scan_arguments(cursor.clone());
                invocations.push(CommandInvocation {
                    name,
                    name_range: Range::new(start, name_end),
                    required,
                    range: Range::new(start, end),
                });
            }
            _ => {
                cursor.bump();
            }
        }
    }

    log::trace!("Scanned {} command invocations", invocations.len());
    invocations
}
