//
// document.rs
//
// Open document text and its scanned command invocations
//

use ropey::Rope;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent};

use crate::latex::{scan_commands, CommandInvocation};

/// A scanned document
pub struct Document {
    pub contents: Rope,
    pub invocations: Vec<CommandInvocation>,
    pub version: Option<i32>,
    pub revision: u64,
}

impl Document {
    pub fn new(text: &str, version: Option<i32>) -> Self {
        Self {
            contents: Rope::from_str(text),
            invocations: scan_commands(text),
            version,
            revision: 0,
        }
    }

    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        if let Some(range) = change.range {
            let start_idx = position_to_char(&self.contents, range.start);
            let end_idx = position_to_char(&self.contents, range.end).max(start_idx);

            self.contents.remove(start_idx..end_idx);
            self.contents.insert(start_idx, &change.text);
        } else {
            // Full document sync
            self.contents = Rope::from_str(&change.text);
        }

        self.revision += 1;
    }

    /// Re-scan command invocations after a batch of changes.
    pub fn rescan(&mut self) {
        self.invocations = scan_commands(&self.text());
    }

    pub fn text(&self) -> String {
        self.contents.to_string()
    }
}

/// Char index of an LSP position, clamped to the document.
fn position_to_char(contents: &Rope, position: Position) -> usize {
    let line = position.line as usize;
    if line >= contents.len_lines() {
        return contents.len_chars();
    }
    let line_text = contents.line(line).to_string();
    let char_offset = utf16_offset_to_char_offset(&line_text, position.character as usize);
    contents.line_to_char(line) + char_offset
}

fn utf16_offset_to_char_offset(line_text: &str, utf16_offset: usize) -> usize {
    let mut utf16_count = 0;
    let mut char_count = 0;

    for ch in line_text.chars() {
        if utf16_count >= utf16_offset {
            return char_count;
        }
        utf16_count += ch.len_utf16();
        char_count += 1;
    }
    char_count
}
