// src/confirm.rs

//! Per-item confirmation for `helper delete`.
//!
//! The delete helper prints one line per item. A line ending in the
//! completion marker means the item is gone; any other line asks whether
//! to go ahead, and the helper then blocks reading `y` or `n` from stdin.
//! [`DeletionConfirmer`] is the output handler speaking that protocol.

use tracing::debug;

use crate::config::DeleteSection;
use crate::config::model::{DEFAULT_COMPLETION_MARKER, DEFAULT_PROMPT_SUFFIX_LEN};
use crate::dialog::DialogResponse;
use crate::engine::{HandlerContext, OutputHandler};

/// "Answer yes to everything" flag, scoped to a single helper process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionMemory {
    always_yes: bool,
}

impl SessionMemory {
    pub fn always_yes(&self) -> bool {
        self.always_yes
    }

    pub fn remember_yes_to_all(&mut self) {
        self.always_yes = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Exactly what is written to the helper's stdin.
    pub fn as_line(&self) -> &'static [u8] {
        match self {
            Answer::Yes => b"y\n",
            Answer::No => b"n\n",
        }
    }
}

/// Turn a dialog answer into a stdin answer, updating `memory`.
///
/// Once the memory is set every answer is "yes", whatever was clicked.
pub fn resolve(response: &DialogResponse, memory: &mut SessionMemory) -> Answer {
    if memory.always_yes() {
        return Answer::Yes;
    }
    match response {
        DialogResponse::YesToAll => {
            memory.remember_yes_to_all();
            Answer::Yes
        }
        DialogResponse::Yes => Answer::Yes,
        _ => Answer::No,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// The helper finished one item; nothing to answer.
    Completion,
    /// The helper waits for an answer about `item`.
    Request { item: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationProtocol {
    completion_marker: String,
    prompt_suffix_len: usize,
}

impl Default for ConfirmationProtocol {
    fn default() -> Self {
        Self {
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
            prompt_suffix_len: DEFAULT_PROMPT_SUFFIX_LEN,
        }
    }
}

impl From<&DeleteSection> for ConfirmationProtocol {
    fn from(section: &DeleteSection) -> Self {
        Self {
            completion_marker: section.completion_marker.clone(),
            prompt_suffix_len: section.prompt_suffix_len,
        }
    }
}

impl ConfirmationProtocol {
    pub fn classify(&self, line: &str) -> LineKind {
        if line.ends_with(&self.completion_marker) {
            return LineKind::Completion;
        }
        LineKind::Request {
            item: strip_suffix_chars(line, self.prompt_suffix_len).to_string(),
        }
    }
}

/// `line` without its last `n` characters; empty if it is shorter.
fn strip_suffix_chars(line: &str, n: usize) -> &str {
    if n == 0 {
        return line;
    }
    match line.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &line[..idx],
        None => "",
    }
}

/// Output handler for `helper delete`: prompts for every request line.
///
/// Output pieces without a trailing newline are held back until the rest
/// of their line arrives, so a request written in several pieces still
/// gets exactly one prompt.
#[derive(Debug, Clone, Default)]
pub struct DeletionConfirmer {
    protocol: ConfirmationProtocol,
    pending: String,
}

impl DeletionConfirmer {
    pub fn new(protocol: ConfirmationProtocol) -> Self {
        Self {
            protocol,
            pending: String::new(),
        }
    }

    /// The whole line once `text` completes one.
    fn complete_line(&mut self, text: &str) -> Option<String> {
        self.pending.push_str(text);
        if !self.pending.ends_with('\n') {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    fn on_line(&self, ctx: &mut HandlerContext<'_>, line: &str) {
        let LineKind::Request { item } = self.protocol.classify(line) else {
            debug!(process = %ctx.process(), line = line.trim_end(), "item deleted");
            return;
        };

        if ctx.session().always_yes() {
            debug!(process = %ctx.process(), %item, "answering yes from session memory");
            ctx.write_stdin(Answer::Yes.as_line());
            return;
        }

        ctx.open_confirmation(item);
    }
}

impl OutputHandler for DeletionConfirmer {
    fn on_output(&mut self, ctx: &mut HandlerContext<'_>, text: &str) {
        match self.complete_line(text) {
            Some(line) => self.on_line(ctx, &line),
            None => debug!(
                process = %ctx.process(),
                held = self.pending.len(),
                "waiting for end of line"
            ),
        }
    }
}
