// src/engine/assembler.rs

//! Turns raw stdout bursts into the text pieces handed to output handlers.

/// Splits decoded output into lines, each keeping its trailing `\n`.
///
/// A burst is everything the pipe had to offer at one readiness event, so
/// a trailing fragment without a newline is emitted straight away: the
/// child has stopped writing, typically because it is waiting on stdin.
/// Only an incomplete UTF-8 sequence at the very end of a burst is held
/// back until the next burst completes it.
#[derive(Debug, Default)]
pub struct LineAssembler {
    carry: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(bytes);

        let tail = incomplete_utf8_tail(&self.carry);
        let split = self.carry.len() - tail;
        let rest = self.carry.split_off(split);
        let ready = std::mem::replace(&mut self.carry, rest);

        split_lines(&String::from_utf8_lossy(&ready))
    }

    /// Flush whatever is left at end-of-stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.carry);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_owned).collect()
}

/// Length of a truncated multi-byte sequence at the end of `bytes`.
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if b & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = match b {
            0xF0..=0xFF => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if needed > back { back } else { 0 };
    }
    0
}
