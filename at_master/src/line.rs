use heapless::Vec;

use crate::{helpers::LossyStr, Config};

/// Collects received bytes into complete lines.
///
/// The ignore byte is dropped wherever it appears and the line terminator
/// completes a line, without being part of it. Bytes beyond the buffer size
/// are discarded, and the line is delivered cut to `L` bytes once its
/// terminator arrives.
pub struct LineAssembler<const L: usize> {
    buf: Vec<u8, L>,
    config: Config,
    complete: bool,
    overflowed: bool,
}

impl<const L: usize> LineAssembler<L> {
    pub const fn new(config: Config) -> Self {
        Self {
            buf: Vec::new(),
            config,
            complete: false,
            overflowed: false,
        }
    }

    /// Add one byte, returning the line it completes.
    ///
    /// The returned line stays valid until the next call.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if self.complete {
            self.clear();
        }

        if Some(byte) == self.config.ignore_char {
            return None;
        }

        if byte == self.config.line_term_char {
            if self.buf.is_empty() && !self.overflowed && self.config.skip_empty_lines {
                return None;
            }
            if self.overflowed {
                warn!(
                    "Line longer than {} bytes: {:?}",
                    L,
                    LossyStr(&self.buf)
                );
            }
            self.complete = true;
            return Some(self.buf.as_slice());
        }

        if self.buf.push(byte).is_err() {
            self.overflowed = true;
        }
        None
    }

    /// Bytes received since the last completed line
    pub fn pending(&self) -> &[u8] {
        if self.complete {
            &[]
        } else {
            self.buf.as_slice()
        }
    }

    /// Discard the partial line
    pub fn clear(&mut self) {
        self.buf.clear();
        self.complete = false;
        self.overflowed = false;
    }

    pub fn capacity(&self) -> usize {
        L
    }
}

impl<const L: usize> Default for LineAssembler<L> {
    fn default() -> Self {
        Self::new(Config::new())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec as StdVec;

    fn lines<const L: usize>(lines: &mut LineAssembler<L>, input: &[u8]) -> StdVec<StdVec<u8>> {
        input
            .iter()
            .filter_map(|&b| lines.push(b).map(<[u8]>::to_vec))
            .collect()
    }

    #[test]
    fn splits_on_line_feed() {
        let mut assembler: LineAssembler<32> = LineAssembler::default();
        let out = lines(&mut assembler, b"\r\n+CREG: 1\r\n\r\nOK\r\n");
        assert_eq!(out, [b"+CREG: 1".to_vec(), b"OK".to_vec()]);
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn keeps_partial_line() {
        let mut assembler: LineAssembler<32> = LineAssembler::default();
        assert!(lines(&mut assembler, b"AT+CSQ\r\nOK\r\n+CS").len() == 2);
        assert_eq!(assembler.pending(), b"+CS");

        let out = lines(&mut assembler, b"Q: 20,0\r\n");
        assert_eq!(out, [b"+CSQ: 20,0".to_vec()]);

        lines(&mut assembler, b"garbage");
        assembler.clear();
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn empty_lines_on_request() {
        let mut assembler: LineAssembler<8> =
            LineAssembler::new(Config::new().with_empty_lines(true));
        let out = lines(&mut assembler, b"\r\nOK\r\n");
        assert_eq!(out, [b"".to_vec(), b"OK".to_vec()]);
    }

    #[test]
    fn custom_terminator() {
        let mut assembler: LineAssembler<8> = LineAssembler::new(
            Config::new()
                .with_line_term(b'\r')
                .with_ignore_char(Some(b'\n')),
        );
        let out = lines(&mut assembler, b"A\r\nB\r\n");
        assert_eq!(out, [b"A".to_vec(), b"B".to_vec()]);
    }

    #[test]
    fn overlong_line_is_cut() {
        let mut assembler: LineAssembler<4> = LineAssembler::default();
        assert_eq!(assembler.capacity(), 4);

        let out = lines(&mut assembler, b"HELLOTHERE\r\nOK\r\n");
        assert_eq!(out, [b"HELL".to_vec(), b"OK".to_vec()]);
    }
}
