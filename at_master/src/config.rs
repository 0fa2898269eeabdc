/// Size of the default line buffer.
pub const LINE_BUF_SIZE: usize = 128;

/// Terminator appended to every command by
/// [`Sender::send_command`](crate::Sender::send_command).
pub const COMMAND_TERM: &[u8] = b"\r\n";

/// Configuration of line assembly and of the command sender.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Config {
    pub(crate) line_term_char: u8,
    pub(crate) ignore_char: Option<u8>,
    pub(crate) skip_empty_lines: bool,
    pub(crate) command_term: &'static [u8],
    pub(crate) max_command_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line_term_char: b'\n',
            ignore_char: Some(b'\r'),
            skip_empty_lines: true,
            command_term: COMMAND_TERM,
            max_command_len: 255,
        }
    }

    /// Byte completing a line
    #[must_use]
    pub const fn with_line_term(mut self, c: u8) -> Self {
        self.line_term_char = c;
        self
    }

    /// Byte dropped from the input stream, if any
    #[must_use]
    pub const fn with_ignore_char(mut self, c: Option<u8>) -> Self {
        self.ignore_char = c;
        self
    }

    /// Whether a delimiter with nothing before it completes a line
    #[must_use]
    pub const fn with_empty_lines(mut self, deliver: bool) -> Self {
        self.skip_empty_lines = !deliver;
        self
    }

    #[must_use]
    pub const fn with_command_term(mut self, term: &'static [u8]) -> Self {
        self.command_term = term;
        self
    }

    /// Longest command [`Sender::send`](crate::Sender::send) writes
    #[must_use]
    pub const fn with_max_command_len(mut self, len: usize) -> Self {
        self.max_command_len = len;
        self
    }
}
