use embedded_io::Write;

use crate::{helpers::LossyStr, Config, Error};

/// Final result code sent by a responding device on success
pub const RESPONSE_OK: &[u8] = b"\r\nOK\r\n";

/// Final result code sent by a responding device on failure
pub const RESPONSE_ERROR: &[u8] = b"\r\nERROR\r\n";

/// Writes AT commands and result codes to a serial writer.
///
/// Commands are byte strings that end at the first NUL byte, if any, and are
/// never written beyond the configured maximum command length.
pub struct Sender<W> {
    writer: W,
    config: Config,
}

impl<W: Write> Sender<W> {
    pub fn new(writer: W, config: Config) -> Self {
        Self { writer, config }
    }

    /// Write `cmd` as is. Returns the number of bytes written.
    pub fn send(&mut self, cmd: &[u8]) -> Result<usize, Error> {
        let cmd = self.bounded(cmd);
        self.send_inner(cmd)?;
        Ok(cmd.len())
    }

    /// Write `cmd` followed by the command terminator.
    pub fn send_command(&mut self, cmd: &[u8]) -> Result<usize, Error> {
        let cmd = self.bounded(cmd);
        self.send_inner(cmd)?;
        self.write_all(self.config.command_term)?;
        Ok(cmd.len() + self.config.command_term.len())
    }

    pub fn respond_ok(&mut self) -> Result<(), Error> {
        self.send_inner(RESPONSE_OK)
    }

    pub fn respond_error(&mut self) -> Result<(), Error> {
        self.send_inner(RESPONSE_ERROR)
    }

    pub fn release(self) -> W {
        self.writer
    }

    fn bounded<'c>(&self, cmd: &'c [u8]) -> &'c [u8] {
        let len = cmd
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(cmd.len())
            .min(self.config.max_command_len);
        &cmd[..len]
    }

    fn send_inner(&mut self, cmd: &[u8]) -> Result<(), Error> {
        if cmd.len() < 50 {
            debug!("Sending command: {:?}", LossyStr(cmd));
        } else {
            debug!("Sending command with long payload ({} bytes)", cmd.len());
        }

        self.write_all(cmd)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.writer.write_all(buf).map_err(|_| Error::Write)?;
        self.writer.flush().map_err(|_| Error::Write)
    }
}
