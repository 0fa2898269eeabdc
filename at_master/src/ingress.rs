use soft_uart::ByteConsumer;

use crate::{AtMaster, Config, LineAssembler};

/// Feeds received bytes through a [`LineAssembler`] into an [`AtMaster`].
pub struct Ingress<'m, 'a, T, const N: usize, const L: usize> {
    lines: LineAssembler<L>,
    master: &'m AtMaster<'a, T, N>,
}

impl<'m, 'a, T: Copy, const N: usize, const L: usize> Ingress<'m, 'a, T, N, L> {
    pub fn new(master: &'m AtMaster<'a, T, N>, config: Config) -> Self {
        info!("AT ingress started with {} commands", master.len());
        Self {
            lines: LineAssembler::new(config),
            master,
        }
    }

    /// Write bytes to the ingress, dispatching every line they complete.
    ///
    /// Returns the number of completed lines.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        let mut lines = 0;
        for &b in buf {
            if self.feed(b) {
                lines += 1;
            }
        }
        lines
    }

    /// Move everything currently in the receive queue through the ingress.
    ///
    /// Returns the number of completed lines.
    pub fn drain<const Q: usize>(&mut self, consumer: &mut ByteConsumer<'_, Q>) -> usize {
        if consumer.take_overflow() {
            error!("Receive queue overflow, bytes were lost");
        }

        let mut lines = 0;
        while let Some(b) = consumer.pop() {
            if self.feed(b) {
                lines += 1;
            }
        }
        lines
    }

    fn feed(&mut self, b: u8) -> bool {
        match self.lines.push(b) {
            Some(line) => {
                if self.master.dispatch(line).is_none() {
                    debug!("Unsolicited line: {:?}", crate::helpers::LossyStr(line));
                }
                true
            }
            None => false,
        }
    }

    /// Bytes of the current partial line
    pub fn len(&self) -> usize {
        self.lines.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lines.capacity()
    }
}
