use crate::timing::{BitTiming, TimingError};

/// CPU clock of the reference board (Arduino Uno class AVR).
pub const DEFAULT_CLOCK_HZ: u32 = 16_000_000;

/// Baud rate used when none is configured.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default size of the receive byte queue. Holds `RX_BUFFER_SIZE - 1` bytes.
pub const RX_BUFFER_SIZE: usize = 64;

/// What the receiver does with a frame whose stop bit was sampled low.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingPolicy {
    /// Discard the byte and count a framing error
    #[default]
    Drop,
    /// Deliver the byte anyway, still counting the framing error
    Lenient,
}

/// Build time configuration of a soft UART line.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Config {
    pub(crate) clock_hz: u32,
    pub(crate) baud_rate: u32,
    pub(crate) max_compare: u32,
    pub(crate) framing: FramingPolicy,
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
            clock_hz: DEFAULT_CLOCK_HZ,
            baud_rate: DEFAULT_BAUD_RATE,
            max_compare: u16::MAX as u32,
            framing: FramingPolicy::Drop,
        }
    }

    #[must_use]
    pub const fn clock_hz(mut self, hz: u32) -> Self {
        self.clock_hz = hz;
        self
    }

    #[must_use]
    pub const fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Largest value the sampling timer's compare register can hold.
    #[must_use]
    pub const fn max_compare(mut self, max: u32) -> Self {
        self.max_compare = max;
        self
    }

    #[must_use]
    pub const fn framing(mut self, policy: FramingPolicy) -> Self {
        self.framing = policy;
        self
    }

    pub const fn framing_policy(&self) -> FramingPolicy {
        self.framing
    }

    /// Derive the bit timing. An error here must abort start-up.
    pub const fn timing(&self) -> Result<BitTiming, TimingError> {
        BitTiming::new(self.clock_hz, self.baud_rate, self.max_compare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.framing_policy(), FramingPolicy::Drop);
        assert_eq!(config.timing().unwrap().cycles_per_bit(), 1666);
    }

    #[test]
    fn builder() {
        let config = Config::new()
            .clock_hz(8_000_000)
            .baud_rate(4800)
            .framing(FramingPolicy::Lenient);
        assert_eq!(config.framing_policy(), FramingPolicy::Lenient);
        assert_eq!(config.timing().unwrap().cycles_per_bit(), 1666);

        let config = Config::new().baud_rate(0);
        assert_eq!(config.timing(), Err(TimingError::ZeroBaudRate));
    }
}
