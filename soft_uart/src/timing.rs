/// Number of nanoseconds in one second, used to derive the transmit delay.
const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Why a clock / baud rate combination cannot drive the soft UART.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    /// A baud rate of zero has no bit period
    ZeroBaudRate,
    /// Less than two timer ticks per bit, so there is no half-bit midpoint
    PeriodTooShort,
    /// The first sample interval (1.5 bits) does not fit the compare register
    PeriodTooLong,
}

/// Bit period of the line, expressed in timer ticks.
///
/// Derived once from `clock_hz / baud_rate` and shared by the transmitter and
/// the receiver. The constructor is a `const fn`, so the timing of a fixed
/// build configuration can be checked at compile time:
///
/// ```
/// use soft_uart::BitTiming;
///
/// const TIMING: BitTiming = match BitTiming::new(16_000_000, 9600, u16::MAX as u32) {
///     Ok(t) => t,
///     Err(_) => panic!("invalid soft UART timing"),
/// };
///
/// assert_eq!(TIMING.cycles_per_bit(), 1666);
/// assert_eq!(TIMING.cycles_half_bit(), 833);
/// ```
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    cycles_per_bit: u32,
    cycles_half_bit: u32,
    bit_period_ns: u32,
}

impl BitTiming {
    /// Derive the bit timing for `baud_rate` on a timer clocked at
    /// `clock_hz`, whose compare register holds at most `max_compare`.
    pub const fn new(clock_hz: u32, baud_rate: u32, max_compare: u32) -> Result<Self, TimingError> {
        if baud_rate == 0 {
            return Err(TimingError::ZeroBaudRate);
        }

        let cycles_per_bit = clock_hz / baud_rate;
        if cycles_per_bit < 2 {
            return Err(TimingError::PeriodTooShort);
        }

        let cycles_half_bit = cycles_per_bit / 2;
        // The edge handler programs 1.5 bit periods in one go
        if cycles_per_bit as u64 + cycles_half_bit as u64 > max_compare as u64 {
            return Err(TimingError::PeriodTooLong);
        }

        Ok(Self {
            cycles_per_bit,
            cycles_half_bit,
            bit_period_ns: NANOS_PER_SEC / baud_rate,
        })
    }

    /// Timer ticks in one bit period.
    pub const fn cycles_per_bit(&self) -> u32 {
        self.cycles_per_bit
    }

    /// Timer ticks in half a bit period.
    pub const fn cycles_half_bit(&self) -> u32 {
        self.cycles_half_bit
    }

    /// Interval from the falling start-bit edge to the midpoint of data bit 0.
    pub const fn first_sample(&self) -> u32 {
        self.cycles_per_bit + self.cycles_half_bit
    }

    /// Duration the transmitter holds each bit, in nanoseconds.
    pub const fn bit_period_ns(&self) -> u32 {
        self.bit_period_ns
    }
}
