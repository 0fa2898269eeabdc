use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::{
    error::Error,
    hal::{GlobalMask, Masked, RxMask},
    timing::BitTiming,
};

/// Blocking 8N1 transmitter driving a GPIO with busy-wait delays.
///
/// Every frame is a start bit (low), eight data bits LSB first and a stop
/// bit (high), each held for one bit period. The receive path stays masked
/// for the whole frame and is restored on every exit path, errors included.
pub struct Transmitter<TX, D, M = GlobalMask> {
    tx: TX,
    delay: D,
    mask: M,
    bit_period_ns: u32,
}

impl<TX, D, M, E> Transmitter<TX, D, M>
where
    TX: OutputPin<Error = E>,
    D: DelayNs,
    M: RxMask,
{
    /// Take ownership of the pin and drive the line to its idle (high) level.
    pub fn new(mut tx: TX, delay: D, mask: M, timing: &BitTiming) -> Result<Self, Error<E>> {
        tx.set_high().map_err(Error::Bus)?;
        Ok(Self {
            tx,
            delay,
            mask,
            bit_period_ns: timing.bit_period_ns(),
        })
    }

    pub fn release(self) -> (TX, D, M) {
        (self.tx, self.delay, self.mask)
    }

    /// Send one frame. Returns once the stop bit has elapsed.
    pub fn transmit_byte(&mut self, byte: u8) -> Result<(), Error<E>> {
        let _masked = Masked::new(&mut self.mask);
        drive_frame(&mut self.tx, &mut self.delay, self.bit_period_ns, byte)
    }

    /// Send `bytes` in order, stopping at the first NUL. Returns the number
    /// of bytes sent.
    pub fn transmit(&mut self, bytes: &[u8]) -> Result<usize, Error<E>> {
        self.transmit_bounded(bytes, bytes.len())
    }

    /// Like [`transmit`](Self::transmit), but sends at most `max_len` bytes.
    pub fn transmit_bounded(&mut self, bytes: &[u8], max_len: usize) -> Result<usize, Error<E>> {
        let mut sent = 0;
        for &byte in bytes.iter().take(max_len).take_while(|&&b| b != 0) {
            self.transmit_byte(byte)?;
            sent += 1;
        }
        Ok(sent)
    }
}

fn drive_frame<TX, D, E>(tx: &mut TX, delay: &mut D, bit_ns: u32, byte: u8) -> Result<(), Error<E>>
where
    TX: OutputPin<Error = E>,
    D: DelayNs,
{
    // Start bit
    tx.set_low().map_err(Error::Bus)?;
    delay.delay_ns(bit_ns);

    let mut select_bit = 1u8;
    for _ in 0..8 {
        if byte & select_bit != 0 {
            tx.set_high().map_err(Error::Bus)?;
        } else {
            tx.set_low().map_err(Error::Bus)?;
        }
        select_bit <<= 1;
        delay.delay_ns(bit_ns);
    }

    // Stop bit
    tx.set_high().map_err(Error::Bus)?;
    delay.delay_ns(bit_ns);
    Ok(())
}

impl<TX, D, M, E> embedded_io::ErrorType for Transmitter<TX, D, M>
where
    TX: OutputPin<Error = E>,
    E: core::fmt::Debug,
{
    type Error = Error<E>;
}

impl<TX, D, M, E> embedded_io::Write for Transmitter<TX, D, M>
where
    TX: OutputPin<Error = E>,
    D: DelayNs,
    M: RxMask,
    E: core::fmt::Debug,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.transmit_byte(byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Frames are complete when `transmit_byte` returns
        Ok(())
    }
}

impl<TX, D, M, E> core::fmt::Write for Transmitter<TX, D, M>
where
    TX: OutputPin<Error = E>,
    D: DelayNs,
    M: RxMask,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for &byte in s.as_bytes() {
            self.transmit_byte(byte).map_err(|_| core::fmt::Error)?;
        }
        Ok(())
    }
}
