//! Hardware seams of the soft UART.
//!
//! Pins and busy-wait delays come from [`embedded-hal`]; the interrupt
//! plumbing that has no standard trait is described here. A platform crate
//! implements these for its pin-change interrupt and its sampling timer, and
//! calls [`RxIsr`] from the matching interrupt vectors.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

/// Pin-change interrupt on the receive line.
pub trait EdgeDetect {
    /// Fire the edge handler on the next transition of the line
    fn enable_edge(&mut self);

    /// Stop reporting transitions of the line
    fn disable_edge(&mut self);
}

/// A timer in clear-on-compare mode, used to sample the receive line.
///
/// The counter restarts at zero on every compare match, so after a match the
/// next interrupt fires `ticks` later, where `ticks` is the value programmed
/// by the most recent [`set_compare`](CompareTimer::set_compare).
pub trait CompareTimer {
    /// Program the compare value, in timer ticks
    fn set_compare(&mut self, ticks: u32);

    /// Restart the counter at zero
    fn reset_counter(&mut self);

    /// Enable the compare match interrupt
    fn enable_compare(&mut self);

    /// Disable the compare match interrupt
    fn disable_compare(&mut self);
}

/// Suppresses the receive-path interrupts while the transmitter drives a
/// frame.
///
/// `mask` and `unmask` are always called in pairs by the transmitter, through
/// a guard that unmasks when dropped.
pub trait RxMask {
    fn mask(&mut self);

    fn unmask(&mut self);
}

/// No masking. For lines where the receiver runs on a separate core or is
/// not wired at all.
impl RxMask for () {
    fn mask(&mut self) {}

    fn unmask(&mut self) {}
}

/// Masks every interrupt through the global [`critical_section`]
/// implementation, the equivalent of `cli()` / `sei()`.
#[derive(Default)]
pub struct GlobalMask {
    restore: Option<critical_section::RestoreState>,
}

impl GlobalMask {
    pub const fn new() -> Self {
        Self { restore: None }
    }

    /// Whether the critical section is currently held
    pub fn is_masked(&self) -> bool {
        self.restore.is_some()
    }
}

impl RxMask for GlobalMask {
    fn mask(&mut self) {
        if self.restore.is_none() {
            // SAFETY: released exactly once in `unmask`, on the same core.
            self.restore = Some(unsafe { critical_section::acquire() });
        }
    }

    fn unmask(&mut self) {
        if let Some(restore) = self.restore.take() {
            // SAFETY: `restore` was produced by the matching `acquire`.
            unsafe { critical_section::release(restore) };
        }
    }
}

/// Holds the receive path masked for as long as it lives.
pub(crate) struct Masked<'a, M: RxMask> {
    mask: &'a mut M,
}

impl<'a, M: RxMask> Masked<'a, M> {
    pub(crate) fn new(mask: &'a mut M) -> Self {
        mask.mask();
        Self { mask }
    }
}

impl<M: RxMask> Drop for Masked<'_, M> {
    fn drop(&mut self) {
        self.mask.unmask();
    }
}

/// Entry point of the line-assembly service.
///
/// Called from interrupt context once per delivered byte, in wire order.
/// Implementations must not block.
pub trait ByteSink {
    fn push_byte(&mut self, byte: u8);
}

/// Discards every byte. Use when bytes are only consumed through the queue.
impl ByteSink for () {
    fn push_byte(&mut self, _byte: u8) {}
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn push_byte(&mut self, byte: u8) {
        (**self).push_byte(byte);
    }
}

/// The two interrupt handlers of a receiver.
pub trait RxIsr {
    /// Pin-change interrupt of the receive line
    fn on_edge(&mut self);

    /// Compare match interrupt of the sampling timer
    fn on_compare(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingMask {
        masked: u32,
        unmasked: u32,
    }

    impl RxMask for CountingMask {
        fn mask(&mut self) {
            self.masked += 1;
        }

        fn unmask(&mut self) {
            self.unmasked += 1;
        }
    }

    #[test]
    fn guard_unmasks_on_drop() {
        let mut mask = CountingMask::default();
        {
            let _masked = Masked::new(&mut mask);
        }
        assert_eq!(mask.masked, 1);
        assert_eq!(mask.unmasked, 1);
    }

    #[test]
    fn guard_unmasks_on_early_return() {
        fn fails(mask: &mut CountingMask) -> Result<(), ()> {
            let _masked = Masked::new(mask);
            let pin: Result<(), ()> = Err(());
            pin?;
            Ok(())
        }

        let mut mask = CountingMask::default();
        assert!(fails(&mut mask).is_err());
        assert_eq!(mask.unmasked, 1);
    }

    #[test]
    fn global_mask_holds_critical_section() {
        let mut mask = GlobalMask::new();
        assert!(!mask.is_masked());
        mask.mask();
        assert!(mask.is_masked());
        // A second mask does not nest
        mask.mask();
        mask.unmask();
        assert!(!mask.is_masked());
        mask.unmask();
        assert!(!mask.is_masked());
    }
}
