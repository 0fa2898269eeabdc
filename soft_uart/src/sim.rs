//! Cycle level simulation of one soft UART line, for host side tests.
//!
//! A [`Line`] models the wire, the pin-change detector and a clear-on-compare
//! timer of the receiving MCU. The pin, edge and timer handles it hands out
//! implement the traits a [`Receiver`](crate::Receiver) and a
//! [`Transmitter`](crate::Transmitter) need. Time only moves inside
//! [`Line::run`] (or a [`Delay`] built from the line), which fires the
//! receiver's interrupt handlers at the cycles they would fire on hardware.
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//!
//! use soft_uart::{sim::Line, ByteQueue, Config, Receiver, Transmitter};
//!
//! let config = Config::new();
//! let timing = config.timing().unwrap();
//! let line = Line::new(16_000_000);
//!
//! let mut queue: ByteQueue<8> = ByteQueue::new();
//! let (producer, mut consumer) = queue.split();
//! let receiver = Receiver::new(timing, line.rx_pin(), line.edge(), line.timer(), producer, ());
//! let receiver = Rc::new(RefCell::new(receiver));
//!
//! let mut tx = Transmitter::new(line.tx_pin(), line.delay(receiver.clone()), (), &timing).unwrap();
//! tx.transmit(b"Hi").unwrap();
//!
//! assert_eq!(consumer.pop(), Some(b'H'));
//! assert_eq!(consumer.pop(), Some(b'i'));
//! ```

extern crate alloc;

use alloc::rc::Rc;
use core::{cell::RefCell, convert::Infallible};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};

use crate::hal::{CompareTimer, EdgeDetect, RxIsr};

#[derive(Debug)]
struct State {
    level: bool,
    now: u64,
    edge_enabled: bool,
    edge_pending: bool,
    compare_enabled: bool,
    compare: u32,
    counter_start: u64,
    edges: u32,
    compares: u32,
}

enum Event {
    Edge,
    Compare,
}

/// A simulated wire plus the receiving side's interrupt peripherals.
#[derive(Clone)]
pub struct Line {
    state: Rc<RefCell<State>>,
    clock_hz: u32,
}

impl Line {
    /// A line idling high, clocked at `clock_hz`.
    pub fn new(clock_hz: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                level: true,
                now: 0,
                edge_enabled: false,
                edge_pending: false,
                compare_enabled: false,
                compare: 0,
                counter_start: 0,
                edges: 0,
                compares: 0,
            })),
            clock_hz,
        }
    }

    pub fn tx_pin(&self) -> TxPin {
        TxPin(self.clone())
    }

    pub fn rx_pin(&self) -> RxPin {
        RxPin(self.clone())
    }

    pub fn edge(&self) -> Edge {
        Edge(self.clone())
    }

    pub fn timer(&self) -> Timer {
        Timer(self.clone())
    }

    /// Busy-wait provider that advances this line and fires `isr`.
    pub fn delay<'a>(&self, isr: Rc<RefCell<dyn RxIsr + 'a>>) -> Delay<'a> {
        Delay {
            line: self.clone(),
            isr: Some(isr),
        }
    }

    /// Busy-wait provider for a line nobody listens to.
    pub fn detached_delay(&self) -> Delay<'static> {
        Delay {
            line: self.clone(),
            isr: None,
        }
    }

    pub fn level(&self) -> bool {
        self.state.borrow().level
    }

    /// Current simulated cycle
    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    pub fn edge_enabled(&self) -> bool {
        self.state.borrow().edge_enabled
    }

    pub fn compare_enabled(&self) -> bool {
        self.state.borrow().compare_enabled
    }

    /// Compare value last programmed into the timer
    pub fn compare(&self) -> u32 {
        self.state.borrow().compare
    }

    /// Cycle at which the timer counter last restarted
    pub fn counter_start(&self) -> u64 {
        self.state.borrow().counter_start
    }

    /// Edge interrupts delivered so far
    pub fn edge_interrupts(&self) -> u32 {
        self.state.borrow().edges
    }

    /// Compare interrupts delivered so far
    pub fn compare_interrupts(&self) -> u32 {
        self.state.borrow().compares
    }

    pub fn cycles_for_ns(&self, ns: u32) -> u64 {
        u64::from(ns) * u64::from(self.clock_hz) / 1_000_000_000
    }

    /// Set the wire level. A transition latches an edge interrupt if the
    /// detector is enabled; it fires when time next advances.
    pub fn drive(&self, high: bool) {
        let mut s = self.state.borrow_mut();
        if s.level != high {
            s.level = high;
            if s.edge_enabled {
                s.edge_pending = true;
            }
        }
    }

    /// Advance `cycles`, firing the handlers of `isr` as they come due.
    pub fn run(&self, isr: &mut dyn RxIsr, cycles: u64) {
        let end = self.state.borrow().now + cycles;
        loop {
            let event = {
                let mut s = self.state.borrow_mut();
                if core::mem::take(&mut s.edge_pending) && s.edge_enabled {
                    s.edges += 1;
                    Event::Edge
                } else {
                    let due = (s.counter_start + u64::from(s.compare.max(1))).max(s.now);
                    if s.compare_enabled && due <= end {
                        s.now = due;
                        s.counter_start = due;
                        s.compares += 1;
                        Event::Compare
                    } else {
                        s.now = end;
                        break;
                    }
                }
            };

            match event {
                Event::Edge => isr.on_edge(),
                Event::Compare => isr.on_compare(),
            }
        }
    }

    /// Drive one raw frame onto the wire, followed by one idle bit.
    ///
    /// `stop_bit` is the level driven during the stop bit; `false` produces
    /// a framing error.
    pub fn send_frame(&self, isr: &mut dyn RxIsr, byte: u8, stop_bit: bool, bit_cycles: u64) {
        self.drive(false);
        self.run(isr, bit_cycles);
        for i in 0..8 {
            self.drive(byte & (1 << i) != 0);
            self.run(isr, bit_cycles);
        }
        self.drive(stop_bit);
        self.run(isr, bit_cycles);
        self.drive(true);
        self.run(isr, bit_cycles);
    }
}

struct Detached;

impl RxIsr for Detached {
    fn on_edge(&mut self) {}

    fn on_compare(&mut self) {}
}

/// Output side of the wire.
pub struct TxPin(Line);

impl ErrorType for TxPin {
    type Error = Infallible;
}

impl OutputPin for TxPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.drive(true);
        Ok(())
    }
}

/// Input side of the wire.
pub struct RxPin(Line);

impl ErrorType for RxPin {
    type Error = Infallible;
}

impl InputPin for RxPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.level())
    }
}

/// Pin-change detector of the wire.
pub struct Edge(Line);

impl EdgeDetect for Edge {
    fn enable_edge(&mut self) {
        self.0.state.borrow_mut().edge_enabled = true;
    }

    fn disable_edge(&mut self) {
        let mut s = self.0.state.borrow_mut();
        s.edge_enabled = false;
        s.edge_pending = false;
    }
}

/// Clear-on-compare sampling timer.
pub struct Timer(Line);

impl CompareTimer for Timer {
    fn set_compare(&mut self, ticks: u32) {
        self.0.state.borrow_mut().compare = ticks;
    }

    fn reset_counter(&mut self) {
        let mut s = self.0.state.borrow_mut();
        s.counter_start = s.now;
    }

    fn enable_compare(&mut self) {
        self.0.state.borrow_mut().compare_enabled = true;
    }

    fn disable_compare(&mut self) {
        self.0.state.borrow_mut().compare_enabled = false;
    }
}

/// Busy-wait that lets simulated time pass on a [`Line`].
pub struct Delay<'a> {
    line: Line,
    isr: Option<Rc<RefCell<dyn RxIsr + 'a>>>,
}

impl DelayNs for Delay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = self.line.cycles_for_ns(ns);
        match &self.isr {
            Some(isr) => self.line.run(&mut *isr.borrow_mut(), cycles),
            None => self.line.run(&mut Detached, cycles),
        }
    }
}
