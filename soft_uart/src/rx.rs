use embedded_hal::digital::InputPin;

use crate::{
    config::{Config, FramingPolicy},
    hal::{ByteSink, CompareTimer, EdgeDetect, RxIsr},
    queue::ByteProducer,
    timing::{BitTiming, TimingError},
};

/// Position of the receiver within the current frame.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Waiting for a falling edge
    #[default]
    Idle,
    /// Falling edge seen, waiting for the midpoint of data bit 0
    StartBitConfirm,
    /// `index` data bits sampled into `pending`, low bit first
    DataBits { pending: u8, index: u8 },
    /// All eight data bits sampled, waiting for the stop bit
    StopBitWait { pending: u8 },
}

/// Outcome of one compare match.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    /// Still inside the frame
    Sampling(RxState),
    /// Stop bit sampled at `stop_bit`, frame complete
    Frame { byte: u8, stop_bit: bool },
    /// Compare match with no frame in progress
    Spurious,
}

impl RxState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Transition taken at a compare match, with `level` the sampled line
    /// (`true` is high).
    pub fn step(self, level: bool) -> Step {
        match self {
            Self::Idle => Step::Spurious,
            // The first interval was 1.5 bits, so this match is already the
            // midpoint of bit 0: sample it as part of the same step.
            Self::StartBitConfirm => Self::DataBits {
                pending: 0,
                index: 0,
            }
            .step(level),
            Self::DataBits { mut pending, index } => {
                if level {
                    pending |= 1 << index;
                }
                let index = index + 1;
                if index == 8 {
                    Step::Sampling(Self::StopBitWait { pending })
                } else {
                    Step::Sampling(Self::DataBits { pending, index })
                }
            }
            Self::StopBitWait { pending } => Step::Frame {
                byte: pending,
                stop_bit: level,
            },
        }
    }
}

/// Interrupt driven 8N1 receiver.
///
/// A falling edge on the idle line starts a frame: the edge interrupt is
/// switched off and the timer is armed to match 1.5 bit periods later, the
/// middle of data bit 0. Every following match is one bit period apart and
/// samples the next bit, then the stop bit. After the stop bit the byte is
/// delivered, the timer is disarmed and the edge interrupt re-enabled.
///
/// Owned by the interrupt layer; task code only sees the bytes through the
/// [`ByteQueue`](crate::ByteQueue) consumer.
pub struct Receiver<'q, RX, E, T, S, const N: usize> {
    state: RxState,
    timing: BitTiming,
    framing: FramingPolicy,
    rx: RX,
    edge: E,
    timer: T,
    queue: ByteProducer<'q, N>,
    sink: S,
}

impl<'q, RX, E, T, S, const N: usize> Receiver<'q, RX, E, T, S, N>
where
    RX: InputPin,
    E: EdgeDetect,
    T: CompareTimer,
    S: ByteSink,
{
    /// Take ownership of the receive pin and its interrupt sources, and
    /// start listening for a start bit.
    pub fn new(
        timing: BitTiming,
        rx: RX,
        edge: E,
        timer: T,
        queue: ByteProducer<'q, N>,
        sink: S,
    ) -> Self {
        let mut receiver = Self {
            state: RxState::Idle,
            timing,
            framing: FramingPolicy::default(),
            rx,
            edge,
            timer,
            queue,
            sink,
        };
        receiver.rearm();
        receiver
    }

    /// Like [`new`](Self::new), taking both the timing and the framing
    /// policy from `config`.
    pub fn from_config(
        config: &Config,
        rx: RX,
        edge: E,
        timer: T,
        queue: ByteProducer<'q, N>,
        sink: S,
    ) -> Result<Self, TimingError> {
        let timing = config.timing()?;
        Ok(Self::new(timing, rx, edge, timer, queue, sink).with_framing(config.framing_policy()))
    }

    #[must_use]
    pub fn with_framing(mut self, policy: FramingPolicy) -> Self {
        self.framing = policy;
        self
    }

    pub fn state(&self) -> RxState {
        self.state
    }

    pub fn timing(&self) -> &BitTiming {
        &self.timing
    }

    pub fn release(self) -> (RX, E, T, ByteProducer<'q, N>, S) {
        (self.rx, self.edge, self.timer, self.queue, self.sink)
    }

    /// Back to `Idle`: compare interrupt off, edge interrupt on.
    fn rearm(&mut self) {
        self.state = RxState::Idle;
        self.timer.disable_compare();
        self.edge.enable_edge();
    }

    fn deliver(&mut self, byte: u8, stop_bit: bool) {
        if !stop_bit {
            self.queue.record_framing_error();
            warn!("Framing error, stop bit low after {}", byte);
            if self.framing == FramingPolicy::Drop {
                return;
            }
        }

        if !self.queue.push(byte) {
            self.queue.set_overflow();
            warn!("Receive queue full, dropped {}", byte);
            return;
        }
        trace!("Received {}", byte);
        self.sink.push_byte(byte);
    }
}

impl<RX, E, T, S, const N: usize> RxIsr for Receiver<'_, RX, E, T, S, N>
where
    RX: InputPin,
    E: EdgeDetect,
    T: CompareTimer,
    S: ByteSink,
{
    fn on_edge(&mut self) {
        if !self.state.is_idle() {
            return;
        }

        match self.rx.is_low() {
            Ok(true) => {}
            Ok(false) => return,
            Err(_) => {
                error!("Receive pin unreadable on edge");
                return;
            }
        }

        self.state = RxState::StartBitConfirm;
        self.edge.disable_edge();
        self.timer.set_compare(self.timing.first_sample());
        self.timer.reset_counter();
        self.timer.enable_compare();
    }

    fn on_compare(&mut self) {
        self.timer.set_compare(self.timing.cycles_per_bit());

        let level = match self.rx.is_high() {
            Ok(level) => level,
            Err(_) => {
                error!("Receive pin unreadable, abandoning frame");
                self.rearm();
                return;
            }
        };

        match self.state.step(level) {
            Step::Sampling(next) => self.state = next,
            Step::Frame { byte, stop_bit } => {
                self.deliver(byte, stop_bit);
                self.rearm();
            }
            Step::Spurious => {
                warn!("Compare match while idle, re-arming");
                self.rearm();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::{sim::Line, ByteQueue};
    use std::{cell::RefCell, rc::Rc, vec::Vec};

    const BIT: u64 = 1666;

    #[derive(Clone, Default)]
    struct Collect(Rc<RefCell<Vec<u8>>>);

    impl ByteSink for Collect {
        fn push_byte(&mut self, byte: u8) {
            self.0.borrow_mut().push(byte);
        }
    }

    fn timing() -> BitTiming {
        Config::new().timing().unwrap()
    }

    #[test]
    fn start_bit_confirm_samples_bit_zero() {
        assert_eq!(
            RxState::StartBitConfirm.step(true),
            Step::Sampling(RxState::DataBits {
                pending: 1,
                index: 1
            })
        );
        assert_eq!(
            RxState::StartBitConfirm.step(false),
            Step::Sampling(RxState::DataBits {
                pending: 0,
                index: 1
            })
        );
    }

    #[test]
    fn steps_assemble_lsb_first() {
        let byte = 0xA5u8;
        let mut state = RxState::StartBitConfirm;
        for i in 0..8 {
            match state.step(byte & (1 << i) != 0) {
                Step::Sampling(next) => state = next,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(state, RxState::StopBitWait { pending: 0xA5 });
        assert_eq!(
            state.step(true),
            Step::Frame {
                byte: 0xA5,
                stop_bit: true
            }
        );
        assert_eq!(
            state.step(false),
            Step::Frame {
                byte: 0xA5,
                stop_bit: false
            }
        );
    }

    #[test]
    fn idle_step_is_spurious() {
        assert_eq!(RxState::Idle.step(true), Step::Spurious);
        assert_eq!(RxState::Idle.step(false), Step::Spurious);
    }

    #[test]
    fn new_receiver_listens_for_start_bit() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, _consumer) = queue.split();
        let receiver = Receiver::new(timing(), line.rx_pin(), line.edge(), line.timer(), producer, ());

        assert_eq!(receiver.state(), RxState::Idle);
        assert!(line.edge_enabled());
        assert!(!line.compare_enabled());
    }

    #[test]
    fn falling_edge_arms_first_sample() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, _consumer) = queue.split();
        let mut rx = Receiver::new(timing(), line.rx_pin(), line.edge(), line.timer(), producer, ());

        line.run(&mut rx, 100);
        line.drive(false);
        line.run(&mut rx, 10);

        assert_eq!(rx.state(), RxState::StartBitConfirm);
        assert!(!line.edge_enabled());
        assert!(line.compare_enabled());
        assert_eq!(line.compare(), 2499);
        assert_eq!(line.counter_start(), 100);
    }

    #[test]
    fn rising_edge_in_idle_is_ignored() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, _consumer) = queue.split();
        let mut rx = Receiver::new(timing(), line.rx_pin(), line.edge(), line.timer(), producer, ());

        rx.on_edge();
        assert_eq!(rx.state(), RxState::Idle);
        assert!(line.edge_enabled());
        assert!(!line.compare_enabled());
    }

    #[test]
    fn receives_frame() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let sink = Collect::default();
        let mut rx = Receiver::new(
            timing(),
            line.rx_pin(),
            line.edge(),
            line.timer(),
            producer,
            sink.clone(),
        );

        line.send_frame(&mut rx, 0x4F, true, BIT);
        line.send_frame(&mut rx, 0x4B, true, BIT);

        assert_eq!(consumer.pop(), Some(0x4F));
        assert_eq!(consumer.pop(), Some(0x4B));
        assert_eq!(consumer.pop(), None);
        assert_eq!(*sink.0.borrow(), [0x4F, 0x4B]);
        assert_eq!(line.compare_interrupts(), 18);
        assert_eq!(consumer.framing_errors(), 0);
        assert!(!consumer.overflow());
    }

    #[test]
    fn framing_error_drops_byte() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let sink = Collect::default();
        let mut rx = Receiver::new(
            timing(),
            line.rx_pin(),
            line.edge(),
            line.timer(),
            producer,
            sink.clone(),
        );

        line.send_frame(&mut rx, 0x55, false, BIT);
        assert_eq!(consumer.pop(), None);
        assert!(sink.0.borrow().is_empty());
        assert_eq!(consumer.framing_errors(), 1);
        assert_eq!(rx.state(), RxState::Idle);

        // The next good frame still arrives
        line.send_frame(&mut rx, 0x56, true, BIT);
        assert_eq!(consumer.pop(), Some(0x56));
    }

    #[test]
    fn lenient_framing_delivers_byte() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let mut rx = Receiver::new(timing(), line.rx_pin(), line.edge(), line.timer(), producer, ())
            .with_framing(FramingPolicy::Lenient);

        line.send_frame(&mut rx, 0x55, false, BIT);
        assert_eq!(consumer.pop(), Some(0x55));
        assert_eq!(consumer.framing_errors(), 1);
    }

    #[test]
    fn overflow_keeps_earlier_bytes() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let sink = Collect::default();
        let mut rx = Receiver::new(
            timing(),
            line.rx_pin(),
            line.edge(),
            line.timer(),
            producer,
            sink.clone(),
        );
        let capacity = consumer.capacity();

        for b in 0..=capacity as u8 {
            line.send_frame(&mut rx, b'a' + b, true, BIT);
        }

        assert!(consumer.overflow());
        for b in 0..capacity as u8 {
            assert_eq!(consumer.pop(), Some(b'a' + b));
        }
        assert_eq!(consumer.pop(), None);
        // Popping leaves the flag alone
        assert!(consumer.overflow());
        assert!(consumer.take_overflow());
        assert!(!consumer.overflow());

        // The line path only saw the queued bytes
        let expected: Vec<u8> = (0..capacity as u8).map(|b| b'a' + b).collect();
        assert_eq!(*sink.0.borrow(), expected);
    }

    #[test]
    fn queue_and_sink_agree_on_overflow() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<4> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let sink = Collect::default();
        let mut rx = Receiver::new(
            timing(),
            line.rx_pin(),
            line.edge(),
            line.timer(),
            producer,
            sink.clone(),
        );

        for &b in b"ABCD" {
            line.send_frame(&mut rx, b, true, BIT);
        }

        let queued: Vec<u8> = consumer.by_ref().collect();
        assert_eq!(queued, b"ABC");
        assert_eq!(*sink.0.borrow(), queued);
        assert!(consumer.take_overflow());
    }

    #[test]
    fn framing_policy_from_config() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let config = Config::new().framing(FramingPolicy::Lenient);
        let mut rx = Receiver::from_config(
            &config,
            line.rx_pin(),
            line.edge(),
            line.timer(),
            producer,
            (),
        )
        .unwrap();

        assert_eq!(rx.timing(), &config.timing().unwrap());
        line.send_frame(&mut rx, 0x3C, false, BIT);
        assert_eq!(consumer.pop(), Some(0x3C));
        assert_eq!(consumer.framing_errors(), 1);
    }

    #[test]
    fn from_config_rejects_bad_timing() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, _consumer) = queue.split();
        let config = Config::new().baud_rate(0);

        let rx = Receiver::from_config(&config, line.rx_pin(), line.edge(), line.timer(), producer, ());
        assert_eq!(rx.err(), Some(TimingError::ZeroBaudRate));
        assert!(!line.edge_enabled());
    }

    #[test]
    fn edge_outside_idle_is_noop() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, _consumer) = queue.split();
        let mut rx = Receiver::new(timing(), line.rx_pin(), line.edge(), line.timer(), producer, ());

        // Start bit, then into bit 2 of an all-zero byte
        line.drive(false);
        line.run(&mut rx, BIT * 3);
        let state = rx.state();
        assert_eq!(
            state,
            RxState::DataBits {
                pending: 0,
                index: 2
            }
        );
        let (compare, start) = (line.compare(), line.counter_start());

        rx.on_edge();
        assert_eq!(rx.state(), state);
        assert_eq!(line.compare(), compare);
        assert_eq!(line.counter_start(), start);
        assert!(!line.edge_enabled());
        assert!(line.compare_enabled());

        // Run on to the stop bit wait
        line.run(&mut rx, BIT * 6);
        assert_eq!(rx.state(), RxState::StopBitWait { pending: 0 });
        rx.on_edge();
        assert_eq!(rx.state(), RxState::StopBitWait { pending: 0 });
        assert!(!line.edge_enabled());
    }

    #[test]
    fn spurious_compare_rearms() {
        let line = Line::new(16_000_000);
        let mut queue: ByteQueue<8> = ByteQueue::new();
        let (producer, mut consumer) = queue.split();
        let mut rx = Receiver::new(timing(), line.rx_pin(), line.edge(), line.timer(), producer, ());

        rx.on_compare();
        assert_eq!(rx.state(), RxState::Idle);
        assert!(line.edge_enabled());
        assert!(!line.compare_enabled());
        assert_eq!(consumer.pop(), None);
    }
}
