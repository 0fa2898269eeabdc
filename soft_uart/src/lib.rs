//! A software UART for pins without UART hardware.
//!
//! Transmission toggles an output pin with busy-wait delays. Reception is
//! driven by two interrupts: a pin-change interrupt that catches the falling
//! edge of a start bit, and a clear-on-compare timer that samples every
//! following bit at its midpoint. Received bytes cross from interrupt
//! context to task context through a lock-free [`ByteQueue`].
//!
//! The wire format is fixed 8N1: one start bit (low), eight data bits least
//! significant first, one stop bit (high), no parity.
//!
//! # Wiring it up
//!
//! ```ignore
//! static QUEUE: StaticCell<ByteQueue<RX_BUFFER_SIZE>> = StaticCell::new();
//!
//! let config = soft_uart::Config::new().baud_rate(9600);
//! let timing = config.timing().expect("invalid soft UART timing");
//!
//! let (producer, mut consumer) = QUEUE.init(ByteQueue::new()).split();
//! let receiver = Receiver::from_config(&config, rx_pin, pcint, timer1, producer, ())
//!     .expect("invalid soft UART timing");
//! // Move `receiver` somewhere the PCINT and TIMER1_COMPA vectors can reach
//! // it, and call `on_edge` / `on_compare` from them.
//!
//! let mut tx = Transmitter::new(tx_pin, delay, GlobalMask::new(), &timing)?;
//! tx.transmit(b"AT\r\n")?;
//!
//! while let Some(byte) = consumer.pop() {
//!     // ...
//! }
//! ```
//!
//! # Optional Cargo Features
//!
//! - **`log`**: log through the [`log`](https://docs.rs/log) facade.
//! - **`defmt`**: log through [`defmt`](https://docs.rs/defmt).
//! - **`sim`**: build the [`sim`] module, a cycle level line simulator for
//!   host side tests.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod config;
mod error;
mod queue;
mod rx;
mod timing;
mod tx;

pub mod hal;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use config::{Config, FramingPolicy, DEFAULT_BAUD_RATE, DEFAULT_CLOCK_HZ, RX_BUFFER_SIZE};
pub use error::Error;
pub use hal::{ByteSink, CompareTimer, EdgeDetect, GlobalMask, RxIsr, RxMask};
pub use queue::{ByteConsumer, ByteProducer, ByteQueue};
pub use rx::{Receiver, RxState, Step};
pub use timing::{BitTiming, TimingError};
pub use tx::Transmitter;
