//! Line based AT response dispatching on top of [`soft_uart`].
//!
//! Received bytes are assembled into lines by a [`LineAssembler`], and every
//! complete line is routed by an [`AtMaster`] to the first registered command
//! whose header prefixes it. Commands and result codes go out through a
//! [`Sender`] wrapping any [`embedded_io::Write`], typically a
//! [`soft_uart::Transmitter`].
//!
//! ```
//! use at_master::{AtMaster, Config, Ingress, Matched};
//! use core::cell::Cell;
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Owner {
//!     Network,
//!     Console,
//! }
//!
//! let last = Cell::new(None);
//! let handler = |m: Matched<Owner>, _line: &[u8]| last.set(Some(m.owner));
//!
//! let mut master: AtMaster<'_, Owner, 4> = AtMaster::new();
//! master.register(b"+CREG", 16, Owner::Network, &handler).unwrap();
//! // Catch-all, registered last
//! master.register(b"", 64, Owner::Console, &handler).unwrap();
//!
//! let mut ingress: Ingress<'_, '_, Owner, 4, 128> = Ingress::new(&master, Config::default());
//! ingress.write(b"\r\n+CREG: 0,1\r\n");
//! assert_eq!(last.get(), Some(Owner::Network));
//!
//! ingress.write(b"RING\r\n");
//! assert_eq!(last.get(), Some(Owner::Console));
//! ```
//!
//! # Optional Cargo Features
//!
//! - **`log`**: log through the [`log`](https://docs.rs/log) facade.
//! - **`defmt`**: log through [`defmt`](https://docs.rs/defmt).

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod command;
mod config;
mod error;
mod ingress;
mod line;
mod master;
mod sender;

pub mod helpers;

pub use command::{AtCommand, CommandId, Matched, ResponseHandler};
pub use config::{Config, COMMAND_TERM, LINE_BUF_SIZE};
pub use error::Error;
pub use ingress::Ingress;
pub use line::LineAssembler;
pub use master::AtMaster;
pub use sender::{Sender, RESPONSE_ERROR, RESPONSE_OK};
