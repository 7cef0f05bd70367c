// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Transfer engines for a USART block running as a synchronous (SPI) master.
//!
//! The crate holds the whole transfer protocol: two independent ring-index
//! state machines, one advanced by the "transmit buffer empty" event and one
//! by the "receive data valid" event. Everything hardware specific sits
//! behind [`SyncSerial`], so the same engines run inside the target's
//! interrupt handlers and inside the host simulation.
//!
//! The crate is `no_std` and never allocates.

#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod engine;
pub mod peripheral;
pub mod setup;

pub use buffer::{Progress, TransferBuffer};
pub use engine::{EventHandler, ReceiveEngine, TransmitEngine};
pub use peripheral::{
    sync_baud_rate, sync_clock_divider, BitOrder, ClockMode, ClockPhase, ClockPolarity, Event,
    EventSet, Role, SyncConfig, SyncSerial,
};
pub use setup::init_master;

/// Number of bytes exchanged per protocol cycle.
pub const BUFFER_SIZE: usize = 10;

/// Bytes the master clocks out, repeated forever.
pub const TX_PATTERN: [u8; BUFFER_SIZE] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09,
];
