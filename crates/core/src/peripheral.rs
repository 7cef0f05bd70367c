// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Capability set the transfer engines consume from a synchronous serial port.

use bitflags::bitflags;
use core::fmt;

/// Hardware conditions the engines react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Event {
    /// The outbound data slot has room for one more byte.
    TransmitReady,
    /// One inbound byte has arrived and is ready to read.
    DataAvailable,
}

impl Event {
    pub const ALL: [Event; 2] = [Event::TransmitReady, Event::DataAvailable];

    pub fn flag(self) -> EventSet {
        match self {
            Event::TransmitReady => EventSet::TRANSMIT_READY,
            Event::DataAvailable => EventSet::DATA_AVAILABLE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Event::TransmitReady => "transmit_ready",
            Event::DataAvailable => "data_available",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of [`Event`]s. Bit positions follow the series-1 USART `IF`/`IEN`
    /// layout (TXBL = bit 1, RXDATAV = bit 2).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventSet: u32 {
        const TRANSMIT_READY = 1 << 1;
        const DATA_AVAILABLE = 1 << 2;
    }
}

impl EventSet {
    /// Iterate the contained events in the order of [`Event::ALL`].
    pub fn events(self) -> impl Iterator<Item = Event> {
        Event::ALL.into_iter().filter(move |e| self.contains(e.flag()))
    }
}

impl From<Event> for EventSet {
    fn from(event: Event) -> Self {
        event.flag()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Role {
    /// Drives the clock and starts every exchange.
    #[default]
    Master,
    Slave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ClockPolarity {
    #[default]
    IdleLow,
    IdleHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ClockPhase {
    /// Sample on the leading (first) clock edge.
    #[default]
    SampleLeading,
    /// Sample on the trailing (second) clock edge.
    SampleTrailing,
}

/// The four classic SPI modes, as a shorthand for polarity + phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ClockMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl ClockMode {
    pub fn from_parts(polarity: ClockPolarity, phase: ClockPhase) -> Self {
        match (polarity, phase) {
            (ClockPolarity::IdleLow, ClockPhase::SampleLeading) => ClockMode::Mode0,
            (ClockPolarity::IdleLow, ClockPhase::SampleTrailing) => ClockMode::Mode1,
            (ClockPolarity::IdleHigh, ClockPhase::SampleLeading) => ClockMode::Mode2,
            (ClockPolarity::IdleHigh, ClockPhase::SampleTrailing) => ClockMode::Mode3,
        }
    }

    pub fn polarity(self) -> ClockPolarity {
        match self {
            ClockMode::Mode0 | ClockMode::Mode1 => ClockPolarity::IdleLow,
            ClockMode::Mode2 | ClockMode::Mode3 => ClockPolarity::IdleHigh,
        }
    }

    pub fn phase(self) -> ClockPhase {
        match self {
            ClockMode::Mode0 | ClockMode::Mode2 => ClockPhase::SampleLeading,
            ClockMode::Mode1 | ClockMode::Mode3 => ClockPhase::SampleTrailing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitOrder {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "msb", alias = "msb_first"))]
    MsbFirst,
    #[cfg_attr(feature = "serde", serde(rename = "lsb", alias = "lsb_first"))]
    LsbFirst,
}

impl BitOrder {
    /// Bit pattern as it appears on the data line, first bit in the MSB.
    #[inline]
    pub fn to_wire(self, byte: u8) -> u8 {
        match self {
            BitOrder::MsbFirst => byte,
            BitOrder::LsbFirst => byte.reverse_bits(),
        }
    }

    /// Inverse of [`BitOrder::to_wire`] for a receiver using this order.
    #[inline]
    pub fn from_wire(self, wire: u8) -> u8 {
        // Bit reversal is its own inverse.
        self.to_wire(wire)
    }
}

/// Synchronous-mode line settings handed to [`SyncSerial::configure_synchronous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncConfig {
    pub role: Role,
    /// Requested bit clock in Hz.
    pub baud_rate: u32,
    pub clock_polarity: ClockPolarity,
    pub clock_phase: ClockPhase,
    pub bit_order: BitOrder,
    /// Let the peripheral drive chip select around each transfer.
    pub auto_chip_select: bool,
}

impl SyncConfig {
    /// 1 MHz, mode 0, MSB first, hardware chip select.
    pub const DEFAULT: SyncConfig = SyncConfig {
        role: Role::Master,
        baud_rate: 1_000_000,
        clock_polarity: ClockPolarity::IdleLow,
        clock_phase: ClockPhase::SampleLeading,
        bit_order: BitOrder::MsbFirst,
        auto_chip_select: true,
    };

    pub const fn master(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::DEFAULT
        }
    }

    pub fn with_clock_mode(mut self, mode: ClockMode) -> Self {
        self.clock_polarity = mode.polarity();
        self.clock_phase = mode.phase();
        self
    }

    pub fn with_bit_order(mut self, order: BitOrder) -> Self {
        self.bit_order = order;
        self
    }

    pub fn with_auto_chip_select(mut self, enabled: bool) -> Self {
        self.auto_chip_select = enabled;
        self
    }

    pub fn clock_mode(&self) -> ClockMode {
        ClockMode::from_parts(self.clock_polarity, self.clock_phase)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A USART (or dedicated SPI block) able to run as a synchronous master.
///
/// `send_byte` and `receive_byte` are only called from the matching event
/// handler, so implementations may assume the data slot is ready. Calling
/// them at any other time is outside the contract.
pub trait SyncSerial {
    type Error;

    /// Apply line settings. The port stays disabled.
    fn configure_synchronous(&mut self, config: &SyncConfig) -> Result<(), Self::Error>;

    /// Turn on transmitter, receiver and (in master role) the clock.
    fn enable(&mut self);

    /// Unmask the interrupt source for `event`.
    fn arm_event(&mut self, event: Event);

    /// Queue one byte for transmission. Does not wait for it to leave.
    fn send_byte(&mut self, value: u8);

    /// Take one received byte out of the receive slot.
    fn receive_byte(&mut self) -> u8;
}

/// Largest value of the series-1 USART `CLKDIV` register (`DIV` field, bits 22:3).
pub const CLKDIV_MAX: u32 = 0x007F_FFF8;

/// `CLKDIV` for a synchronous bit clock of at most `baud` Hz.
///
/// Synchronous mode gives `baud = ref_hz / (2 * (1 + CLKDIV / 256))`. Only the
/// integral part of the divider is used and it is rounded up, so the achieved
/// rate never exceeds the request. Returns `None` if `baud` or `ref_hz` is
/// zero, or the divider does not fit the register.
pub fn sync_clock_divider(ref_hz: u32, baud: u32) -> Option<u32> {
    if baud == 0 || ref_hz == 0 {
        return None;
    }
    let div = u64::from(ref_hz).div_ceil(2 * u64::from(baud));
    let clkdiv = (div - 1) << 8;
    if clkdiv > u64::from(CLKDIV_MAX) {
        return None;
    }
    Some(clkdiv as u32)
}

/// Bit clock produced by `clkdiv` from a reference of `ref_hz`.
pub fn sync_baud_rate(ref_hz: u32, clkdiv: u32) -> u32 {
    let divisor = 2 * (256 + u64::from(clkdiv));
    ((u64::from(ref_hz) * 256) / divisor) as u32
}
