// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Transmit and receive engines.
//!
//! Each engine owns one [`TransferBuffer`] and is advanced by exactly one
//! hardware event. The engines share nothing, so they need no locking as
//! long as each one is only ever touched by its own handler.

use crate::buffer::{Progress, TransferBuffer};
use crate::peripheral::{Event, SyncSerial};
use crate::{BUFFER_SIZE, TX_PATTERN};

/// Something that can be installed as the handler for one [`Event`].
pub trait EventHandler<P: SyncSerial + ?Sized> {
    /// The event this handler services.
    fn event(&self) -> Event;

    /// Service one occurrence of the event. Runs to completion.
    fn handle(&mut self, port: &mut P) -> Progress;

    /// Current buffer contents.
    fn buffer(&self) -> &[u8];

    /// Index of the slot the next event will use.
    fn cursor(&self) -> usize;
}

/// Clocks a fixed byte sequence out, one byte per "transmit ready" event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitEngine<const N: usize> {
    buffer: TransferBuffer<N>,
}

impl<const N: usize> TransmitEngine<N> {
    pub const fn new(pattern: [u8; N]) -> Self {
        Self {
            buffer: TransferBuffer::new(pattern),
        }
    }

    /// Send the byte at the cursor and step to the next one.
    ///
    /// Must only run when the port's transmit slot has room; nothing is
    /// checked here.
    #[inline]
    pub fn on_transmit_ready<P: SyncSerial + ?Sized>(&mut self, port: &mut P) -> Progress {
        port.send_byte(self.buffer.current());
        self.buffer.advance()
    }

    pub fn transfer_buffer(&self) -> &TransferBuffer<N> {
        &self.buffer
    }
}

impl Default for TransmitEngine<BUFFER_SIZE> {
    fn default() -> Self {
        Self::new(TX_PATTERN)
    }
}

impl<P: SyncSerial + ?Sized, const N: usize> EventHandler<P> for TransmitEngine<N> {
    fn event(&self) -> Event {
        Event::TransmitReady
    }

    fn handle(&mut self, port: &mut P) -> Progress {
        self.on_transmit_ready(port)
    }

    fn buffer(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    fn cursor(&self) -> usize {
        self.buffer.cursor()
    }
}

/// Captures incoming bytes into a fixed buffer, one per "data available" event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveEngine<const N: usize> {
    buffer: TransferBuffer<N>,
}

impl<const N: usize> ReceiveEngine<N> {
    pub const fn new() -> Self {
        Self {
            buffer: TransferBuffer::zeroed(),
        }
    }

    /// Read one byte from the port into the slot at the cursor.
    ///
    /// [`Progress::Wrapped`] means the buffer now holds one complete cycle.
    /// Must only run when the port actually holds a received byte.
    #[inline]
    pub fn on_data_available<P: SyncSerial + ?Sized>(&mut self, port: &mut P) -> Progress {
        let byte = port.receive_byte();
        self.buffer.store(byte);
        self.buffer.advance()
    }

    pub fn contents(&self) -> &[u8; N] {
        self.buffer.as_array()
    }

    pub fn transfer_buffer(&self) -> &TransferBuffer<N> {
        &self.buffer
    }
}

impl<const N: usize> Default for ReceiveEngine<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SyncSerial + ?Sized, const N: usize> EventHandler<P> for ReceiveEngine<N> {
    fn event(&self) -> Event {
        Event::DataAvailable
    }

    fn handle(&mut self, port: &mut P) -> Progress {
        self.on_data_available(port)
    }

    fn buffer(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    fn cursor(&self) -> usize {
        self.buffer.cursor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripheral::SyncConfig;
    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    struct ScriptedPort {
        sent: Vec<u8>,
        inbound: VecDeque<u8>,
    }

    impl SyncSerial for ScriptedPort {
        type Error = ();

        fn configure_synchronous(&mut self, _config: &SyncConfig) -> Result<(), ()> {
            Ok(())
        }

        fn enable(&mut self) {}

        fn arm_event(&mut self, _event: Event) {}

        fn send_byte(&mut self, value: u8) {
            self.sent.push(value);
        }

        fn receive_byte(&mut self) -> u8 {
            self.inbound.pop_front().unwrap()
        }
    }

    #[test]
    fn test_transmit_sends_pattern_in_order_and_wraps() {
        let mut port = ScriptedPort::default();
        let mut tx = TransmitEngine::new([0x10, 0x20, 0x30]);

        assert_eq!(tx.on_transmit_ready(&mut port), Progress::Advanced);
        assert_eq!(tx.on_transmit_ready(&mut port), Progress::Advanced);
        assert_eq!(tx.on_transmit_ready(&mut port), Progress::Wrapped);
        assert_eq!(port.sent, vec![0x10, 0x20, 0x30]);
        assert_eq!(tx.transfer_buffer().cursor(), 0);
    }

    #[test]
    fn test_receive_fills_buffer_and_wraps() {
        let mut port = ScriptedPort {
            inbound: VecDeque::from(vec![0xA0, 0xA1, 0xA2]),
            ..Default::default()
        };
        let mut rx = ReceiveEngine::<3>::new();

        assert_eq!(rx.on_data_available(&mut port), Progress::Advanced);
        assert_eq!(rx.contents(), &[0xA0, 0x00, 0x00]);
        assert_eq!(rx.on_data_available(&mut port), Progress::Advanced);
        assert_eq!(rx.on_data_available(&mut port), Progress::Wrapped);
        assert_eq!(rx.contents(), &[0xA0, 0xA1, 0xA2]);
        assert_eq!(rx.transfer_buffer().cursor(), 0);
    }

    #[test]
    fn test_receive_overwrites_previous_cycle() {
        let mut port = ScriptedPort {
            inbound: VecDeque::from(vec![1, 2, 3, 4]),
            ..Default::default()
        };
        let mut rx = ReceiveEngine::<2>::new();
        for _ in 0..3 {
            rx.on_data_available(&mut port);
        }
        assert_eq!(rx.contents(), &[3, 2]);
        assert_eq!(rx.transfer_buffer().cursor(), 1);
    }

    #[test]
    fn test_default_transmit_engine_uses_demo_pattern() {
        let tx = TransmitEngine::<BUFFER_SIZE>::default();
        assert_eq!(tx.transfer_buffer().as_array(), &TX_PATTERN);
    }

    #[test]
    fn test_engines_through_handler_trait() {
        let mut port = ScriptedPort {
            inbound: VecDeque::from(vec![0x55]),
            ..Default::default()
        };
        let mut tx = TransmitEngine::new([0x01, 0x02]);
        let mut rx = ReceiveEngine::<2>::new();

        let handlers: [&mut dyn EventHandler<ScriptedPort>; 2] = [&mut tx, &mut rx];
        let mut events = Vec::new();
        for h in handlers {
            events.push(h.event());
            h.handle(&mut port);
            assert_eq!(h.cursor(), 1);
        }

        assert_eq!(events, vec![Event::TransmitReady, Event::DataAvailable]);
        assert_eq!(port.sent, vec![0x01]);
        assert_eq!(EventHandler::<ScriptedPort>::buffer(&rx), &[0x55, 0x00]);
    }
}
