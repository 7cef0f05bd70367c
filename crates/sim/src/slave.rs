// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Devices on the far side of the link.
//!
//! All exchanges are in wire order: bit 7 of the value is the first bit
//! clocked on the line, whatever bit order either end uses.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use syncspi_core::{BitOrder, BUFFER_SIZE};

/// Level of an undriven MISO line (pulled up).
pub const IDLE_LINE: u8 = 0xFF;

/// Bytes a [`PatternSlave`] keeps of what it received, newest last.
pub const RECEIVED_HISTORY: usize = BUFFER_SIZE;

pub trait SlaveDevice: fmt::Debug + Send {
    fn name(&self) -> &'static str;

    /// Chip select asserted.
    fn select(&mut self) {}

    /// Chip select released.
    fn deselect(&mut self) {}

    /// Clock one full frame: takes the MOSI bits, returns the MISO bits.
    /// Only called while selected.
    fn exchange(&mut self, mosi: u8) -> u8;

    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Answers each frame with the next entry of a reply table, wrapping at the
/// end, and keeps the last [`RECEIVED_HISTORY`] bytes it received.
#[derive(Debug, Clone, Serialize)]
pub struct PatternSlave {
    replies: Vec<u8>,
    next: usize,
    bit_order: BitOrder,
    selected: bool,
    received: VecDeque<u8>,
}

impl PatternSlave {
    /// An empty reply table makes the slave answer with the idle level.
    pub fn new(replies: Vec<u8>, bit_order: BitOrder) -> Self {
        Self {
            replies,
            next: 0,
            bit_order,
            selected: false,
            received: VecDeque::with_capacity(RECEIVED_HISTORY),
        }
    }

    /// Most recent bytes received, oldest first, decoded with this slave's
    /// bit order.
    pub fn received(&self) -> Vec<u8> {
        self.received.iter().copied().collect()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

impl SlaveDevice for PatternSlave {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn select(&mut self) {
        self.selected = true;
    }

    fn deselect(&mut self) {
        self.selected = false;
    }

    fn exchange(&mut self, mosi: u8) -> u8 {
        if self.received.len() == RECEIVED_HISTORY {
            self.received.pop_front();
        }
        self.received.push_back(self.bit_order.from_wire(mosi));
        let Some(&reply) = self.replies.get(self.next) else {
            return IDLE_LINE;
        };
        self.next = (self.next + 1) % self.replies.len();
        self.bit_order.to_wire(reply)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// MISO jumpered straight to MOSI.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoopbackSlave {
    frames: u64,
}

impl LoopbackSlave {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlaveDevice for LoopbackSlave {
    fn name(&self) -> &'static str {
        "loopback"
    }

    fn exchange(&mut self, mosi: u8) -> u8 {
        self.frames += 1;
        mosi
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Nothing attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSlave;

impl SlaveDevice for SilentSlave {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn exchange(&mut self, _mosi: u8) -> u8 {
        IDLE_LINE
    }
}
