// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Behavioural model of a series-1 USART in synchronous master mode.
//!
//! One transmit holding slot feeds an 8-bit shift register; one receive slot
//! takes the byte sampled during each frame. A [`SimUsart::tick`] is one bit
//! clock, so a frame occupies eight ticks. Frames run back to back for as
//! long as the holding slot is refilled before the shifter drains.

use crate::slave::{SlaveDevice, IDLE_LINE};
use crate::{SimError, SimResult};
use serde::{Serialize, Serializer};
use std::sync::{Arc, Mutex};
use syncspi_core::{
    sync_baud_rate, sync_clock_divider, Event, EventSet, Role, SyncConfig, SyncSerial,
};

pub const FRAME_BITS: u8 = 8;

/// Error conditions the hardware would flag in `IF` (`TXOF`, `RXOF`, `RXUF`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsartCounters {
    pub frames: u64,
    /// Writes to a full transmit slot. The written byte is lost.
    pub tx_overflows: u64,
    /// Frames completed while the receive slot was still full. The new byte is lost.
    pub rx_overruns: u64,
    /// Reads from an empty receive slot.
    pub rx_underflows: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Shift {
    data: u8,
    bits: u8,
}

fn serialize_events<S: Serializer>(set: &EventSet, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(set.events())
}

#[derive(Debug, Serialize)]
pub struct SimUsart {
    config: SyncConfig,
    peripheral_clock_hz: u32,
    clkdiv: Option<u32>,
    enabled: bool,
    #[serde(serialize_with = "serialize_events")]
    armed: EventSet,
    tx_slot: Option<u8>,
    shifter: Option<Shift>,
    rx_slot: Option<u8>,
    chip_select: bool,
    counters: UsartCounters,
    #[serde(skip)]
    slave: Box<dyn SlaveDevice>,
    #[serde(skip)]
    mosi_sink: Option<Arc<Mutex<Vec<u8>>>>,
}

impl SimUsart {
    pub fn new(peripheral_clock_hz: u32, slave: Box<dyn SlaveDevice>) -> Self {
        Self {
            config: SyncConfig::default(),
            peripheral_clock_hz,
            clkdiv: None,
            enabled: false,
            armed: EventSet::empty(),
            tx_slot: None,
            shifter: None,
            rx_slot: None,
            chip_select: false,
            counters: UsartCounters::default(),
            slave,
            mosi_sink: None,
        }
    }

    /// Collect every byte that completes a frame, as written by the master.
    pub fn set_mosi_sink(&mut self, sink: Option<Arc<Mutex<Vec<u8>>>>) {
        self.mosi_sink = sink;
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn armed(&self) -> EventSet {
        self.armed
    }

    /// `CLKDIV` programmed by the last successful configuration.
    pub fn clock_divider(&self) -> Option<u32> {
        self.clkdiv
    }

    /// Bit clock actually produced, which may be below the requested rate.
    pub fn achieved_baud_rate(&self) -> Option<u32> {
        self.clkdiv.map(|div| sync_baud_rate(self.peripheral_clock_hz, div))
    }

    pub fn counters(&self) -> UsartCounters {
        self.counters
    }

    pub fn chip_select_asserted(&self) -> bool {
        self.chip_select
    }

    /// A frame is being shifted out.
    pub fn is_busy(&self) -> bool {
        self.shifter.is_some()
    }

    pub fn slave(&self) -> &dyn SlaveDevice {
        self.slave.as_ref()
    }

    /// Raw interrupt flags, armed or not.
    pub fn flags(&self) -> EventSet {
        let mut flags = EventSet::empty();
        if self.enabled && self.tx_slot.is_none() {
            flags |= EventSet::TRANSMIT_READY;
        }
        if self.rx_slot.is_some() {
            flags |= EventSet::DATA_AVAILABLE;
        }
        flags
    }

    /// Flags that are both raised and armed, i.e. would interrupt the core.
    pub fn pending_events(&self) -> EventSet {
        self.flags() & self.armed
    }

    /// Advance one bit clock.
    pub fn tick(&mut self) {
        if !self.enabled {
            return;
        }
        if self.shifter.is_none() {
            self.load_shifter();
        }
        let Some(shift) = self.shifter.as_mut() else {
            return;
        };
        shift.bits += 1;
        if shift.bits == FRAME_BITS {
            self.finish_frame();
        }
    }

    fn load_shifter(&mut self) {
        let Some(data) = self.tx_slot.take() else {
            return;
        };
        if self.config.auto_chip_select && !self.chip_select {
            self.chip_select = true;
            self.slave.select();
        }
        self.shifter = Some(Shift { data, bits: 0 });
    }

    fn finish_frame(&mut self) {
        let Some(shift) = self.shifter.take() else {
            return;
        };
        let order = self.config.bit_order;
        let miso = if self.chip_select {
            self.slave.exchange(order.to_wire(shift.data))
        } else {
            IDLE_LINE
        };
        let received = order.from_wire(miso);
        self.counters.frames += 1;

        if self.rx_slot.is_some() {
            self.counters.rx_overruns += 1;
            tracing::warn!(
                "RX overrun on frame {}: {:#04x} dropped",
                self.counters.frames,
                received
            );
        } else {
            self.rx_slot = Some(received);
        }

        if let Some(sink) = &self.mosi_sink {
            if let Ok(mut guard) = sink.lock() {
                guard.push(shift.data);
            }
        }

        self.load_shifter();
        if self.shifter.is_none() && self.chip_select && self.config.auto_chip_select {
            self.chip_select = false;
            self.slave.deselect();
        }
    }

    pub fn snapshot(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "slave".to_string(),
                serde_json::json!({
                    "name": self.slave.name(),
                    "state": self.slave.snapshot(),
                }),
            );
        }
        value
    }
}

impl SyncSerial for SimUsart {
    type Error = SimError;

    fn configure_synchronous(&mut self, config: &SyncConfig) -> SimResult<()> {
        if self.enabled {
            return Err(SimError::ConfigureWhileEnabled);
        }
        if config.role != Role::Master {
            return Err(SimError::UnsupportedRole(config.role));
        }
        let clkdiv = sync_clock_divider(self.peripheral_clock_hz, config.baud_rate).ok_or(
            SimError::UnreachableBaudRate {
                baud_rate: config.baud_rate,
                peripheral_clock_hz: self.peripheral_clock_hz,
            },
        )?;
        self.config = *config;
        self.clkdiv = Some(clkdiv);
        tracing::debug!(
            "USART configured: {:?}, requested {} Hz, CLKDIV {:#x} -> {} Hz",
            config.clock_mode(),
            config.baud_rate,
            clkdiv,
            sync_baud_rate(self.peripheral_clock_hz, clkdiv)
        );
        Ok(())
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn arm_event(&mut self, event: Event) {
        self.armed |= event.flag();
    }

    fn send_byte(&mut self, value: u8) {
        if self.tx_slot.is_some() {
            self.counters.tx_overflows += 1;
            tracing::warn!("TX overflow: {:#04x} written to a full slot", value);
            return;
        }
        self.tx_slot = Some(value);
    }

    fn receive_byte(&mut self) -> u8 {
        match self.rx_slot.take() {
            Some(byte) => byte,
            None => {
                self.counters.rx_underflows += 1;
                tracing::warn!("RX underflow: read from an empty slot");
                0x00
            }
        }
    }
}
