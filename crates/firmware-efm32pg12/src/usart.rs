// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! USART2 on EFM32PG12, driven at register level.

use syncspi_core::{
    sync_clock_divider, BitOrder, ClockPhase, ClockPolarity, Event, SyncConfig, SyncSerial,
};

const USART2_BASE: u32 = 0x4001_0800;

const USART_CTRL: u32 = 0x000;
const USART_FRAME: u32 = 0x004;
const USART_CMD: u32 = 0x00C;
const USART_CLKDIV: u32 = 0x014;
const USART_RXDATA: u32 = 0x01C;
const USART_TXDATA: u32 = 0x034;
const USART_IFC: u32 = 0x048;
const USART_IEN: u32 = 0x04C;
const USART_ROUTEPEN: u32 = 0x074;
const USART_ROUTELOC0: u32 = 0x078;

// CTRL
const CTRL_SYNC: u32 = 1 << 0;
const CTRL_CLKPOL: u32 = 1 << 8;
const CTRL_CLKPHA: u32 = 1 << 9;
const CTRL_MSBF: u32 = 1 << 10;
const CTRL_AUTOCS: u32 = 1 << 16;

// FRAME: 8 data bits, no parity, 1 stop bit (reset value).
const FRAME_8N1: u32 = 0x0000_1005;

// CMD
const CMD_RXEN: u32 = 1 << 0;
const CMD_RXDIS: u32 = 1 << 1;
const CMD_TXEN: u32 = 1 << 2;
const CMD_TXDIS: u32 = 1 << 3;
const CMD_MASTEREN: u32 = 1 << 4;
const CMD_MASTERDIS: u32 = 1 << 5;
const CMD_CLEARRX: u32 = 1 << 10;
const CMD_CLEARTX: u32 = 1 << 11;

const IFC_MASK: u32 = 0x0001_FFF9;

// ROUTEPEN
const ROUTEPEN_RXPEN: u32 = 1 << 0;
const ROUTEPEN_TXPEN: u32 = 1 << 1;
const ROUTEPEN_CSPEN: u32 = 1 << 2;
const ROUTEPEN_CLKPEN: u32 = 1 << 3;

/// Location 1 for every USART2 signal: TX=PA6, RX=PA7, CLK=PA8, CS=PA9.
const ROUTE_LOCATION: u32 = 1;

/// HFPERCLK after reset (HFRCO, 19 MHz band).
pub const HFPERCLK_HZ: u32 = 19_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreachableBaudRate(pub u32);

fn read(offset: u32) -> u32 {
    unsafe { core::ptr::read_volatile((USART2_BASE + offset) as *const u32) }
}

fn write(offset: u32, value: u32) {
    unsafe { core::ptr::write_volatile((USART2_BASE + offset) as *mut u32, value) }
}

/// Handle on the USART2 register block.
pub struct Usart2 {
    _private: (),
}

impl Usart2 {
    /// # Safety
    /// Callers must not issue conflicting register writes from different
    /// contexts. Setup runs before the IRQs are unmasked; afterwards the
    /// transmit handler only touches `TXDATA` and the receive handler only
    /// `RXDATA`.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }

    /// Connect the signals to their pins (location 1).
    pub fn route_pins(&mut self) {
        let loc = ROUTE_LOCATION;
        write(USART_ROUTELOC0, loc | (loc << 8) | (loc << 16) | (loc << 24));
        write(
            USART_ROUTEPEN,
            ROUTEPEN_RXPEN | ROUTEPEN_TXPEN | ROUTEPEN_CSPEN | ROUTEPEN_CLKPEN,
        );
    }
}

impl SyncSerial for Usart2 {
    type Error = UnreachableBaudRate;

    fn configure_synchronous(&mut self, config: &SyncConfig) -> Result<(), Self::Error> {
        let clkdiv = sync_clock_divider(HFPERCLK_HZ, config.baud_rate)
            .ok_or(UnreachableBaudRate(config.baud_rate))?;

        write(
            USART_CMD,
            CMD_RXDIS | CMD_TXDIS | CMD_MASTERDIS | CMD_CLEARRX | CMD_CLEARTX,
        );

        let mut ctrl = CTRL_SYNC;
        if config.clock_polarity == ClockPolarity::IdleHigh {
            ctrl |= CTRL_CLKPOL;
        }
        if config.clock_phase == ClockPhase::SampleTrailing {
            ctrl |= CTRL_CLKPHA;
        }
        if config.bit_order == BitOrder::MsbFirst {
            ctrl |= CTRL_MSBF;
        }
        if config.auto_chip_select {
            ctrl |= CTRL_AUTOCS;
        }
        write(USART_CTRL, ctrl);
        write(USART_FRAME, FRAME_8N1);
        write(USART_CLKDIV, clkdiv);
        write(USART_IFC, IFC_MASK);
        Ok(())
    }

    fn enable(&mut self) {
        write(USART_CMD, CMD_RXEN | CMD_TXEN | CMD_MASTEREN);
    }

    fn arm_event(&mut self, event: Event) {
        // EventSet bits follow the IEN layout.
        write(USART_IEN, read(USART_IEN) | event.flag().bits());
    }

    #[inline]
    fn send_byte(&mut self, value: u8) {
        write(USART_TXDATA, u32::from(value));
    }

    #[inline]
    fn receive_byte(&mut self) -> u8 {
        // Reading RXDATA pops the byte and clears RXDATAV.
        (read(USART_RXDATA) & 0xFF) as u8
    }
}
