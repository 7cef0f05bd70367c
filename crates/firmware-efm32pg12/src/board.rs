// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Clock gating and pin setup for the USART2 SPI pins on port A.

use syncspi_core::{ClockPolarity, SyncConfig};

const CMU_BASE: u32 = 0x400E_4000;
const CMU_HFBUSCLKEN0: u32 = 0x0B0;
const CMU_HFPERCLKEN0: u32 = 0x0C0;
const HFBUSCLKEN0_GPIO: u32 = 1 << 3;
const HFPERCLKEN0_USART2: u32 = 1 << 6;

const GPIO_PA_BASE: u32 = 0x4000_A000;
const GPIO_MODEL: u32 = 0x004;
const GPIO_MODEH: u32 = 0x008;
const GPIO_DOUT: u32 = 0x00C;

const MODE_INPUT: u32 = 0x1;
const MODE_PUSHPULL: u32 = 0x4;

const PIN_MOSI: u32 = 6;
const PIN_MISO: u32 = 7;
const PIN_CLK: u32 = 8;
const PIN_CS: u32 = 9;

fn modify(addr: u32, f: impl FnOnce(u32) -> u32) {
    unsafe {
        let ptr = addr as *mut u32;
        core::ptr::write_volatile(ptr, f(core::ptr::read_volatile(ptr)));
    }
}

pub fn enable_clocks() {
    modify(CMU_BASE + CMU_HFBUSCLKEN0, |v| v | HFBUSCLKEN0_GPIO);
    modify(CMU_BASE + CMU_HFPERCLKEN0, |v| v | HFPERCLKEN0_USART2);
}

fn set_mode(pin: u32, mode: u32) {
    let (reg, shift) = if pin < 8 {
        (GPIO_MODEL, pin * 4)
    } else {
        (GPIO_MODEH, (pin - 8) * 4)
    };
    modify(GPIO_PA_BASE + reg, |v| (v & !(0xF << shift)) | (mode << shift));
}

fn set_output(pin: u32, high: bool) {
    modify(GPIO_PA_BASE + GPIO_DOUT, |v| {
        if high {
            v | (1 << pin)
        } else {
            v & !(1 << pin)
        }
    });
}

/// Drive idle levels first so the pins come up without glitching: MOSI and
/// CS high, CLK at the configured polarity.
pub fn configure_pins(config: &SyncConfig) {
    set_output(PIN_MOSI, true);
    set_output(PIN_CS, true);
    set_output(PIN_CLK, config.clock_polarity == ClockPolarity::IdleHigh);

    set_mode(PIN_MOSI, MODE_PUSHPULL);
    set_mode(PIN_MISO, MODE_INPUT);
    set_mode(PIN_CLK, MODE_PUSHPULL);
    set_mode(PIN_CS, MODE_PUSHPULL);
}
