// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! USART2 as SPI master on EFM32PG12, fully interrupt driven.
//!
//! `main` only sets the port up; every byte afterwards is moved by the
//! USART2 TX/RX handlers. Put a breakpoint on the `nop` in `USART2_RX` to
//! inspect `RX_ENGINE` after each complete cycle (A0..A9 with the reference
//! slave attached).

#![no_std]
#![no_main]

mod board;
mod usart;

use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use panic_halt as _;
use syncspi_core::{init_master, ReceiveEngine, SyncConfig, TransmitEngine, BUFFER_SIZE, TX_PATTERN};

use usart::Usart2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
enum Irq {
    Usart2Rx = 39,
    Usart2Tx = 40,
}

// SAFETY: the numbers match the EFM32PG12 vector table.
unsafe impl cortex_m::interrupt::InterruptNumber for Irq {
    #[inline]
    fn number(self) -> u16 {
        self as u16
    }
}

// Each engine is only touched by its own handler.
static mut TX_ENGINE: TransmitEngine<BUFFER_SIZE> = TransmitEngine::new(TX_PATTERN);
static mut RX_ENGINE: ReceiveEngine<BUFFER_SIZE> = ReceiveEngine::new();

#[no_mangle]
pub unsafe extern "C" fn USART2_TX() {
    // SAFETY: USART2_TX does not preempt itself, so this is the only live
    // reference to TX_ENGINE.
    let engine = &mut *core::ptr::addr_of_mut!(TX_ENGINE);
    let mut port = Usart2::steal();
    // Writing TXDATA clears TXBL; the flag itself needs no acknowledge.
    engine.on_transmit_ready(&mut port);
}

#[no_mangle]
pub unsafe extern "C" fn USART2_RX() {
    // SAFETY: as above, RX_ENGINE belongs to this handler alone.
    let engine = &mut *core::ptr::addr_of_mut!(RX_ENGINE);
    let mut port = Usart2::steal();
    if engine.on_data_available(&mut port).is_wrapped() {
        cortex_m::asm::nop();
    }
}

pub union Vector {
    _handler: unsafe extern "C" fn(),
    _reserved: u32,
}

const RESERVED: Vector = Vector { _reserved: 0 };

#[link_section = ".vector_table.interrupts"]
#[no_mangle]
pub static __INTERRUPTS: [Vector; 41] = {
    let mut table = [RESERVED; 41];
    table[Irq::Usart2Rx as usize] = Vector {
        _handler: USART2_RX,
    };
    table[Irq::Usart2Tx as usize] = Vector {
        _handler: USART2_TX,
    };
    table
};

#[entry]
fn main() -> ! {
    let config = SyncConfig::DEFAULT;

    board::enable_clocks();
    board::configure_pins(&config);

    // SAFETY: both USART2 IRQs are masked until setup is done.
    let mut port = unsafe { Usart2::steal() };
    port.route_pins();

    if init_master(&mut port, &config).is_err() {
        cortex_m::asm::bkpt();
        loop {
            cortex_m::asm::wfi();
        }
    }

    NVIC::unpend(Irq::Usart2Rx);
    NVIC::unpend(Irq::Usart2Tx);
    unsafe {
        NVIC::unmask(Irq::Usart2Rx);
        NVIC::unmask(Irq::Usart2Tx);
    }

    loop {
        cortex_m::asm::wfi();
    }
}
