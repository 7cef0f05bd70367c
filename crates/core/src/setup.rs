// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripheral::{Event, Role, SyncConfig, SyncSerial};

/// Bring a port up as synchronous master with both transfer events armed.
///
/// The port is configured while disabled and enabled last, after both event
/// sources are unmasked. From then on the transfer sustains itself: every
/// byte sent provokes one reply, and the transmit event fires again whenever
/// the outbound slot drains.
pub fn init_master<P: SyncSerial + ?Sized>(
    port: &mut P,
    config: &SyncConfig,
) -> Result<(), P::Error> {
    let config = SyncConfig {
        role: Role::Master,
        ..*config
    };
    port.configure_synchronous(&config)?;
    port.arm_event(Event::TransmitReady);
    port.arm_event(Event::DataAvailable);
    port.enable();
    Ok(())
}
