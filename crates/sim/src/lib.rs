// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Host simulation of a USART running as synchronous master, wired to a
//! model SPI slave and driven by the real transfer engines.

use syncspi_config::{ConfigError, LinkManifest, SlaveKind};
use syncspi_core::{Event, ReceiveEngine, Role, TransmitEngine, BUFFER_SIZE};

pub mod capture;
pub mod harness;
pub mod metrics;
pub mod slave;
pub mod snapshot;
pub mod usart;
pub mod vector;

pub use capture::CycleCapture;
pub use harness::{LinkObserver, RunSummary, Simulation, StopCondition, StopReason};
pub use metrics::LinkMetrics;
pub use slave::{LoopbackSlave, PatternSlave, SilentSlave, SlaveDevice};
pub use snapshot::LinkSnapshot;
pub use usart::{SimUsart, UsartCounters};
pub use vector::VectorTable;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("No handler registered for {0}")]
    MissingHandler(Event),
    #[error("A handler for {0} is already registered")]
    HandlerAlreadyRegistered(Event),
    #[error("Handler services {actual} and cannot be installed for {slot}")]
    HandlerEventMismatch { slot: Event, actual: Event },
    #[error("Port must be disabled before it is reconfigured")]
    ConfigureWhileEnabled,
    #[error("Baud rate {baud_rate} Hz is not reachable from a {peripheral_clock_hz} Hz clock")]
    UnreachableBaudRate {
        baud_rate: u32,
        peripheral_clock_hz: u32,
    },
    #[error("Role {0:?} is not simulated")]
    UnsupportedRole(Role),
    #[error("Simulation has not been booted")]
    NotBooted,
    #[error("Invalid link manifest: {0}")]
    Config(#[from] ConfigError),
}

pub type SimResult<T> = Result<T, SimError>;

/// Build a ready-to-boot simulation from a link manifest: port, slave and
/// both engines installed in the vector table.
pub fn from_manifest(manifest: &LinkManifest) -> SimResult<Simulation> {
    manifest.validate()?;
    let pattern = manifest.transmit_pattern()?;

    let slave: Box<dyn SlaveDevice> = match manifest.slave.kind {
        SlaveKind::Pattern => Box::new(PatternSlave::new(
            manifest.slave.replies.clone(),
            manifest.slave.bit_order,
        )),
        SlaveKind::Loopback => Box::new(LoopbackSlave::new()),
        SlaveKind::Silent => Box::new(SilentSlave),
    };

    let port = SimUsart::new(manifest.usart.peripheral_clock_hz, slave);
    let mut sim = Simulation::new(port, manifest.usart.sync_config());
    sim.vectors_mut().register_handler(
        Event::TransmitReady,
        Box::new(TransmitEngine::new(pattern)),
    )?;
    sim.vectors_mut().register_handler(
        Event::DataAvailable,
        Box::new(ReceiveEngine::<BUFFER_SIZE>::new()),
    )?;

    tracing::info!(
        "Built link '{}': {} Hz requested, {} slave",
        manifest.name,
        manifest.usart.baud_rate,
        sim.port().slave().name()
    );
    Ok(sim)
}
