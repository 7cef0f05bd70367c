// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::snapshot::{HandlerSnapshot, LinkSnapshot};
use crate::usart::SimUsart;
use crate::vector::VectorTable;
use crate::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use syncspi_config::LinkLimits;
use syncspi_core::{init_master, Event, EventSet, SyncConfig};

/// Order in which simultaneously pending events are serviced. On the target
/// the receive IRQ has the lower number and wins.
pub const DISPATCH_ORDER: [Event; 2] = [Event::DataAvailable, Event::TransmitReady];

/// Hooks into a running link.
pub trait LinkObserver: std::fmt::Debug + Send + Sync {
    fn on_run_start(&self) {}
    fn on_run_stop(&self, _reason: StopReason) {}
    fn on_event(&self, _event: Event, _tick: u64) {}
    /// A handler wrapped its cursor; `buffer` is its content at that point.
    fn on_cycle_complete(&self, _event: Event, _buffer: &[u8]) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCondition {
    /// Stop once this many further receive cycles have completed.
    pub rx_cycles: u64,
    /// Give up after this many bit clocks.
    pub max_ticks: u64,
}

impl StopCondition {
    pub fn rx_cycles(rx_cycles: u64) -> Self {
        Self {
            rx_cycles,
            ..Self::default()
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}

impl Default for StopCondition {
    fn default() -> Self {
        LinkLimits::default().into()
    }
}

impl From<LinkLimits> for StopCondition {
    fn from(limits: LinkLimits) -> Self {
        Self {
            rx_cycles: limits.rx_cycles,
            max_ticks: limits.max_ticks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    RxCyclesReached,
    MaxTicks,
}

/// Totals since boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub tx_events: u64,
    pub rx_events: u64,
    pub tx_cycles: u64,
    pub rx_cycles: u64,
    pub stop_reason: StopReason,
    /// Link time covered by `ticks` at the achieved bit clock.
    pub elapsed_ns: u64,
}

#[derive(Debug)]
pub struct Simulation {
    port: SimUsart,
    vectors: VectorTable<SimUsart>,
    config: SyncConfig,
    observers: Vec<Arc<dyn LinkObserver>>,
    booted: bool,
    ticks: u64,
    tx_events: u64,
    rx_events: u64,
    tx_cycles: u64,
    rx_cycles: u64,
}

impl Simulation {
    pub fn new(port: SimUsart, config: SyncConfig) -> Self {
        Self {
            port,
            vectors: VectorTable::new(),
            config,
            observers: Vec::new(),
            booted: false,
            ticks: 0,
            tx_events: 0,
            rx_events: 0,
            tx_cycles: 0,
            rx_cycles: 0,
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn LinkObserver>) {
        self.observers.push(observer);
    }

    pub fn port(&self) -> &SimUsart {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut SimUsart {
        &mut self.port
    }

    pub fn vectors(&self) -> &VectorTable<SimUsart> {
        &self.vectors
    }

    pub fn vectors_mut(&mut self) -> &mut VectorTable<SimUsart> {
        &mut self.vectors
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Bring the port up as master. Transfers begin on the first service pass.
    pub fn boot(&mut self) -> SimResult<()> {
        init_master(&mut self.port, &self.config)?;
        self.booted = true;
        tracing::info!(
            "Link booted: {:?}, {:?}, achieved {} Hz",
            self.config.clock_mode(),
            self.config.bit_order,
            self.port.achieved_baud_rate().unwrap_or(0)
        );
        Ok(())
    }

    /// Service whatever is pending, then advance one bit clock. Returns the
    /// events serviced.
    pub fn step(&mut self) -> SimResult<EventSet> {
        if !self.booted {
            return Err(SimError::NotBooted);
        }
        let serviced = self.service_pending()?;
        self.port.tick();
        self.ticks += 1;
        Ok(serviced)
    }

    pub fn run(&mut self, stop: StopCondition) -> SimResult<RunSummary> {
        if !self.booted {
            return Err(SimError::NotBooted);
        }
        let rx_goal = self.rx_cycles.saturating_add(stop.rx_cycles);
        let tick_limit = self.ticks.saturating_add(stop.max_ticks);

        for observer in &self.observers {
            observer.on_run_start();
        }

        let reason = loop {
            self.service_pending()?;
            if self.rx_cycles >= rx_goal {
                break StopReason::RxCyclesReached;
            }
            if self.ticks >= tick_limit {
                break StopReason::MaxTicks;
            }
            self.port.tick();
            self.ticks += 1;
        };

        for observer in &self.observers {
            observer.on_run_stop(reason);
        }

        let summary = self.summary(reason);
        tracing::info!(
            "Run stopped ({:?}) after {} ticks: {} tx / {} rx events, {} rx cycles",
            reason,
            summary.ticks,
            summary.tx_events,
            summary.rx_events,
            summary.rx_cycles
        );
        Ok(summary)
    }

    fn service_pending(&mut self) -> SimResult<EventSet> {
        let pending = self.port.pending_events();
        for event in DISPATCH_ORDER {
            if pending.contains(event.flag()) {
                self.dispatch(event)?;
            }
        }
        Ok(pending)
    }

    fn dispatch(&mut self, event: Event) -> SimResult<()> {
        let progress = self.vectors.dispatch(event, &mut self.port)?;
        match event {
            Event::TransmitReady => self.tx_events += 1,
            Event::DataAvailable => self.rx_events += 1,
        }
        for observer in &self.observers {
            observer.on_event(event, self.ticks);
        }

        if !progress.is_wrapped() {
            return Ok(());
        }
        match event {
            Event::TransmitReady => self.tx_cycles += 1,
            Event::DataAvailable => self.rx_cycles += 1,
        }
        let buffer = self
            .vectors
            .handler(event)
            .map(|h| h.buffer())
            .unwrap_or_default();
        tracing::debug!("{} cycle complete at tick {}: {:02x?}", event, self.ticks, buffer);
        for observer in &self.observers {
            observer.on_cycle_complete(event, buffer);
        }
        Ok(())
    }

    pub fn summary(&self, stop_reason: StopReason) -> RunSummary {
        let elapsed_ns = match self.port.achieved_baud_rate() {
            Some(baud) if baud > 0 => {
                let ns = u128::from(self.ticks) * 1_000_000_000 / u128::from(baud);
                u64::try_from(ns).unwrap_or(u64::MAX)
            }
            _ => 0,
        };
        RunSummary {
            ticks: self.ticks,
            tx_events: self.tx_events,
            rx_events: self.rx_events,
            tx_cycles: self.tx_cycles,
            rx_cycles: self.rx_cycles,
            stop_reason,
            elapsed_ns,
        }
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        let handlers = self
            .vectors
            .events()
            .filter_map(|event| {
                self.vectors.handler(event).map(|h| HandlerSnapshot {
                    event,
                    cursor: h.cursor(),
                    buffer: h.buffer().to_vec(),
                })
            })
            .collect();
        LinkSnapshot {
            ticks: self.ticks,
            booted: self.booted,
            usart: self.port.snapshot(),
            handlers,
            metrics: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slave::{LoopbackSlave, PatternSlave};
    use std::sync::Mutex;
    use syncspi_core::{BitOrder, ReceiveEngine, TransmitEngine, BUFFER_SIZE, TX_PATTERN};

    fn pattern_link() -> Simulation {
        let slave = PatternSlave::new(
            vec![0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9],
            BitOrder::MsbFirst,
        );
        let port = SimUsart::new(19_000_000, Box::new(slave));
        let mut sim = Simulation::new(port, SyncConfig::default());
        sim.vectors_mut()
            .register_handler(Event::TransmitReady, Box::new(TransmitEngine::new(TX_PATTERN)))
            .unwrap();
        sim.vectors_mut()
            .register_handler(
                Event::DataAvailable,
                Box::new(ReceiveEngine::<BUFFER_SIZE>::new()),
            )
            .unwrap();
        sim
    }

    #[derive(Debug, Default)]
    struct EventLog(Mutex<Vec<(Event, u64)>>);

    impl LinkObserver for EventLog {
        fn on_event(&self, event: Event, tick: u64) {
            self.0.lock().unwrap().push((event, tick));
        }
    }

    #[test]
    fn test_run_before_boot_fails() {
        let mut sim = pattern_link();
        assert_eq!(sim.run(StopCondition::default()), Err(SimError::NotBooted));
        assert_eq!(sim.step(), Err(SimError::NotBooted));
    }

    #[test]
    fn test_first_transmit_is_serviced_before_any_tick() {
        let mut sim = pattern_link();
        sim.boot().unwrap();
        assert_eq!(sim.step().unwrap(), EventSet::TRANSMIT_READY);
        // The byte moved into the shifter on that tick, so the slot is free again.
        assert_eq!(sim.step().unwrap(), EventSet::TRANSMIT_READY);
        assert_eq!(sim.ticks(), 2);
    }

    #[test]
    fn test_one_cycle_timing() {
        let mut sim = pattern_link();
        sim.boot().unwrap();
        let summary = sim.run(StopCondition::rx_cycles(1)).unwrap();

        assert_eq!(summary.stop_reason, StopReason::RxCyclesReached);
        // Ten back-to-back frames of eight bit clocks.
        assert_eq!(summary.ticks, 80);
        assert_eq!(summary.rx_events, 10);
        // Transmit stays ahead: one byte in the shifter, one in the slot.
        assert_eq!(summary.tx_events, 12);
        assert_eq!(summary.tx_cycles, 1);
        // 19 MHz / 20 = 950 kHz.
        assert_eq!(summary.elapsed_ns, 80 * 1_000_000_000 / 950_000);
    }

    #[test]
    fn test_receive_serviced_before_transmit() {
        let mut sim = pattern_link();
        let log = Arc::new(EventLog::default());
        sim.add_observer(log.clone());
        sim.boot().unwrap();
        sim.run(StopCondition::rx_cycles(1)).unwrap();

        let log = log.0.lock().unwrap();
        let at_tick_8: Vec<Event> = log
            .iter()
            .filter(|(_, tick)| *tick == 8)
            .map(|(event, _)| *event)
            .collect();
        assert_eq!(at_tick_8, vec![Event::DataAvailable, Event::TransmitReady]);
        assert_eq!(log.first(), Some(&(Event::TransmitReady, 0)));
    }

    #[test]
    fn test_missing_receive_handler_surfaces() {
        let port = SimUsart::new(19_000_000, Box::new(LoopbackSlave::new()));
        let mut sim = Simulation::new(port, SyncConfig::default());
        sim.vectors_mut()
            .register_handler(Event::TransmitReady, Box::new(TransmitEngine::new([1, 2])))
            .unwrap();
        sim.boot().unwrap();

        // Receive handler missing: the first received byte cannot be serviced.
        assert_eq!(
            sim.run(StopCondition::rx_cycles(1).with_max_ticks(100)),
            Err(SimError::MissingHandler(Event::DataAvailable))
        );
    }

    #[test]
    fn test_zero_rx_goal_stops_immediately() {
        let mut sim = pattern_link();
        sim.boot().unwrap();
        let summary = sim.run(StopCondition::rx_cycles(0)).unwrap();
        assert_eq!(summary.stop_reason, StopReason::RxCyclesReached);
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.tx_events, 1);
    }

    #[test]
    fn test_tick_budget() {
        let mut sim = pattern_link();
        sim.boot().unwrap();
        let summary = sim
            .run(StopCondition::rx_cycles(5).with_max_ticks(50))
            .unwrap();
        assert_eq!(summary.stop_reason, StopReason::MaxTicks);
        assert_eq!(summary.ticks, 50);
        assert_eq!(summary.rx_cycles, 0);
    }

    #[test]
    fn test_elapsed_time_saturates() {
        let mut sim = pattern_link();
        sim.boot().unwrap();
        sim.ticks = u64::MAX;
        assert_eq!(sim.summary(StopReason::MaxTicks).elapsed_ns, u64::MAX);
    }

    #[test]
    fn test_boot_twice_fails() {
        let mut sim = pattern_link();
        sim.boot().unwrap();
        assert_eq!(sim.boot(), Err(SimError::ConfigureWhileEnabled));
    }
}
