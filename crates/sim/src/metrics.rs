// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::harness::LinkObserver;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use syncspi_core::Event;

#[derive(Debug)]
pub struct LinkMetrics {
    tx_events: AtomicU64,
    rx_events: AtomicU64,
    tx_cycles: AtomicU64,
    rx_cycles: AtomicU64,
    runs: AtomicU64,
    start_time: Instant,
}

/// Point-in-time copy of [`LinkMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub tx_events: u64,
    pub rx_events: u64,
    pub tx_cycles: u64,
    pub rx_cycles: u64,
    pub runs: u64,
    pub events_per_sec: f64,
}

impl Default for LinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self {
            tx_events: AtomicU64::new(0),
            rx_events: AtomicU64::new(0),
            tx_cycles: AtomicU64::new(0),
            rx_cycles: AtomicU64::new(0),
            runs: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn reset(&self) {
        self.tx_events.store(0, Ordering::SeqCst);
        self.rx_events.store(0, Ordering::SeqCst);
        self.tx_cycles.store(0, Ordering::SeqCst);
        self.rx_cycles.store(0, Ordering::SeqCst);
        self.runs.store(0, Ordering::SeqCst);
    }

    pub fn get_events(&self, event: Event) -> u64 {
        match event {
            Event::TransmitReady => self.tx_events.load(Ordering::SeqCst),
            Event::DataAvailable => self.rx_events.load(Ordering::SeqCst),
        }
    }

    pub fn get_cycles(&self, event: Event) -> u64 {
        match event {
            Event::TransmitReady => self.tx_cycles.load(Ordering::SeqCst),
            Event::DataAvailable => self.rx_cycles.load(Ordering::SeqCst),
        }
    }

    pub fn get_runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Handler invocations per wall-clock second since creation.
    pub fn get_events_per_sec(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.get_events(Event::TransmitReady) + self.get_events(Event::DataAvailable);
        if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            tx_events: self.get_events(Event::TransmitReady),
            rx_events: self.get_events(Event::DataAvailable),
            tx_cycles: self.get_cycles(Event::TransmitReady),
            rx_cycles: self.get_cycles(Event::DataAvailable),
            runs: self.get_runs(),
            events_per_sec: self.get_events_per_sec(),
        }
    }
}

impl LinkObserver for LinkMetrics {
    fn on_run_start(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }

    fn on_event(&self, event: Event, _tick: u64) {
        let counter = match event {
            Event::TransmitReady => &self.tx_events,
            Event::DataAvailable => &self.rx_events,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cycle_complete(&self, event: Event, _buffer: &[u8]) {
        let counter = match event {
            Event::TransmitReady => &self.tx_cycles,
            Event::DataAvailable => &self.rx_cycles,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_events_and_cycles() {
        let metrics = LinkMetrics::new();
        metrics.on_run_start();
        for _ in 0..3 {
            metrics.on_event(Event::TransmitReady, 0);
        }
        metrics.on_event(Event::DataAvailable, 8);
        metrics.on_cycle_complete(Event::DataAvailable, &[]);

        let report = metrics.report();
        assert_eq!(report.tx_events, 3);
        assert_eq!(report.rx_events, 1);
        assert_eq!(report.tx_cycles, 0);
        assert_eq!(report.rx_cycles, 1);
        assert_eq!(report.runs, 1);

        metrics.reset();
        assert_eq!(metrics.get_events(Event::TransmitReady), 0);
        assert_eq!(metrics.get_runs(), 0);
    }
}
