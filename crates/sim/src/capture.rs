// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Records a handler's buffer each time it completes a cycle, the host-side
//! equivalent of breaking on the wrap and inspecting the buffer.

use crate::harness::LinkObserver;
use std::sync::Mutex;
use syncspi_core::Event;

#[derive(Debug)]
pub struct CycleCapture {
    event: Event,
    cycles: Mutex<Vec<Vec<u8>>>,
}

impl CycleCapture {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            cycles: Mutex::new(Vec::new()),
        }
    }

    /// Capture the receive buffer.
    pub fn receive() -> Self {
        Self::new(Event::DataAvailable)
    }

    pub fn event(&self) -> Event {
        self.event
    }

    pub fn cycles(&self) -> Vec<Vec<u8>> {
        self.cycles.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Vec<u8>> {
        self.cycles.lock().ok().and_then(|c| c.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.cycles.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LinkObserver for CycleCapture {
    fn on_cycle_complete(&self, event: Event, buffer: &[u8]) {
        if event != self.event {
            return;
        }
        if let Ok(mut cycles) = self.cycles.lock() {
            cycles.push(buffer.to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_matching_event_is_recorded() {
        let capture = CycleCapture::receive();
        assert!(capture.is_empty());

        capture.on_cycle_complete(Event::TransmitReady, &[1, 2]);
        capture.on_cycle_complete(Event::DataAvailable, &[0xA0, 0xA1]);
        capture.on_cycle_complete(Event::DataAvailable, &[0xB0, 0xB1]);

        assert_eq!(capture.len(), 2);
        assert_eq!(capture.cycles()[0], vec![0xA0, 0xA1]);
        assert_eq!(capture.last(), Some(vec![0xB0, 0xB1]));
    }
}
