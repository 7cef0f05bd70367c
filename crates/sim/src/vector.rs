// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Event-to-handler binding, the simulated counterpart of the interrupt
//! vector table.

use crate::{SimError, SimResult};
use std::collections::BTreeMap;
use std::fmt;
use syncspi_core::{Event, EventHandler, Progress, SyncSerial};

pub struct VectorTable<P: SyncSerial + ?Sized> {
    slots: BTreeMap<Event, Box<dyn EventHandler<P> + Send>>,
}

impl<P: SyncSerial + ?Sized> Default for VectorTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SyncSerial + ?Sized> fmt::Debug for VectorTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .map(|(event, handler)| (event, handler.cursor())),
            )
            .finish()
    }
}

impl<P: SyncSerial + ?Sized> VectorTable<P> {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Bind `handler` to `event`. Each event takes exactly one handler, and
    /// the handler must service the event it is bound to.
    pub fn register_handler(
        &mut self,
        event: Event,
        handler: Box<dyn EventHandler<P> + Send>,
    ) -> SimResult<()> {
        if handler.event() != event {
            return Err(SimError::HandlerEventMismatch {
                slot: event,
                actual: handler.event(),
            });
        }
        if self.slots.contains_key(&event) {
            return Err(SimError::HandlerAlreadyRegistered(event));
        }
        self.slots.insert(event, handler);
        tracing::debug!("Handler registered for {}", event);
        Ok(())
    }

    pub fn handler(&self, event: Event) -> Option<&(dyn EventHandler<P> + Send)> {
        self.slots.get(&event).map(|h| h.as_ref())
    }

    pub fn is_registered(&self, event: Event) -> bool {
        self.slots.contains_key(&event)
    }

    /// Run the handler bound to `event` to completion.
    pub fn dispatch(&mut self, event: Event, port: &mut P) -> SimResult<Progress> {
        let handler = self
            .slots
            .get_mut(&event)
            .ok_or(SimError::MissingHandler(event))?;
        Ok(handler.handle(port))
    }

    pub fn events(&self) -> impl Iterator<Item = Event> + '_ {
        self.slots.keys().copied()
    }
}
