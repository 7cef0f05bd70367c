// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::metrics::MetricsReport;
use serde::{Deserialize, Serialize};
use syncspi_core::Event;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkSnapshot {
    pub ticks: u64,
    pub booted: bool,
    pub usart: serde_json::Value,
    pub handlers: Vec<HandlerSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsReport>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HandlerSnapshot {
    pub event: Event,
    pub cursor: usize,
    pub buffer: Vec<u8>,
}

impl LinkSnapshot {
    pub fn with_metrics(mut self, metrics: MetricsReport) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn handler(&self, event: Event) -> Option<&HandlerSnapshot> {
        self.handlers.iter().find(|h| h.event == event)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
