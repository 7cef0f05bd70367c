// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use syncspi_sim::{LinkSnapshot, RunSummary, StopReason, UsartCounters};

pub const RESULT_SCHEMA_VERSION: &str = "1.0";

/// `A0 A1 A2 ...`
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Single-line machine-readable result printed with `--json`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub schema_version: &'static str,
    pub status: &'static str,
    pub link: &'a str,
    pub achieved_baud_rate: u32,
    #[serde(flatten)]
    pub summary: &'a RunSummary,
    pub counters: UsartCounters,
    pub rx_cycles_captured: Vec<String>,
}

impl<'a> RunReport<'a> {
    pub fn new(
        link: &'a str,
        achieved_baud_rate: u32,
        summary: &'a RunSummary,
        counters: UsartCounters,
        cycles: &[Vec<u8>],
    ) -> Self {
        let status = match summary.stop_reason {
            StopReason::RxCyclesReached => "finished",
            StopReason::MaxTicks => "incomplete",
        };
        Self {
            schema_version: RESULT_SCHEMA_VERSION,
            status,
            link,
            achieved_baud_rate,
            summary,
            counters,
            rx_cycles_captured: cycles.iter().map(|c| hex_bytes(c)).collect(),
        }
    }
}

pub fn write_snapshot(path: &Path, snapshot: &LinkSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create snapshot parent dir {:?}", parent))?;
        }
    }
    let json = snapshot
        .to_json_pretty()
        .context("Failed to serialize link snapshot")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write snapshot {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_bytes() {
        assert_eq!(hex_bytes(&[0xA0, 0x01, 0xFF]), "A0 01 FF");
        assert_eq!(hex_bytes(&[]), "");
    }

    #[test]
    fn test_report_status_and_flattened_summary() {
        let summary = RunSummary {
            ticks: 80,
            tx_events: 12,
            rx_events: 10,
            tx_cycles: 1,
            rx_cycles: 1,
            stop_reason: StopReason::RxCyclesReached,
            elapsed_ns: 84_210,
        };
        let report = RunReport::new(
            "default-link",
            950_000,
            &summary,
            UsartCounters::default(),
            &[vec![0xA0, 0xA1]],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "finished");
        assert_eq!(json["ticks"], 80);
        assert_eq!(json["stop_reason"], "rx_cycles_reached");
        assert_eq!(json["rx_cycles_captured"][0], "A0 A1");

        let stalled = RunSummary {
            stop_reason: StopReason::MaxTicks,
            ..summary
        };
        let report = RunReport::new("x", 0, &stalled, UsartCounters::default(), &[]);
        assert_eq!(report.status, "incomplete");
    }
}
