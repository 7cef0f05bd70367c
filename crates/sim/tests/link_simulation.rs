// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use syncspi_config::{LinkManifest, SlaveKind, DEFAULT_REPLIES};
use syncspi_core::{BitOrder, Event, TX_PATTERN};
use syncspi_sim::{
    from_manifest, CycleCapture, LinkMetrics, LinkSnapshot, Simulation, StopCondition, StopReason,
};

fn booted(manifest: &LinkManifest) -> (Simulation, Arc<CycleCapture>) {
    let mut sim = from_manifest(manifest).unwrap();
    let capture = Arc::new(CycleCapture::receive());
    sim.add_observer(capture.clone());
    sim.boot().unwrap();
    (sim, capture)
}

fn rx_buffer(sim: &Simulation) -> Vec<u8> {
    sim.vectors()
        .handler(Event::DataAvailable)
        .unwrap()
        .buffer()
        .to_vec()
}

#[test]
fn test_default_link_receives_a0_to_a9() {
    let (mut sim, capture) = booted(&LinkManifest::default());
    let summary = sim.run(StopCondition::rx_cycles(1)).unwrap();

    assert_eq!(summary.stop_reason, StopReason::RxCyclesReached);
    assert_eq!(capture.last(), Some(DEFAULT_REPLIES.to_vec()));
    assert_eq!(rx_buffer(&sim), DEFAULT_REPLIES.to_vec());
    assert_eq!(
        sim.vectors().handler(Event::DataAvailable).unwrap().cursor(),
        0
    );

    let counters = sim.port().counters();
    assert_eq!(counters.frames, 10);
    assert_eq!(counters.tx_overflows, 0);
    assert_eq!(counters.rx_overruns, 0);
    assert_eq!(counters.rx_underflows, 0);
}

#[test]
fn test_master_sends_pattern_on_the_wire() {
    let mut sim = from_manifest(&LinkManifest::default()).unwrap();
    let sink = Arc::new(Mutex::new(Vec::new()));
    sim.port_mut().set_mosi_sink(Some(sink.clone()));
    sim.boot().unwrap();
    sim.run(StopCondition::rx_cycles(2)).unwrap();

    let wire = sink.lock().unwrap().clone();
    let mut expected = TX_PATTERN.to_vec();
    expected.extend_from_slice(&TX_PATTERN);
    assert_eq!(wire, expected);
}

#[test]
fn test_steady_state_repeats_every_cycle() {
    let (mut sim, capture) = booted(&LinkManifest::default());
    sim.run(StopCondition::rx_cycles(5)).unwrap();

    let cycles = capture.cycles();
    assert_eq!(cycles.len(), 5);
    assert!(cycles.iter().all(|c| c == &DEFAULT_REPLIES.to_vec()));
}

#[test]
fn test_loopback_lsb_returns_transmit_pattern() {
    let mut manifest = LinkManifest::default();
    manifest.usart.bit_order = BitOrder::LsbFirst;
    manifest.slave.kind = SlaveKind::Loopback;
    manifest.slave.bit_order = BitOrder::LsbFirst;

    let (mut sim, capture) = booted(&manifest);
    sim.run(StopCondition::rx_cycles(3)).unwrap();
    assert_eq!(capture.cycles(), vec![TX_PATTERN.to_vec(); 3]);
}

#[test]
fn test_bit_order_mismatch_mirrors_replies() {
    let mut manifest = LinkManifest::default();
    manifest.usart.bit_order = BitOrder::LsbFirst;

    let (mut sim, capture) = booted(&manifest);
    sim.run(StopCondition::rx_cycles(1)).unwrap();

    let mirrored: Vec<u8> = DEFAULT_REPLIES.iter().map(|b| b.reverse_bits()).collect();
    assert_eq!(capture.last(), Some(mirrored));
}

#[test]
fn test_no_chip_select_reads_idle_line() {
    let mut manifest = LinkManifest::default();
    manifest.usart.auto_chip_select = false;

    let (mut sim, capture) = booted(&manifest);
    sim.run(StopCondition::rx_cycles(1)).unwrap();
    assert_eq!(capture.last(), Some(vec![0xFF; 10]));
    assert!(!sim.port().chip_select_asserted());
}

#[test]
fn test_silent_slave_reads_idle_line() {
    let mut manifest = LinkManifest::default();
    manifest.slave.kind = SlaveKind::Silent;

    let (mut sim, capture) = booted(&manifest);
    sim.run(StopCondition::rx_cycles(1)).unwrap();
    assert_eq!(capture.last(), Some(vec![0xFF; 10]));
}

#[test]
fn test_short_reply_table_wraps_independently() {
    let mut manifest = LinkManifest::default();
    manifest.slave.replies = vec![0x11, 0x22, 0x33];

    let (mut sim, capture) = booted(&manifest);
    sim.run(StopCondition::rx_cycles(1)).unwrap();
    assert_eq!(
        capture.last(),
        Some(vec![0x11, 0x22, 0x33, 0x11, 0x22, 0x33, 0x11, 0x22, 0x33, 0x11])
    );
}

#[test]
fn test_metrics_match_summary() {
    let mut sim = from_manifest(&LinkManifest::default()).unwrap();
    let metrics = Arc::new(LinkMetrics::new());
    sim.add_observer(metrics.clone());
    sim.boot().unwrap();
    let summary = sim.run(StopCondition::rx_cycles(2)).unwrap();

    let report = metrics.report();
    assert_eq!(report.tx_events, summary.tx_events);
    assert_eq!(report.rx_events, summary.rx_events);
    assert_eq!(report.rx_cycles, 2);
    assert_eq!(report.runs, 1);
    assert_eq!(summary.rx_events, 20);
}

#[test]
fn test_consecutive_runs_accumulate() {
    let (mut sim, capture) = booted(&LinkManifest::default());
    let first = sim.run(StopCondition::rx_cycles(1)).unwrap();
    let second = sim.run(StopCondition::rx_cycles(1)).unwrap();

    assert_eq!(first.rx_cycles, 1);
    assert_eq!(second.rx_cycles, 2);
    assert_eq!(second.ticks, 2 * first.ticks);
    assert_eq!(capture.len(), 2);
}

#[test]
fn test_snapshot_round_trips_through_json() {
    let (mut sim, _capture) = booted(&LinkManifest::default());
    sim.run(StopCondition::rx_cycles(1)).unwrap();

    let metrics = LinkMetrics::new();
    let snapshot = sim.snapshot().with_metrics(metrics.report());
    let json = snapshot.to_json_pretty().unwrap();
    let restored: LinkSnapshot = serde_json::from_str(&json).unwrap();

    let rx = restored.handler(Event::DataAvailable).unwrap();
    assert_eq!(rx.buffer, DEFAULT_REPLIES.to_vec());
    assert_eq!(rx.cursor, 0);
    let tx = restored.handler(Event::TransmitReady).unwrap();
    assert_eq!(tx.buffer, TX_PATTERN.to_vec());
    assert_eq!(restored.usart["counters"]["frames"], 10);
    assert!(restored.booted);
    assert_eq!(restored.ticks, 80);
    assert!(restored.metrics.is_some());
}

#[test]
fn test_slave_state_stays_bounded_on_long_runs() {
    let (mut sim, _capture) = booted(&LinkManifest::default());
    sim.run(StopCondition::rx_cycles(1)).unwrap();
    let short = sim.snapshot().to_json_pretty().unwrap().len();

    sim.run(StopCondition::rx_cycles(1000).with_max_ticks(1_000_000))
        .unwrap();
    let snapshot = sim.snapshot();
    let received = snapshot.usart["slave"]["state"]["received"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(received.len(), 10);
    assert_eq!(received[0], 0);
    assert_eq!(received[9], 9);
    // Only counters grow; the document size stays in the same ballpark.
    assert!(snapshot.to_json_pretty().unwrap().len() < short + 64);
}

proptest! {
    #[test]
    fn test_any_reachable_baud_rate_yields_the_replies(
        baud in 10_000u32..=9_500_000,
        cycles in 1u64..4,
    ) {
        let mut manifest = LinkManifest::default();
        manifest.usart.baud_rate = baud;
        let (mut sim, capture) = booted(&manifest);
        let summary = sim.run(StopCondition::rx_cycles(cycles)).unwrap();

        prop_assert_eq!(summary.stop_reason, StopReason::RxCyclesReached);
        prop_assert_eq!(summary.ticks, cycles * 80);
        prop_assert_eq!(capture.cycles(), vec![DEFAULT_REPLIES.to_vec(); cycles as usize]);
        prop_assert_eq!(sim.port().counters().rx_overruns, 0);
    }
}
