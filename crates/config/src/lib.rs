// SyncSPI - Interrupt-Driven USART SPI Master
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! YAML link manifests describing one simulated master/slave SPI link.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use syncspi_core::{sync_clock_divider, BitOrder, ClockMode, SyncConfig, BUFFER_SIZE, TX_PATTERN};
use thiserror::Error;

pub const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

/// Reply table of the stock pattern slave.
pub const DEFAULT_REPLIES: [u8; BUFFER_SIZE] =
    [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9];

/// Default schema version for YAML manifests
fn default_schema_version() -> String {
    SUPPORTED_SCHEMA_VERSION.to_string()
}

fn default_name() -> String {
    "default-link".to_string()
}

fn default_true() -> bool {
    true
}

fn default_baud_rate() -> u32 {
    1_000_000
}

// HFRCO default band on xG12 parts.
fn default_peripheral_clock_hz() -> u32 {
    19_000_000
}

fn default_transmit() -> Vec<u8> {
    TX_PATTERN.to_vec()
}

fn default_replies() -> Vec<u8> {
    DEFAULT_REPLIES.to_vec()
}

fn default_max_ticks() -> u64 {
    10_000
}

fn default_rx_cycles() -> u64 {
    1
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported schema_version '{0}'. Supported versions: '1.0'")]
    UnsupportedSchemaVersion(String),
    #[error("Manifest 'name' cannot be empty")]
    EmptyName,
    #[error("usart.baud_rate must be greater than zero")]
    ZeroBaudRate,
    #[error("usart.peripheral_clock_hz must be greater than zero")]
    ZeroPeripheralClock,
    #[error(
        "usart.baud_rate {baud_rate} Hz cannot be derived from a {peripheral_clock_hz} Hz peripheral clock"
    )]
    UnreachableBaudRate {
        baud_rate: u32,
        peripheral_clock_hz: u32,
    },
    #[error("'transmit' must hold exactly {expected} bytes, found {found}")]
    TransmitLength { expected: usize, found: usize },
    #[error("slave.replies cannot be empty for a pattern slave")]
    EmptyReplies,
    #[error("Limit '{0}' must be greater than zero")]
    ZeroLimit(&'static str),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UsartSettings {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub clock_mode: ClockMode,
    #[serde(default)]
    pub bit_order: BitOrder,
    #[serde(default = "default_true")]
    pub auto_chip_select: bool,
    #[serde(default = "default_peripheral_clock_hz")]
    pub peripheral_clock_hz: u32,
}

impl Default for UsartSettings {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            clock_mode: ClockMode::default(),
            bit_order: BitOrder::default(),
            auto_chip_select: true,
            peripheral_clock_hz: default_peripheral_clock_hz(),
        }
    }
}

impl UsartSettings {
    /// Master line settings handed to the port at boot.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::master(self.baud_rate)
            .with_clock_mode(self.clock_mode)
            .with_bit_order(self.bit_order)
            .with_auto_chip_select(self.auto_chip_select)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlaveKind {
    /// Answers every byte with the next entry of its reply table.
    #[default]
    Pattern,
    /// MISO tied to MOSI.
    Loopback,
    /// Nothing attached; the line idles high.
    Silent,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SlaveSettings {
    #[serde(rename = "type", default)]
    pub kind: SlaveKind,
    #[serde(default = "default_replies")]
    pub replies: Vec<u8>,
    #[serde(default)]
    pub bit_order: BitOrder,
    #[serde(default)]
    pub clock_mode: ClockMode,
}

impl Default for SlaveSettings {
    fn default() -> Self {
        Self {
            kind: SlaveKind::default(),
            replies: default_replies(),
            bit_order: BitOrder::default(),
            clock_mode: ClockMode::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LinkLimits {
    /// Hard ceiling on simulated bit clocks.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Completed receive cycles after which the run counts as passed.
    #[serde(default = "default_rx_cycles")]
    pub rx_cycles: u64,
}

impl Default for LinkLimits {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            rx_cycles: default_rx_cycles(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LinkManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    #[serde(default)]
    pub usart: UsartSettings,
    #[serde(default = "default_transmit")]
    pub transmit: Vec<u8>,
    #[serde(default)]
    pub slave: SlaveSettings,
    #[serde(default)]
    pub limits: LinkLimits,
}

impl Default for LinkManifest {
    /// The stock link: 1 MHz mode 0 MSB-first master talking to a pattern
    /// slave that answers A0..A9.
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: default_name(),
            usart: UsartSettings::default(),
            transmit: default_transmit(),
            slave: SlaveSettings::default(),
            limits: LinkLimits::default(),
        }
    }
}

impl LinkManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read link manifest at {:?}", path))?;
        let manifest = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid link manifest {:?}", path))?;
        tracing::info!(
            "Loaded link manifest '{}' from {:?} ({} Hz, {:?}, {:?} slave)",
            manifest.name,
            path,
            manifest.usart.baud_rate,
            manifest.usart.clock_mode,
            manifest.slave.kind
        );
        Ok(manifest)
    }

    /// Parse and validate a manifest held in memory.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Link Manifest YAML")?;
        manifest.validate()?;
        manifest.warn_unmodelled();
        Ok(manifest)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchemaVersion(
                self.schema_version.clone(),
            ));
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }

        let usart = &self.usart;
        if usart.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        if usart.peripheral_clock_hz == 0 {
            return Err(ConfigError::ZeroPeripheralClock);
        }
        if sync_clock_divider(usart.peripheral_clock_hz, usart.baud_rate).is_none() {
            return Err(ConfigError::UnreachableBaudRate {
                baud_rate: usart.baud_rate,
                peripheral_clock_hz: usart.peripheral_clock_hz,
            });
        }

        if self.transmit.len() != BUFFER_SIZE {
            return Err(ConfigError::TransmitLength {
                expected: BUFFER_SIZE,
                found: self.transmit.len(),
            });
        }

        if self.slave.kind == SlaveKind::Pattern && self.slave.replies.is_empty() {
            return Err(ConfigError::EmptyReplies);
        }

        if self.limits.max_ticks == 0 {
            return Err(ConfigError::ZeroLimit("max_ticks"));
        }
        if self.limits.rx_cycles == 0 {
            return Err(ConfigError::ZeroLimit("rx_cycles"));
        }

        Ok(())
    }

    /// The transmit table as a fixed-size pattern. Fails only on a manifest
    /// that skipped [`LinkManifest::validate`].
    pub fn transmit_pattern(&self) -> std::result::Result<[u8; BUFFER_SIZE], ConfigError> {
        self.transmit
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::TransmitLength {
                expected: BUFFER_SIZE,
                found: self.transmit.len(),
            })
    }

    fn warn_unmodelled(&self) {
        if self.slave.clock_mode != self.usart.clock_mode {
            tracing::warn!(
                "Slave clock mode {:?} differs from master {:?}; clock mode mismatch is not simulated",
                self.slave.clock_mode,
                self.usart.clock_mode
            );
        }
        if self.slave.kind != SlaveKind::Pattern && self.slave.replies != default_replies() {
            tracing::warn!(
                "slave.replies is ignored for a {:?} slave",
                self.slave.kind
            );
        }
    }
}
