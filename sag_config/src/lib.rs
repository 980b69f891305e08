#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and anchor parsing for the sag meter.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The anchor CSV loader enforces headers and exactly one row per anchor
//!   (length 0 and length 100).
use serde::Deserialize;

/// Physical length assigned to the upper calibration anchor.
pub const FULL_SCALE: f32 = 100.0;

/// Largest reading of the 10-bit MCP3008.
pub const MCP3008_MAX_RAW: u16 = 1023;

/// Anchor CSV schema.
///
/// Expected headers:
/// raw,length
///
/// Example:
/// raw,length
/// 815,0
/// 1256,100
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AnchorRow {
    pub raw: u16,
    pub length: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Simulated potentiometer sweeping between `sim_low` and `sim_high`.
    #[default]
    Sim,
    /// MCP3008 10-bit ADC on the SPI bus (requires the `hardware` feature).
    Mcp3008,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    pub kind: SensorKind,
    /// Largest raw value the sampling hardware can produce.
    pub max_raw: u16,
    /// ADC input channel.
    pub channel: u8,
    pub spi_bus: u8,
    pub spi_hz: u32,
    /// Simulated sweep bounds and raw counts moved per reading.
    pub sim_low: u16,
    pub sim_high: u16,
    pub sim_step: u16,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            kind: SensorKind::Sim,
            max_raw: 4095,
            channel: 0,
            spi_bus: 0,
            spi_hz: 1_000_000,
            sim_low: 815,
            sim_high: 1256,
            sim_step: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Moving average window size (samples).
    pub window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { window: 128 }
    }
}

/// The two raw readings that map to length 0 and length 100.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Anchors {
    pub raw_at_zero: u16,
    pub raw_at_hundred: u16,
}

impl Default for Anchors {
    fn default() -> Self {
        Self {
            raw_at_zero: 815,
            raw_at_hundred: 1256,
        }
    }
}

impl Anchors {
    /// Build anchors from CSV rows. Requires exactly one row at length 0 and one at 100.
    pub fn from_rows(rows: &[AnchorRow]) -> eyre::Result<Self> {
        if rows.len() != 2 {
            eyre::bail!("calibration requires exactly two rows, got {}", rows.len());
        }
        let find = |target: f32| rows.iter().find(|r| (r.length - target).abs() < f32::EPSILON);
        let zero = find(0.0).ok_or_else(|| eyre::eyre!("calibration has no row with length 0"))?;
        let hundred = find(FULL_SCALE)
            .ok_or_else(|| eyre::eyre!("calibration has no row with length 100"))?;
        if zero.raw == hundred.raw {
            eyre::bail!(
                "calibration anchors must differ (both rows have raw {})",
                zero.raw
            );
        }
        Ok(Self {
            raw_at_zero: zero.raw,
            raw_at_hundred: hundred.raw,
        })
    }
}

impl TryFrom<&[AnchorRow]> for Anchors {
    type Error = eyre::Report;
    fn try_from(rows: &[AnchorRow]) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleCfg {
    /// Sampling task period (ms).
    pub sample_ms: u32,
    /// Display refresh period (ms).
    pub display_ms: u32,
    /// State broadcast period (ms).
    pub broadcast_ms: u32,
    /// Pause between loop iterations (µs); 0 spins.
    pub idle_us: u64,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            sample_ms: 1,
            display_ms: 100,
            broadcast_ms: 100,
            idle_us: 200,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    /// Redraw the four rows in place on stdout.
    #[default]
    Terminal,
    /// Emit each frame as a tracing event.
    Log,
    None,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayCfg {
    pub kind: DisplayKind,
    /// Unit label printed after each value.
    pub unit: String,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            kind: DisplayKind::Terminal,
            unit: "mm".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NetworkCfg {
    pub enabled: bool,
    /// Socket address for the HTTP/WebSocket listener.
    pub bind: String,
    /// Request path that upgrades to WebSocket.
    pub ws_path: String,
    /// Pending outbound payloads per client before new ones are dropped.
    pub outbox_depth: usize,
}

impl Default for NetworkCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8080".to_string(),
            ws_path: "/ws".to_string(),
            outbox_depth: 4,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorCfg,
    pub filter: FilterCfg,
    pub calibration: Anchors,
    pub schedule: ScheduleCfg,
    pub display: DisplayCfg,
    pub network: NetworkCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_anchors_csv(path: &std::path::Path) -> eyre::Result<Anchors> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["raw", "length"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'raw,length', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<AnchorRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    Anchors::try_from(rows.as_slice())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.max_raw == 0 {
            eyre::bail!("sensor.max_raw must be > 0");
        }
        if self.sensor.kind == SensorKind::Mcp3008 {
            if self.sensor.channel > 7 {
                eyre::bail!("sensor.channel must be in 0..=7 for mcp3008");
            }
            if self.sensor.spi_hz == 0 {
                eyre::bail!("sensor.spi_hz must be > 0");
            }
            if self.sensor.max_raw > MCP3008_MAX_RAW {
                eyre::bail!(
                    "sensor.max_raw must be <= {MCP3008_MAX_RAW} for mcp3008 (10-bit ADC), got {}",
                    self.sensor.max_raw
                );
            }
        }
        if self.sensor.kind == SensorKind::Sim && self.sensor.sim_low > self.sensor.sim_high {
            eyre::bail!("sensor.sim_low must be <= sensor.sim_high");
        }

        // Filter
        if self.filter.window == 0 {
            eyre::bail!("filter.window must be >= 1");
        }
        if self.filter.window > 4096 {
            eyre::bail!("filter.window is unreasonably large (>4096)");
        }

        // Calibration
        self.validate_anchors(&self.calibration)?;

        // Schedule
        if self.schedule.sample_ms == 0 {
            eyre::bail!("schedule.sample_ms must be >= 1");
        }
        if self.schedule.display_ms == 0 {
            eyre::bail!("schedule.display_ms must be >= 1");
        }
        if self.schedule.broadcast_ms == 0 {
            eyre::bail!("schedule.broadcast_ms must be >= 1");
        }
        if self.schedule.idle_us > 1_000_000 {
            eyre::bail!("schedule.idle_us is unreasonably large (>1s)");
        }

        // Network
        if self.network.enabled {
            if self.network.bind.parse::<std::net::SocketAddr>().is_err() {
                eyre::bail!(
                    "network.bind must be a socket address (host:port), got {:?}",
                    self.network.bind
                );
            }
            if !self.network.ws_path.starts_with('/') {
                eyre::bail!("network.ws_path must start with '/'");
            }
            if self.network.outbox_depth == 0 {
                eyre::bail!("network.outbox_depth must be >= 1");
            }
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rotation:?}");
        }

        Ok(())
    }

    /// Check a pair of anchors against this config's sensor range.
    ///
    /// Used for both the TOML `[calibration]` table and anchors loaded from CSV.
    pub fn validate_anchors(&self, anchors: &Anchors) -> eyre::Result<()> {
        if anchors.raw_at_zero == anchors.raw_at_hundred {
            eyre::bail!(
                "invalid configuration: calibration.raw_at_zero and calibration.raw_at_hundred must differ (both {})",
                anchors.raw_at_zero
            );
        }
        let max = self.sensor.max_raw;
        if anchors.raw_at_zero > max || anchors.raw_at_hundred > max {
            eyre::bail!("calibration anchors must be <= sensor.max_raw ({max})");
        }
        Ok(())
    }
}
