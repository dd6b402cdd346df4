//! Frame loggers. Each tick's FrameResult is handed to one after it is computed.
//!
//! The engine owns one logger and forwards every frame to it. Failures are
//! reported back to the engine, which counts them and keeps ticking.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use propwash_core::state::FrameResult;
use propwash_core::{PropwashError, Result};

/// Receives frames for persistence or analysis.
pub trait FrameLogger: Send {
    fn record(&mut self, frame: &FrameResult) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NullLogger;

impl FrameLogger for NullLogger {
    fn record(&mut self, _frame: &FrameResult) -> Result<()> {
        Ok(())
    }
}

/// Keeps frames in memory. Clones share the same buffer, so a caller can
/// keep one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    frames: Arc<Mutex<Vec<FrameResult>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every frame recorded so far.
    pub fn frames(&self) -> Vec<FrameResult> {
        self.frames
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().map(|frames| frames.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameLogger for MemoryLogger {
    fn record(&mut self, frame: &FrameResult) -> Result<()> {
        let mut frames = self
            .frames
            .lock()
            .map_err(|e| PropwashError::Export(e.to_string()))?;
        frames.push(*frame);
        Ok(())
    }
}

/// One exported row. Field order is the column order.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub step: u64,
    #[serde(rename = "J")]
    pub j: f64,
    #[serde(rename = "KT")]
    pub kt: f64,
    #[serde(rename = "KQ")]
    pub kq: f64,
    #[serde(rename = "Thrust_N")]
    pub thrust_n: f64,
    #[serde(rename = "Torque_Nm")]
    pub torque_nm: f64,
    #[serde(rename = "ShaftPower_W")]
    pub shaft_power_w: f64,
    #[serde(rename = "Sigma")]
    pub sigma: f64,
    #[serde(rename = "CavitationRisk")]
    pub cavitation_risk: bool,
}

impl From<&FrameResult> for ExportRow {
    fn from(f: &FrameResult) -> Self {
        Self {
            step: f.step,
            j: f.j,
            kt: f.kt,
            kq: f.kq,
            thrust_n: f.thrust_n,
            torque_nm: f.torque_nm,
            shaft_power_w: f.shaft_power_w,
            sigma: f.sigma,
            cavitation_risk: f.cavitation_risk,
        }
    }
}

/// Writes one CSV row per frame.
pub struct CsvLogger<W: Write + Send> {
    writer: csv::Writer<W>,
}

impl CsvLogger<File> {
    /// Create (or truncate) a CSV file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        log::info!("Exporting frames to {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write + Send> CsvLogger<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| PropwashError::Export(e.to_string()))
    }
}

impl<W: Write + Send> FrameLogger for CsvLogger<W> {
    fn record(&mut self, frame: &FrameResult) -> Result<()> {
        self.writer
            .serialize(ExportRow::from(frame))
            .map_err(|e| PropwashError::Export(e.to_string()))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
