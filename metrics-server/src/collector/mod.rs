//! Host metrics collection.
//!
//! The `SensorSource` trait abstracts the raw host reads so the collector's
//! normalization can be exercised without real hardware.

mod host;
mod nvidia;
mod platform;

pub use host::HostSensors;

use std::sync::Arc;

use async_trait::async_trait;
use console_common::{CpuSnapshot, GpuSnapshot, MemorySnapshot, SystemSnapshot, NO_GPU_DETECTED};

use crate::error::Result;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB_PER_GIB: f64 = 1024.0;

/// Reported when the host cannot tell how many physical cores it has.
const FALLBACK_CORES: u32 = 4;
/// Reported when the host cannot tell how many hardware threads it has.
const FALLBACK_THREADS: u32 = 8;

/// CPU topology as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuIdentity {
    pub physical_cores: Option<u32>,
    pub logical_threads: Option<u32>,
}

/// Raw memory counters in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryReading {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// One entry of the host's graphics-controller enumeration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicsController {
    pub name: Option<String>,
    pub utilization_percent: Option<f64>,
    pub memory_used_mib: Option<f64>,
    pub memory_total_mib: Option<f64>,
}

/// Raw host sensor reads. Every read is independent of the others.
#[async_trait]
pub trait SensorSource: Send + Sync {
    async fn cpu_identity(&self) -> Result<CpuIdentity>;

    /// Current overall CPU load in percent.
    async fn cpu_load(&self) -> Result<f64>;

    async fn memory(&self) -> Result<MemoryReading>;

    async fn graphics(&self) -> Result<Vec<GraphicsController>>;
}

/// Builds a [`SystemSnapshot`] from a sensor source. Stateless between calls.
pub struct MetricsCollector {
    sensors: Arc<dyn SensorSource>,
}

impl MetricsCollector {
    pub fn new(sensors: Arc<dyn SensorSource>) -> Self {
        Self { sensors }
    }

    /// Read every sensor concurrently and merge the results.
    ///
    /// Fails as a whole if any single read fails.
    pub async fn snapshot(&self) -> Result<SystemSnapshot> {
        let (identity, load, memory, controllers) = tokio::try_join!(
            self.sensors.cpu_identity(),
            self.sensors.cpu_load(),
            self.sensors.memory(),
            self.sensors.graphics(),
        )?;

        let cpu = CpuSnapshot {
            usage_percent: round_to(non_negative(load).min(100.0), 1),
            cores: identity
                .physical_cores
                .filter(|&c| c > 0)
                .unwrap_or(FALLBACK_CORES),
            threads: identity
                .logical_threads
                .filter(|&t| t > 0)
                .unwrap_or(FALLBACK_THREADS),
        };

        let memory = MemorySnapshot {
            used_gib: round_to(memory.used_bytes as f64 / BYTES_PER_GIB, 2),
            total_gib: round_to(memory.total_bytes as f64 / BYTES_PER_GIB, 2),
        };

        let mut gpus: Vec<GpuSnapshot> = controllers
            .into_iter()
            .enumerate()
            .map(|(index, controller)| gpu_snapshot(index as u32, controller))
            .collect();

        if gpus.is_empty() {
            gpus.push(GpuSnapshot::placeholder(NO_GPU_DETECTED));
        }

        Ok(SystemSnapshot { cpu, memory, gpus })
    }
}

fn gpu_snapshot(id: u32, controller: GraphicsController) -> GpuSnapshot {
    let mib_to_gib = |mib: Option<f64>| round_to(non_negative(mib.unwrap_or(0.0)) / MIB_PER_GIB, 1);

    GpuSnapshot {
        id,
        name: controller
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown GPU".to_string()),
        usage_percent: non_negative(controller.utilization_percent.unwrap_or(0.0)),
        memory: MemorySnapshot {
            used_gib: mib_to_gib(controller.memory_used_mib),
            total_gib: mib_to_gib(controller.memory_total_mib),
        },
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
