//! Sensor source backed by the running host.

use async_trait::async_trait;
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};

use super::{nvidia, platform, CpuIdentity, GraphicsController, MemoryReading, SensorSource};
use crate::error::{Error, Result};

/// Reads CPU and memory through `sysinfo`.
///
/// GPUs come from nvidia-smi when it reports any, otherwise from the
/// platform's own device listing.
pub struct HostSensors {
    nvidia_smi: String,
}

impl HostSensors {
    pub fn new(nvidia_smi: &str) -> Self {
        Self {
            nvidia_smi: nvidia_smi.to_string(),
        }
    }
}

/// sysinfo calls block, so each read runs on the blocking pool.
async fn blocking<T, F>(read: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .map_err(|e| Error::SensorRead(format!("sensor task failed: {}", e)))?
}

#[async_trait]
impl SensorSource for HostSensors {
    async fn cpu_identity(&self) -> Result<CpuIdentity> {
        blocking(|| {
            let mut sys = System::new();
            sys.refresh_cpu_usage();

            let threads = sys.cpus().len();
            if threads == 0 {
                return Err(Error::SensorRead("no CPUs reported".to_string()));
            }

            Ok(CpuIdentity {
                physical_cores: sys.physical_core_count().map(|c| c as u32),
                logical_threads: Some(threads as u32),
            })
        })
        .await
    }

    async fn cpu_load(&self) -> Result<f64> {
        blocking(|| {
            // Usage is computed from the difference between two refreshes.
            let mut sys = System::new();
            sys.refresh_cpu_usage();
            std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu_usage();

            if sys.cpus().is_empty() {
                return Err(Error::SensorRead("no CPUs reported".to_string()));
            }
            Ok(sys.global_cpu_usage() as f64)
        })
        .await
    }

    async fn memory(&self) -> Result<MemoryReading> {
        blocking(|| {
            let mut sys = System::new();
            sys.refresh_memory();

            let total_bytes = sys.total_memory();
            if total_bytes == 0 {
                return Err(Error::SensorRead("memory totals unavailable".to_string()));
            }

            Ok(MemoryReading {
                used_bytes: sys.used_memory(),
                total_bytes,
            })
        })
        .await
    }

    async fn graphics(&self) -> Result<Vec<GraphicsController>> {
        let controllers = nvidia::enumerate(&self.nvidia_smi).await?;
        if !controllers.is_empty() {
            return Ok(controllers);
        }
        platform::enumerate().await
    }
}
