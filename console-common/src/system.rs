//! Host resource snapshots reported by the metrics server.
//!
//! Field names on the wire follow the metrics endpoint contract:
//! `cpu.usage`, `cpu.cores`, `cpu.threads`, `memory.used`, `memory.total`,
//! `gpus[].id|name|usage|memory.used|memory.total`.

use serde::{Deserialize, Serialize};

/// Name of the placeholder GPU entry reported when the host has no graphics controller.
pub const NO_GPU_DETECTED: &str = "No dedicated GPU detected";

/// Name of the placeholder GPU entry used when the metrics server cannot be reached.
pub const MONITORING_OFFLINE: &str = "Monitoring server offline - start the metrics server";

/// Whether a GPU entry is a placeholder rather than real hardware.
///
/// Placeholders must never enable GPU offload or multi-GPU selection.
pub fn is_placeholder_gpu(name: &str) -> bool {
    let name = name.trim();
    name.eq_ignore_ascii_case(NO_GPU_DETECTED)
        || name
            .to_ascii_lowercase()
            .starts_with("monitoring server offline")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    /// Utilization in percent, 0..=100, one decimal.
    #[serde(rename = "usage")]
    pub usage_percent: f64,
    pub cores: u32,
    pub threads: u32,
}

/// Memory figures in GiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    #[serde(rename = "used")]
    pub used_gib: f64,
    #[serde(rename = "total")]
    pub total_gib: f64,
}

/// A single graphics controller.
///
/// `id` is the position in the host's enumeration, not a stable hardware handle.
/// `memory.used_gib <= memory.total_gib` is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSnapshot {
    pub id: u32,
    pub name: String,
    #[serde(rename = "usage")]
    pub usage_percent: f64,
    pub memory: MemorySnapshot,
}

impl GpuSnapshot {
    /// All-zero entry carrying a sentinel name.
    pub fn placeholder(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            usage_percent: 0.0,
            memory: MemorySnapshot::default(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        is_placeholder_gpu(&self.name)
    }
}

/// Point-in-time view of host CPU, memory and GPUs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu: CpuSnapshot,
    pub memory: MemorySnapshot,
    pub gpus: Vec<GpuSnapshot>,
}

impl SystemSnapshot {
    /// Fixed snapshot shown when the metrics server is unreachable.
    pub fn offline() -> Self {
        Self {
            cpu: CpuSnapshot {
                usage_percent: 0.0,
                cores: 4,
                threads: 8,
            },
            memory: MemorySnapshot::default(),
            gpus: vec![GpuSnapshot::placeholder(MONITORING_OFFLINE)],
        }
    }

    /// GPUs that represent real hardware.
    pub fn usable_gpus(&self) -> impl Iterator<Item = &GpuSnapshot> {
        self.gpus.iter().filter(|g| !g.is_placeholder())
    }

    /// Memory utilization in percent, 0 when the total is unknown.
    pub fn memory_usage_percent(&self) -> f64 {
        if self.memory.total_gib > 0.0 {
            self.memory.used_gib / self.memory.total_gib * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let snapshot = SystemSnapshot {
            cpu: CpuSnapshot {
                usage_percent: 12.5,
                cores: 8,
                threads: 16,
            },
            memory: MemorySnapshot {
                used_gib: 10.25,
                total_gib: 31.9,
            },
            gpus: vec![GpuSnapshot::placeholder(NO_GPU_DETECTED)],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["cpu"]["usage"], 12.5);
        assert_eq!(value["cpu"]["threads"], 16);
        assert_eq!(value["memory"]["used"], 10.25);
        assert_eq!(value["gpus"][0]["name"], NO_GPU_DETECTED);
        assert_eq!(value["gpus"][0]["memory"]["total"], 0.0);
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder_gpu(NO_GPU_DETECTED));
        assert!(is_placeholder_gpu(MONITORING_OFFLINE));
        assert!(is_placeholder_gpu("monitoring server offline..."));
        assert!(!is_placeholder_gpu("NVIDIA GeForce RTX 4090"));
    }

    #[test]
    fn test_offline_snapshot_has_no_usable_gpus() {
        let snapshot = SystemSnapshot::offline();
        assert_eq!(snapshot.gpus.len(), 1);
        assert_eq!(snapshot.usable_gpus().count(), 0);
    }

    #[test]
    fn test_memory_usage_percent_handles_zero_total() {
        let snapshot = SystemSnapshot::offline();
        assert_eq!(snapshot.memory_usage_percent(), 0.0);
    }
}
