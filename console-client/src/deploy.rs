//! Deployment defaults derived from the host snapshot.
//!
//! Placeholder GPU entries never count as hardware here: they neither enable
//! layer offload nor multi-GPU selection.

use std::collections::BTreeSet;

use console_common::{DeployConfig, SystemSnapshot};

/// `gpu_layers` value meaning "offload every layer".
pub const ALL_GPU_LAYERS: u32 = 100;

const LARGE_CONTEXT: u32 = 8192;
const DEFAULT_CONTEXT: u32 = 4096;

/// Whether any real GPU is available for layer offload.
pub fn gpu_offload_available(snapshot: &SystemSnapshot) -> bool {
    snapshot.usable_gpus().next().is_some()
}

/// Multi-GPU selection is only offered with more than one real GPU.
pub fn multi_gpu_selectable(snapshot: &SystemSnapshot) -> bool {
    snapshot.usable_gpus().nth(1).is_some()
}

/// Parameter count in billions, from the first `<digits>b` in the model name.
pub fn parameter_billions(model_name: &str) -> Option<u32> {
    let name = model_name.to_ascii_lowercase();
    let bytes = name.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if bytes.get(i) == Some(&b'b') {
            return name[start..i].parse().ok();
        }
    }
    None
}

pub fn recommended_context_size(model_name: &str) -> u32 {
    match parameter_billions(model_name) {
        Some(34) | Some(70) => LARGE_CONTEXT,
        _ => DEFAULT_CONTEXT,
    }
}

/// Half the host threads, between 2 and 8.
pub fn recommended_threads(snapshot: &SystemSnapshot) -> u32 {
    (snapshot.cpu.threads / 2).clamp(2, 8)
}

pub fn recommended_config(model_name: &str, snapshot: &SystemSnapshot) -> DeployConfig {
    let first_gpu = snapshot.usable_gpus().next();

    DeployConfig {
        threads: recommended_threads(snapshot),
        context_size_tokens: recommended_context_size(model_name),
        gpu_layers: if first_gpu.is_some() { ALL_GPU_LAYERS } else { 0 },
        selected_gpu_ids: first_gpu.map(|g| g.id).into_iter().collect::<BTreeSet<_>>(),
        ..DeployConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_common::{
        CpuSnapshot, GpuSnapshot, MemorySnapshot, MONITORING_OFFLINE, NO_GPU_DETECTED,
    };

    fn snapshot(threads: u32, gpus: Vec<GpuSnapshot>) -> SystemSnapshot {
        SystemSnapshot {
            cpu: CpuSnapshot {
                usage_percent: 3.0,
                cores: threads / 2,
                threads,
            },
            memory: MemorySnapshot {
                used_gib: 8.0,
                total_gib: 32.0,
            },
            gpus,
        }
    }

    fn gpu(id: u32, name: &str) -> GpuSnapshot {
        GpuSnapshot {
            id,
            name: name.to_string(),
            usage_percent: 0.0,
            memory: MemorySnapshot {
                used_gib: 0.5,
                total_gib: 24.0,
            },
        }
    }

    #[test]
    fn test_parameter_billions() {
        assert_eq!(parameter_billions("llama2:70b"), Some(70));
        assert_eq!(parameter_billions("codellama:34b-instruct"), Some(34));
        assert_eq!(parameter_billions("llama3.2:3B"), Some(3));
        assert_eq!(parameter_billions("mixtral:8x7b"), Some(7));
        assert_eq!(parameter_billions("mistral:latest"), None);
    }

    #[test]
    fn test_context_size() {
        assert_eq!(recommended_context_size("llama2:70b"), 8192);
        assert_eq!(recommended_context_size("codellama:34b"), 8192);
        assert_eq!(recommended_context_size("llama3:8b"), 4096);
        assert_eq!(recommended_context_size("mistral"), 4096);
    }

    #[test]
    fn test_thread_bounds() {
        assert_eq!(recommended_threads(&snapshot(2, vec![])), 2);
        assert_eq!(recommended_threads(&snapshot(12, vec![])), 6);
        assert_eq!(recommended_threads(&snapshot(64, vec![])), 8);
    }

    #[test]
    fn test_placeholders_disable_gpu_options() {
        for name in [NO_GPU_DETECTED, MONITORING_OFFLINE] {
            let s = snapshot(16, vec![gpu(0, name)]);
            assert!(!gpu_offload_available(&s));
            assert!(!multi_gpu_selectable(&s));

            let config = recommended_config("llama3:8b", &s);
            assert_eq!(config.gpu_layers, 0);
            assert!(config.selected_gpu_ids.is_empty());
        }
    }

    #[test]
    fn test_single_gpu() {
        let s = snapshot(16, vec![gpu(0, "NVIDIA GeForce RTX 4090")]);
        assert!(gpu_offload_available(&s));
        assert!(!multi_gpu_selectable(&s));

        let config = recommended_config("llama2:70b", &s);
        assert_eq!(config.threads, 8);
        assert_eq!(config.context_size_tokens, 8192);
        assert_eq!(config.gpu_layers, ALL_GPU_LAYERS);
        assert_eq!(config.selected_gpu_ids, BTreeSet::from([0]));
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.parallel_executions, 1);
    }

    #[test]
    fn test_multi_gpu_ignores_placeholders() {
        let s = snapshot(
            16,
            vec![gpu(0, NO_GPU_DETECTED), gpu(1, "RTX A6000"), gpu(2, "RTX A6000")],
        );
        assert!(multi_gpu_selectable(&s));
        assert_eq!(
            recommended_config("x", &s).selected_gpu_ids,
            BTreeSet::from([1])
        );
    }
}
