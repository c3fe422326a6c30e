pub mod mock_ollama;

use console_common::{CpuSnapshot, GpuSnapshot, MemorySnapshot, SystemSnapshot};

use crate::gateway::{GatewayClient, TypingReveal};

/// Gateway client for a mock server, with the typing reveal disabled.
pub fn test_gateway(base_url: &str) -> GatewayClient {
    GatewayClient::new(base_url).with_typing(TypingReveal::instant())
}

/// A 16-thread host with the given GPU names, in enumeration order.
pub fn test_snapshot(gpu_names: &[&str]) -> SystemSnapshot {
    SystemSnapshot {
        cpu: CpuSnapshot {
            usage_percent: 12.5,
            cores: 8,
            threads: 16,
        },
        memory: MemorySnapshot {
            used_gib: 12.25,
            total_gib: 31.5,
        },
        gpus: gpu_names
            .iter()
            .enumerate()
            .map(|(id, name)| GpuSnapshot {
                id: id as u32,
                name: name.to_string(),
                usage_percent: 7.0,
                memory: MemorySnapshot {
                    used_gib: 1.5,
                    total_gib: 24.0,
                },
            })
            .collect(),
    }
}
