//! LLM Console Common Types
//!
//! Shared types used by the console client and the metrics server.

pub mod chat;
pub mod deployment;
pub mod model;
pub mod system;

pub use chat::{last_user_content, ChatMessage, Role};
pub use deployment::{DeployConfig, DeploymentRecord, DeploymentStatus};
pub use model::{ModelDetail, ModelDetails, ModelSummary};
pub use system::{
    is_placeholder_gpu, CpuSnapshot, GpuSnapshot, MemorySnapshot, SystemSnapshot, NO_GPU_DETECTED,
    MONITORING_OFFLINE,
};
