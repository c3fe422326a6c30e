//! LLM Console client - inference server gateway, deployment registry and
//! persisted console state.

pub mod config;
pub mod deploy;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod modelfile;
pub mod preferences;
pub mod registry;
pub mod store;
pub mod test_util;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{ChatReply, GatewayClient, RunningModel, TypingReveal};
pub use metrics::MetricsClient;
pub use modelfile::ModelfileTemplate;
pub use preferences::Preferences;
pub use registry::{DeploymentRegistry, RunningModelSource};
pub use store::{FileStore, KeyValueStore, MemoryStore};
