mod config;
mod host;

pub use config::{HostConfig, SpawnPoint, load_host_config};
pub use host::HostSession;
