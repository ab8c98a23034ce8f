mod loader;

pub use loader::{Config, PollingConfig, TimeoutConfig};
