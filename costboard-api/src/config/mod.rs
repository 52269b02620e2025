pub mod provider;
pub mod settings;

pub use provider::ProviderManager;
pub use settings::{AppMode, ConfigError, Settings};
