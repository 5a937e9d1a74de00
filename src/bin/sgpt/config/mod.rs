mod error;
mod load;
mod paths;
mod save;
mod types;

pub use load::load_config;
pub use paths::{expand_home, ConfigPaths};
pub use types::{AppConfig, LoggingConfig};
