pub mod loader;
pub mod model;

pub use loader::ConfigLoader;
pub use model::{
    AppConfig, ConsoleConfig, DatabaseConfig, FingerprintConfig, GatewayConfig, LlmConfig,
    SpeechConfig,
};
