//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, IndexConfig, LogFormat, LoggingConfig, OpenAiConfig, ProvidersConfig, ServerConfig,
};
