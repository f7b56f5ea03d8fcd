// Clash 配置与核心接口

pub mod config;
pub mod engine;

pub use config::{NormalizeOptions, RawConfig, normalize, verify_config};
pub use engine::{ControllerOptions, Engine, GeneralSettings, LogEvent, LogLevel, TrafficSample};
