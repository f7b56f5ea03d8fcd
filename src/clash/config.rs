// Clash 配置模块

pub mod normalizer;
pub mod raw_config;
pub mod validator;

pub use normalizer::{DEFAULT_MIXED_PORT, NormalizeOptions, normalize};
pub use raw_config::{ProfileConfig, RawConfig, ensure_config_file, read_config};
pub use validator::verify_config;
