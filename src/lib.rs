// Clash Bridge
//
// 宿主应用与 Clash 核心之间的控制面桥接：
// 规范化用户配置、协商空闲端口，并将核心日志与流量转发给宿主

pub mod atoms;
pub mod clash;
pub mod coordinator;
pub mod error;
pub mod logger;
pub mod molecules;
pub mod services;

#[cfg(test)]
mod testing;

pub use clash::{
    ControllerOptions, Engine, GeneralSettings, LogEvent, LogLevel, NormalizeOptions, RawConfig,
    TrafficSample,
};
pub use coordinator::{ClashCoordinator, PortInfo};
pub use error::{BridgeError, Result};
pub use molecules::{EventBridge, HostSink, Subscription};
pub use services::BridgeContext;
