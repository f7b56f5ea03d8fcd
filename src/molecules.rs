// 桥接层功能模块

pub mod event_bridge;
pub mod lifecycle;
pub mod secret_override;

pub use event_bridge::{EventBridge, HostSink, Subscription, SubscriptionId};
pub use lifecycle::LifecycleController;
pub use secret_override::{SecretOverride, check_secret};
