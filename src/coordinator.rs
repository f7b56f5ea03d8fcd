// 协调层模块入口

pub mod clash_coordinator;

pub use clash_coordinator::{ClashCoordinator, PortInfo, SUCCESS};
