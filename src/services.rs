// 基础服务模块

pub mod path_service;

pub use path_service::BridgeContext;
