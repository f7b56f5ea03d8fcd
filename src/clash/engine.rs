// Clash 核心接口
//
// 代理核心、控制 API 服务与 GeoIP 查询均由外部实现，
// 桥接层只依赖这里定义的能力

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::config::RawConfig;

// 日志级别（与核心日志事件的类型字段一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Silent,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Silent => "silent",
        }
    }
}

// 核心发布的日志事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub payload: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, payload: impl Into<String>) -> Self {
        Self {
            level,
            payload: payload.into(),
        }
    }
}

// 累计流量（字节）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub upload: i64,
    pub download: i64,
}

// 核心当前的通用配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneralSettings {
    pub port: i32,
    pub socks_port: i32,
    pub mixed_port: i32,
    pub allow_lan: bool,
    pub bind_address: String,
    pub mode: String,
    pub log_level: String,
    pub external_controller: String,
    pub secret: String,
}

// 控制 API 启动参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerOptions {
    pub address: String,
    pub secret: String,
    // 外部 UI 资源目录，未设置时不提供 UI
    pub ui_path: Option<PathBuf>,
}

// 代理核心
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    // 核心内部的已解析配置
    type Config: Send + 'static;

    // 将规范化后的配置交给核心解析
    fn parse_raw_config(&self, raw: &RawConfig) -> anyhow::Result<Self::Config>;

    // 由核心直接读取并解析配置文件
    fn parse_path(&self, path: &Path) -> anyhow::Result<Self::Config>;

    // 解析原始配置内容（用于校验，不会应用）
    fn parse_bytes(&self, content: &[u8]) -> anyhow::Result<Self::Config>;

    // 已解析配置中的代理数量
    fn proxy_count(&self, config: &Self::Config) -> usize;

    // 应用配置；force 为 true 时销毁现有监听器与状态后重建
    fn apply_config(&self, config: Self::Config, force: bool) -> anyhow::Result<()>;

    // 运行控制 API 服务，正常情况下不会返回
    async fn serve_controller(&self, options: ControllerOptions) -> anyhow::Result<()>;

    // 订阅日志流；发送端满时由核心阻塞等待
    fn subscribe_logs(&self) -> mpsc::Receiver<LogEvent>;

    // 读取当前累计流量
    fn traffic_now(&self) -> TrafficSample;

    fn general(&self) -> GeneralSettings;

    // 关闭所有活动连接，返回关闭数量
    fn close_all_connections(&self) -> usize;

    // 打开 GeoIP 数据库并查询一次
    fn verify_geoip(&self, mmdb_path: &Path, probe: IpAddr) -> anyhow::Result<()>;

    // 查询 IP 的国家代码
    fn country_for_ip(&self, ip: IpAddr) -> Option<String>;
}
