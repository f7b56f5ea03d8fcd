// Clash 协调器：宿主可调用的控制接口
//
// 每个操作在边界处捕获错误，以字符串（"success" 或错误信息）返回给宿主

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::clash::{Engine, NormalizeOptions, RawConfig, verify_config};
use crate::error::Result;
use crate::molecules::{
    EventBridge, HostSink, LifecycleController, SecretOverride, Subscription, check_secret,
};
use crate::services::BridgeContext;

pub const SUCCESS: &str = "success";

// 校验 GeoIP 数据库时查询的地址
const GEOIP_PROBE_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(114, 114, 114, 114));

// run 的返回值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortInfo {
    pub external_controller: String,
    pub secret: String,
}

pub struct ClashCoordinator<E: Engine> {
    engine: Arc<E>,
    context: RwLock<Arc<BridgeContext>>,
    secret_override: SecretOverride,
    lifecycle: LifecycleController<E>,
    events: EventBridge,
}

impl<E: Engine> ClashCoordinator<E> {
    // 初始化核心状态：配置文件为 <home_dir>/config.yaml
    pub fn new(engine: Arc<E>, sink: Arc<dyn HostSink>, home_dir: impl Into<PathBuf>) -> Self {
        Self::with_context(engine, sink, BridgeContext::new(home_dir))
    }

    pub fn with_context(engine: Arc<E>, sink: Arc<dyn HostSink>, context: BridgeContext) -> Self {
        crate::logger::init_logger();
        log::info!(
            "初始化 Clash 协调器，home 目录：{}",
            context.home_dir().display()
        );

        Self {
            lifecycle: LifecycleController::new(engine.clone()),
            engine,
            context: RwLock::new(Arc::new(context)),
            secret_override: SecretOverride::new(),
            events: EventBridge::new(sink),
        }
    }

    // 替换事件桥（用于自定义流量采样周期）
    pub fn with_event_bridge(mut self, events: EventBridge) -> Self {
        self.events = events;
        self
    }

    // 当前上下文快照
    pub fn context(&self) -> Arc<BridgeContext> {
        self.context
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn update_context(&self, f: impl FnOnce(&BridgeContext) -> BridgeContext) {
        let mut guard = self.context.write().unwrap_or_else(|e| e.into_inner());
        let next = f(&guard);
        *guard = Arc::new(next);
    }

    pub fn set_home_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::info!("设置 home 目录：{}", path.display());
        self.update_context(|ctx| ctx.with_home_dir(path));
    }

    pub fn set_config_path(&self, path: impl AsRef<Path>) {
        log::info!("设置配置文件：{}", path.as_ref().display());
        self.update_context(|ctx| ctx.with_config_file(path));
    }

    pub fn set_ui_path(&self, path: impl AsRef<Path>) {
        log::info!("设置 UI 路径：{}", path.as_ref().display());
        self.update_context(|ctx| ctx.with_ui_path(path));
    }

    // 读取原始配置并以 JSON 返回
    pub fn get_raw_config(&self) -> std::result::Result<String, String> {
        let context = self.context();
        RawConfig::load(context.config_file())
            .and_then(|raw| raw.to_json())
            .map_err(|e| e.to_string())
    }

    fn start_internal(
        &self,
        check_port: bool,
        allow_lan: bool,
        proxy_port: i32,
        external_controller: &str,
    ) -> Result<RawConfig> {
        let context = self.context();
        let options = NormalizeOptions {
            check_port,
            allow_lan,
            proxy_port_override: proxy_port,
            external_controller_override: external_controller.to_string(),
            secret_override: self.secret_override.get(),
        };
        self.lifecycle.start(&context, &options)
    }

    // 启动核心，返回规范化后的完整配置 JSON
    pub fn start(
        &self,
        check_port: bool,
        allow_lan: bool,
        proxy_port: i32,
        external_controller: &str,
    ) -> std::result::Result<String, String> {
        self.start_internal(check_port, allow_lan, proxy_port, external_controller)
            .and_then(|normalized| normalized.to_json())
            .map_err(|e| e.to_string())
    }

    // 启动核心，返回 {"externalController","secret"} JSON 或错误信息
    pub fn run(
        &self,
        check_port: bool,
        allow_lan: bool,
        proxy_port: i32,
        external_controller: &str,
    ) -> String {
        let result = self
            .start_internal(check_port, allow_lan, proxy_port, external_controller)
            .and_then(|normalized| {
                let info = PortInfo {
                    external_controller: normalized.external_controller,
                    secret: normalized.secret,
                };
                Ok(serde_json::to_string(&info)?)
            });

        match result {
            Ok(json) => json,
            Err(e) => {
                log::error!("启动 Clash 核心失败：{}", e);
                e.to_string()
            }
        }
    }

    // 校验配置内容是否至少包含一个代理
    pub fn verify_config(&self, content: &str) -> String {
        match verify_config(self.engine.as_ref(), content) {
            Ok(_) => SUCCESS.to_string(),
            Err(e) => e.to_string(),
        }
    }

    // 热更新配置
    pub fn update_config(&self, path: impl AsRef<Path>) -> String {
        let path = self.context().resolve(path);
        match self.lifecycle.update(&path) {
            Ok(()) => SUCCESS.to_string(),
            Err(e) => e.to_string(),
        }
    }

    // 当前通用配置 JSON
    pub fn get_configs(&self) -> String {
        match serde_json::to_string(&self.engine.general()) {
            Ok(json) => json,
            Err(e) => e.to_string(),
        }
    }

    pub fn set_secret(&self, secret: impl Into<String>) {
        self.secret_override.set(secret);
    }

    // 配置文件中的 secret（未设置时为空）
    pub fn check_secret(&self) -> String {
        check_secret(&self.context())
    }

    pub fn verify_geoip_database(&self) -> bool {
        let mmdb = self.context().mmdb_file();
        match self.engine.verify_geoip(&mmdb, GEOIP_PROBE_IP) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("GeoIP 数据库不可用（{}）：{:#}", mmdb.display(), e);
                false
            }
        }
    }

    // IP 对应的国家代码，查询失败返回空字符串
    pub fn country_for_ip(&self, ip: &str) -> String {
        match ip.trim().parse::<IpAddr>() {
            Ok(addr) => self.engine.country_for_ip(addr).unwrap_or_default(),
            Err(e) => {
                log::debug!("无效的 IP 地址：{}，error：{}", ip, e);
                String::new()
            }
        }
    }

    pub fn close_all_connections(&self) -> usize {
        let closed = self.engine.close_all_connections();
        log::info!("已关闭 {} 个连接", closed);
        closed
    }

    // 开始向宿主转发日志（替换已有的日志转发任务）
    pub fn setup_logger(&self) -> Subscription {
        self.events.start_log_forwarding(self.engine.as_ref())
    }

    // 开始向宿主转发流量（替换已有的流量转发任务）
    pub fn setup_traffic(&self) -> Subscription {
        self.events.start_traffic_forwarding(self.engine.clone())
    }

    pub fn stop_logger(&self) -> bool {
        self.events.stop_log_forwarding()
    }

    pub fn stop_traffic(&self) -> bool {
        self.events.stop_traffic_forwarding()
    }
}
