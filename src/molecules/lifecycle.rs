// Clash 生命周期：首次启动（破坏式应用）与热更新（非破坏式应用）
//
// start 与 update 之间没有互斥，并发调用会竞争核心状态，需要宿主保证调用顺序

use std::path::Path;
use std::sync::Arc;

use crate::clash::config::ensure_config_file;
use crate::clash::{ControllerOptions, Engine, NormalizeOptions, RawConfig, normalize};
use crate::error::{BridgeError, Result};
use crate::services::BridgeContext;

pub struct LifecycleController<E: Engine> {
    engine: Arc<E>,
}

impl<E: Engine> LifecycleController<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    // 读取配置 → 规范化 → 启动控制 API → 破坏式应用
    //
    // 控制 API 在后台启动，绑定失败只记录日志，不会返回给调用方。
    // 需要在 Tokio 运行时上下文中调用。
    pub fn start(&self, context: &BridgeContext, options: &NormalizeOptions) -> Result<RawConfig> {
        log::info!("启动 Clash 核心，配置文件：{}", context.config_file().display());

        let raw = RawConfig::load(context.config_file())?;
        let normalized = normalize(raw, options)?;

        let config = self.engine.parse_raw_config(&normalized).map_err(|e| {
            log::error!("核心解析配置失败：{:#}", e);
            BridgeError::Parse(format!("{:#}", e))
        })?;

        self.spawn_controller(ControllerOptions {
            address: normalized.external_controller.clone(),
            secret: normalized.secret.clone(),
            ui_path: context.ui_path().map(Path::to_path_buf),
        });

        self.engine.apply_config(config, true).map_err(|e| {
            log::error!("应用配置失败：{:#}", e);
            BridgeError::Engine(format!("{:#}", e))
        })?;

        log::info!("Clash 核心已启动（mixed-port={}）", normalized.mixed_port);
        Ok(normalized)
    }

    // 由核心解析配置文件后热更新
    pub fn update(&self, path: &Path) -> Result<()> {
        log::info!("热更新配置：{}", path.display());

        ensure_config_file(path)?;

        let config = self.engine.parse_path(path).map_err(|e| {
            log::error!("核心解析配置失败：{:#}", e);
            BridgeError::Parse(format!("{:#}", e))
        })?;

        self.engine.apply_config(config, false).map_err(|e| {
            log::error!("热更新配置失败：{:#}", e);
            BridgeError::Engine(format!("{:#}", e))
        })?;

        log::info!("配置热更新完成");
        Ok(())
    }

    fn spawn_controller(&self, options: ControllerOptions) {
        if options.address.is_empty() {
            log::info!("外部控制器未配置，跳过控制 API 启动");
            return;
        }

        let engine = self.engine.clone();
        tokio::spawn(async move {
            log::info!("启动控制 API：{}", options.address);
            let address = options.address.clone();
            if let Err(e) = engine.serve_controller(options).await {
                log::error!("控制 API 运行失败（{}）：{:#}", address, e);
            }
        });
    }
}
