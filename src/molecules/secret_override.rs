// 控制 API secret 覆盖
//
// 宿主设置的 secret 在每次启动时显式传入规范化流程

use std::sync::RwLock;

use crate::clash::RawConfig;
use crate::services::BridgeContext;

// 空字符串表示未覆盖
#[derive(Debug, Default)]
pub struct SecretOverride {
    value: RwLock<String>,
}

impl SecretOverride {
    pub fn new() -> Self {
        Self::default()
    }

    // 覆盖 secret（无条件替换旧值）
    pub fn set(&self, secret: impl Into<String>) {
        let secret = secret.into();
        log::info!(
            "设置 secret 覆盖：{}",
            if secret.is_empty() { "清除" } else { "已设置" }
        );

        let mut guard = self.value.write().unwrap_or_else(|e| e.into_inner());
        *guard = secret;
    }

    pub fn get(&self) -> String {
        self.value.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

// 读取配置文件中的 secret，读取失败或未设置时返回空字符串
pub fn check_secret(context: &BridgeContext) -> String {
    match RawConfig::load(context.config_file()) {
        Ok(raw) => raw.secret,
        Err(e) => {
            log::debug!("读取配置 secret 失败：{}", e);
            String::new()
        }
    }
}
