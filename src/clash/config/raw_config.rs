// Clash 原始配置
//
// 只解析桥接层需要读写的字段，其余字段原样保留并交给核心

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value as YamlValue};

use crate::error::{BridgeError, Result};

// 用户编写的原始配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RawConfig {
    // 端口配置（0 表示未设置）
    pub mixed_port: i32,
    pub port: i32,
    pub socks_port: i32,

    // 外部控制器
    pub external_controller: String,
    pub secret: String,

    pub allow_lan: bool,
    pub external_ui: String,
    pub profile: ProfileConfig,

    pub proxies: Vec<YamlValue>,

    // 其余字段（rules、proxy-groups、dns 等）
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProfileConfig {
    pub store_selected: bool,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl RawConfig {
    // 从 YAML 文本解析
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).map_err(|e| {
            log::error!("解析配置失败：{}", e);
            BridgeError::Parse(format!("解析配置失败：{}", e))
        })
    }

    // 读取并解析配置文件
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_config(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// 读取配置文件内容，文件不存在或为空时返回错误
pub fn read_config(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        log::warn!("读取配置文件失败：{}，error：{}", path.display(), source);
        BridgeError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if content.is_empty() {
        log::warn!("配置文件为空：{}", path.display());
        return Err(BridgeError::EmptyFile(path.to_path_buf()));
    }

    log::trace!("已读取配置文件：{}（{} 字节）", path.display(), content.len());
    Ok(content)
}

// 检查配置文件存在且非空（不读取内容）
pub fn ensure_config_file(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|source| {
        log::warn!("配置文件不可用：{}，error：{}", path.display(), source);
        BridgeError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if metadata.len() == 0 {
        log::warn!("配置文件为空：{}", path.display());
        return Err(BridgeError::EmptyFile(path.to_path_buf()));
    }

    Ok(())
}
