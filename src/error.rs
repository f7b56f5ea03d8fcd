// 桥接层错误类型
//
// 所有导出操作在边界处将错误转换为字符串返回给宿主

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    // 配置文件不存在或无法读取
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration file {} is empty", .0.display())]
    EmptyFile(PathBuf),

    // 配置内容格式错误，或被核心拒绝
    #[error("{0}")]
    Parse(String),

    #[error("No proxy found in config")]
    NoProxy,

    // 无法从系统获取空闲端口
    #[error("failed to allocate free port: {0}")]
    PortAllocation(#[source] io::Error),

    #[error("{0}")]
    Engine(String),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl From<serde_yaml_ng::Error> for BridgeError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        BridgeError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_names_path() {
        let err = BridgeError::EmptyFile(PathBuf::from("/tmp/clash/config.yaml"));
        assert_eq!(
            err.to_string(),
            "Configuration file /tmp/clash/config.yaml is empty"
        );
    }

    #[test]
    fn test_no_proxy_message() {
        assert_eq!(BridgeError::NoProxy.to_string(), "No proxy found in config");
    }
}
