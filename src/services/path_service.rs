// 桥接层路径上下文
//
// 保存核心 home 目录、配置文件与 UI 资源路径。
// 上下文不可变，修改时生成新快照，每次操作开始时读取一次。

use std::path::{Path, PathBuf};

// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "config.yaml";
// GeoIP 数据库文件名
pub const MMDB_FILE_NAME: &str = "Country.mmdb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeContext {
    // 核心 home 目录
    home_dir: PathBuf,

    // 配置文件（绝对路径，或相对 home 目录解析后的路径）
    config_file: PathBuf,

    // 外部 UI 资源目录
    ui_path: Option<PathBuf>,
}

impl BridgeContext {
    // 以 home 目录初始化，配置文件为 <home>/config.yaml
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        let home_dir = home_dir.into();
        let config_file = home_dir.join(CONFIG_FILE_NAME);

        Self {
            home_dir,
            config_file,
            ui_path: None,
        }
    }

    // 默认 home 目录：$HOME/.config/clash，无法获取时使用当前目录
    pub fn default_home_dir() -> PathBuf {
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config").join("clash"),
            Err(e) => {
                log::warn!("无法获取 HOME 环境变量：{}，使用当前目录", e);
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            }
        }
    }

    // 更换 home 目录（配置文件路径保持不变）
    pub fn with_home_dir(&self, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            ..self.clone()
        }
    }

    // 更换配置文件，相对路径按 home 目录解析
    pub fn with_config_file(&self, path: impl AsRef<Path>) -> Self {
        Self {
            config_file: self.resolve(path),
            ..self.clone()
        }
    }

    pub fn with_ui_path(&self, path: impl AsRef<Path>) -> Self {
        Self {
            ui_path: Some(self.resolve(path)),
            ..self.clone()
        }
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn ui_path(&self) -> Option<&Path> {
        self.ui_path.as_deref()
    }

    pub fn mmdb_file(&self) -> PathBuf {
        self.home_dir.join(MMDB_FILE_NAME)
    }

    // 将相对路径解析到 home 目录下
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.home_dir.join(path)
        }
    }
}

impl Default for BridgeContext {
    fn default() -> Self {
        Self::new(Self::default_home_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_home() {
        let ctx = BridgeContext::new("/data/clash");
        assert_eq!(ctx.config_file(), Path::new("/data/clash/config.yaml"));
        assert_eq!(ctx.mmdb_file(), PathBuf::from("/data/clash/Country.mmdb"));
        assert!(ctx.ui_path().is_none());
    }

    #[test]
    fn test_relative_paths_resolve_against_home() {
        let ctx = BridgeContext::new("/data/clash")
            .with_config_file("profiles/work.yaml")
            .with_ui_path("ui");

        assert_eq!(
            ctx.config_file(),
            Path::new("/data/clash/profiles/work.yaml")
        );
        assert_eq!(ctx.ui_path(), Some(Path::new("/data/clash/ui")));
    }

    #[test]
    fn test_absolute_config_file_kept() {
        let ctx = BridgeContext::new("/data/clash").with_config_file("/etc/clash.yaml");
        assert_eq!(ctx.config_file(), Path::new("/etc/clash.yaml"));
    }

    #[test]
    fn test_home_dir_change_keeps_config_file() {
        let ctx = BridgeContext::new("/data/clash");
        let moved = ctx.with_home_dir("/tmp/other");

        assert_eq!(moved.home_dir(), Path::new("/tmp/other"));
        assert_eq!(moved.config_file(), ctx.config_file());
        assert_eq!(moved.mmdb_file(), PathBuf::from("/tmp/other/Country.mmdb"));
        // 原快照不受影响
        assert_eq!(ctx.home_dir(), Path::new("/data/clash"));
    }
}
