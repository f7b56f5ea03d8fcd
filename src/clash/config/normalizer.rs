// Clash 配置规范化：端口协商与覆盖规则
//
// 将用户配置整理为可直接交给核心的配置：
// - 合并 port / socks-port 到 mixed-port，保证同一端口只被一个监听器声明
// - 应用 secret 与外部控制器覆盖
// - 关闭内置 UI 与代理选择持久化
// - 按需检查端口占用并重新分配

use crate::atoms::{check_port_available, get_free_port, is_address_valid};
use crate::error::Result;

use super::raw_config::RawConfig;

// 未配置任何代理端口时使用的默认混合端口
pub const DEFAULT_MIXED_PORT: i32 = 7890;

// 规范化参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    // 是否检查端口占用（同时启用 allow_lan 覆盖）
    pub check_port: bool,
    pub allow_lan: bool,
    // 大于 0 时强制作为 mixed-port
    pub proxy_port_override: i32,
    // 非空时覆盖 external-controller
    pub external_controller_override: String,
    // 非空时覆盖 secret
    pub secret_override: String,
}

// 规范化原始配置
pub fn normalize(mut raw: RawConfig, options: &NormalizeOptions) -> Result<RawConfig> {
    // 1. 代理端口
    if options.proxy_port_override > 0 {
        raw.mixed_port = options.proxy_port_override;
        log::debug!("使用指定代理端口：{}", raw.mixed_port);
        clear_duplicate_ports(&mut raw);
    } else if raw.mixed_port == 0 {
        if raw.port > 0 {
            raw.mixed_port = raw.port;
            raw.port = 0;
        } else if raw.socks_port > 0 {
            raw.mixed_port = raw.socks_port;
            raw.socks_port = 0;
        } else {
            raw.mixed_port = DEFAULT_MIXED_PORT;
        }
        log::debug!("未设置 mixed-port，选用：{}", raw.mixed_port);
        clear_duplicate_ports(&mut raw);
    }

    // 2. secret 覆盖
    if !options.secret_override.is_empty() {
        raw.secret = options.secret_override.clone();
        log::debug!("已应用 secret 覆盖");
    }

    // 3. 嵌入模式下不提供内置 UI，也不持久化代理选择
    raw.external_ui.clear();
    raw.profile.store_selected = false;

    // 4. 外部控制器覆盖
    if !options.external_controller_override.is_empty() {
        raw.external_controller = options.external_controller_override.clone();
        log::debug!("外部控制器覆盖为：{}", raw.external_controller);
    }

    // 5. 端口检查
    if options.check_port {
        if !is_address_valid(&raw.external_controller) {
            let port = get_free_port()?;
            log::info!(
                "外部控制器地址不可用（{}），改用 127.0.0.1:{}",
                raw.external_controller,
                port
            );
            raw.external_controller = format!("127.0.0.1:{}", port);
            // 仅本地回环访问，不需要凭据
            raw.secret.clear();
        }

        raw.allow_lan = options.allow_lan;

        if !check_port_available(raw.mixed_port) {
            match get_free_port() {
                Ok(port) => {
                    log::info!("混合端口 {} 已被占用，改用：{}", raw.mixed_port, port);
                    raw.mixed_port = i32::from(port);
                }
                Err(e) => {
                    log::warn!("混合端口 {} 已被占用，且分配新端口失败：{}", raw.mixed_port, e);
                }
            }
        }
    }

    log::info!(
        "配置规范化完成：mixed-port={}，port={}，socks-port={}，external-controller={}，allow-lan={}",
        raw.mixed_port,
        raw.port,
        raw.socks_port,
        raw.external_controller,
        raw.allow_lan
    );

    Ok(raw)
}

// 清除与 mixed-port 相同的 port / socks-port
fn clear_duplicate_ports(raw: &mut RawConfig) {
    if raw.port == raw.mixed_port {
        raw.port = 0;
    }
    if raw.socks_port == raw.mixed_port {
        raw.socks_port = 0;
    }
}
