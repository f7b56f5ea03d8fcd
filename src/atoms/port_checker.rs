// 端口可用性探测：短暂监听后立即释放，仅作参考。
// 探测结果在返回时即可能过期，不提供端口预留。

use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

use crate::error::{BridgeError, Result};

// 有效端口范围（两条校验路径共用）
pub const MIN_PORT: i32 = 1;
pub const MAX_PORT: i32 = 65534;

// 检查端口能否同时在 0.0.0.0 与 127.0.0.1 上监听
pub fn check_port_available(port: i32) -> bool {
    let Some(port) = u16::try_from(port)
        .ok()
        .filter(|p| (MIN_PORT..=MAX_PORT).contains(&i32::from(*p)))
    else {
        return false;
    };

    if let Err(e) = try_listen(Ipv4Addr::UNSPECIFIED, port) {
        log::warn!("端口检查失败 0.0.0.0:{}：{}", port, e);
        return false;
    }

    if let Err(e) = try_listen(Ipv4Addr::LOCALHOST, port) {
        log::warn!("端口检查失败 127.0.0.1:{}：{}", port, e);
        return false;
    }

    log::info!("端口 {} 检查通过", port);
    true
}

// 检查 "host:port" 形式的地址，端口部分取最后一个冒号之后的内容
pub fn is_address_valid(addr: &str) -> bool {
    if addr.is_empty() {
        return false;
    }

    let Some((_, tail)) = addr.rsplit_once(':') else {
        log::debug!("地址缺少端口：{}", addr);
        return false;
    };

    match tail.parse::<i32>() {
        Ok(port) if port > 0 => check_port_available(port),
        _ => {
            log::debug!("地址端口无效：{}", addr);
            false
        }
    }
}

// 向系统申请一个空闲端口（绑定 127.0.0.1:0 后立即释放）
pub fn get_free_port() -> Result<u16> {
    let listener = TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .map_err(BridgeError::PortAllocation)?;
    let port = listener
        .local_addr()
        .map_err(BridgeError::PortAllocation)?
        .port();
    drop(listener);

    log::debug!("分配空闲端口：{}", port);
    Ok(port)
}

fn try_listen(ip: Ipv4Addr, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(SocketAddrV4::new(ip, port))?;
    drop(listener);
    Ok(())
}
