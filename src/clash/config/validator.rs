// 配置校验：由核心解析配置内容，确认至少包含一个代理节点

use crate::clash::Engine;
use crate::error::{BridgeError, Result};

// 校验配置内容，返回核心解析出的代理数量
pub fn verify_config<E: Engine>(engine: &E, content: &str) -> Result<usize> {
    log::debug!("开始校验配置（长度：{} 字符）", content.len());

    if content.trim().is_empty() {
        log::warn!("配置内容为空");
        return Err(BridgeError::NoProxy);
    }

    let config = engine.parse_bytes(content.as_bytes()).map_err(|e| {
        log::warn!("核心解析配置失败：{:#}", e);
        BridgeError::Parse(format!("{:#}", e))
    })?;

    let proxy_count = engine.proxy_count(&config);
    if proxy_count == 0 {
        log::warn!("配置中没有代理节点");
        return Err(BridgeError::NoProxy);
    }

    log::info!("配置校验通过（{} 个代理节点）", proxy_count);
    Ok(proxy_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;
    use std::sync::atomic::Ordering;

    const VALID: &str = r#"
proxies:
  - name: hk
    type: trojan
    server: example.com
    port: 443
    password: pw
"#;

    #[test]
    fn test_empty_proxy_list() {
        let engine = FakeEngine::new();
        let err = verify_config(&engine, "mixed-port: 7890\nproxies: []\n").unwrap_err();
        assert_eq!(err.to_string(), "No proxy found in config");
    }

    #[test]
    fn test_missing_proxy_list() {
        let engine = FakeEngine::new();
        let err = verify_config(&engine, "mixed-port: 7890\n").unwrap_err();
        assert!(matches!(err, BridgeError::NoProxy));
    }

    #[test]
    fn test_blank_content() {
        let engine = FakeEngine::new();
        assert!(matches!(
            verify_config(&engine, "  \n").unwrap_err(),
            BridgeError::NoProxy
        ));
    }

    #[test]
    fn test_non_mapping_entries_do_not_count() {
        let engine = FakeEngine::new();
        let err = verify_config(&engine, "proxies:\n  - just-a-string\n").unwrap_err();
        assert!(matches!(err, BridgeError::NoProxy));
    }

    #[test]
    fn test_malformed_content() {
        let engine = FakeEngine::new();
        let err = verify_config(&engine, "proxies: [").unwrap_err();
        assert!(matches!(err, BridgeError::Parse(_)));
    }

    #[test]
    fn test_engine_rejection_is_reported() {
        let engine = FakeEngine::new();
        engine.fail_parse.store(true, Ordering::SeqCst);

        let err = verify_config(&engine, VALID).unwrap_err();
        assert!(matches!(err, BridgeError::Parse(_)));
        assert!(err.to_string().contains("proxy group[0]"));
    }

    #[test]
    fn test_valid_config() {
        let engine = FakeEngine::new();
        assert_eq!(verify_config(&engine, VALID).unwrap(), 1);
    }
}
