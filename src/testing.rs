// 测试辅助：内存中的核心实现与记录型宿主接收端

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::clash::{
    ControllerOptions, Engine, GeneralSettings, LogEvent, RawConfig, TrafficSample,
};
use crate::molecules::HostSink;

const LOG_BUFFER: usize = 16;

#[derive(Default)]
pub struct FakeEngine {
    pub fail_parse: AtomicBool,
    pub fail_controller: AtomicBool,
    applied: Mutex<Vec<(RawConfig, bool)>>,
    controllers: Mutex<Vec<ControllerOptions>>,
    log_senders: Mutex<Vec<mpsc::Sender<LogEvent>>>,
    traffic: Mutex<TrafficSample>,
    connections: AtomicUsize,
    countries: Mutex<HashMap<IpAddr, String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<(RawConfig, bool)> {
        self.applied.lock().unwrap().clone()
    }

    pub fn controllers(&self) -> Vec<ControllerOptions> {
        self.controllers.lock().unwrap().clone()
    }

    // 向所有订阅者发布日志（通道满时等待）
    pub async fn publish(&self, event: LogEvent) {
        let senders = self.log_senders.lock().unwrap().clone();
        for sender in senders {
            let _ = sender.send(event.clone()).await;
        }
    }

    pub fn close_log_streams(&self) {
        self.log_senders.lock().unwrap().clear();
    }

    pub fn set_traffic(&self, sample: TrafficSample) {
        *self.traffic.lock().unwrap() = sample;
    }

    pub fn set_connections(&self, count: usize) {
        self.connections.store(count, Ordering::SeqCst);
    }

    pub fn set_country(&self, ip: IpAddr, code: &str) {
        self.countries.lock().unwrap().insert(ip, code.to_string());
    }
}

#[async_trait]
impl Engine for FakeEngine {
    type Config = RawConfig;

    fn parse_raw_config(&self, raw: &RawConfig) -> anyhow::Result<RawConfig> {
        if self.fail_parse.load(Ordering::SeqCst) {
            anyhow::bail!("proxy group[0]: 'proxies' missing");
        }
        Ok(raw.clone())
    }

    fn parse_path(&self, path: &Path) -> anyhow::Result<RawConfig> {
        let raw = RawConfig::load(path)?;
        self.parse_raw_config(&raw)
    }

    fn parse_bytes(&self, content: &[u8]) -> anyhow::Result<RawConfig> {
        let raw = RawConfig::from_yaml(std::str::from_utf8(content)?)?;
        self.parse_raw_config(&raw)
    }

    fn proxy_count(&self, config: &RawConfig) -> usize {
        config.proxies.iter().filter(|p| p.is_mapping()).count()
    }

    fn apply_config(&self, config: RawConfig, force: bool) -> anyhow::Result<()> {
        self.applied.lock().unwrap().push((config, force));
        Ok(())
    }

    async fn serve_controller(&self, options: ControllerOptions) -> anyhow::Result<()> {
        self.controllers.lock().unwrap().push(options.clone());
        if self.fail_controller.load(Ordering::SeqCst) {
            anyhow::bail!("listen tcp {}: address already in use", options.address);
        }
        Ok(())
    }

    fn subscribe_logs(&self) -> mpsc::Receiver<LogEvent> {
        let (tx, rx) = mpsc::channel(LOG_BUFFER);
        self.log_senders.lock().unwrap().push(tx);
        rx
    }

    fn traffic_now(&self) -> TrafficSample {
        *self.traffic.lock().unwrap()
    }

    fn general(&self) -> GeneralSettings {
        let applied = self.applied.lock().unwrap();
        let Some((raw, _)) = applied.last() else {
            return GeneralSettings::default();
        };
        GeneralSettings {
            port: raw.port,
            socks_port: raw.socks_port,
            mixed_port: raw.mixed_port,
            allow_lan: raw.allow_lan,
            bind_address: "*".to_string(),
            mode: "rule".to_string(),
            log_level: "info".to_string(),
            external_controller: raw.external_controller.clone(),
            secret: raw.secret.clone(),
        }
    }

    fn close_all_connections(&self) -> usize {
        self.connections.swap(0, Ordering::SeqCst)
    }

    fn verify_geoip(&self, mmdb_path: &Path, _probe: IpAddr) -> anyhow::Result<()> {
        if !mmdb_path.exists() {
            anyhow::bail!("open {}: no such file or directory", mmdb_path.display());
        }
        Ok(())
    }

    fn country_for_ip(&self, ip: IpAddr) -> Option<String> {
        self.countries.lock().unwrap().get(&ip).cloned()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    logs: Mutex<Vec<(String, String)>>,
    traffic: Mutex<Vec<(i64, i64)>>,
}

impl RecordingSink {
    pub fn logs(&self) -> Vec<(String, String)> {
        self.logs.lock().unwrap().clone()
    }

    pub fn traffic(&self) -> Vec<(i64, i64)> {
        self.traffic.lock().unwrap().clone()
    }
}

impl HostSink for RecordingSink {
    fn on_log(&self, category: &str, message: &str) {
        self.logs
            .lock()
            .unwrap()
            .push((category.to_string(), message.to_string()));
    }

    fn on_traffic(&self, upload: i64, download: i64) {
        self.traffic.lock().unwrap().push((upload, download));
    }
}

// 轮询等待条件成立（最多 2 秒）
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("等待条件超时");
}
