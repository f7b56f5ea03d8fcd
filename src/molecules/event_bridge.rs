// 事件桥：将核心的日志流与流量统计转发给宿主
//
// 日志按发布顺序逐条转发，每条只投递一次；
// 流量每个周期采样一次。两条流相互独立。

pub mod subscription;

pub use subscription::{CancelSignal, Subscription, SubscriptionId};

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::clash::{Engine, LogEvent};

// 流量采样周期
pub const TRAFFIC_INTERVAL: Duration = Duration::from_secs(1);

// 宿主回调耗时超过该值时记录警告
const SLOW_SINK_THRESHOLD: Duration = Duration::from_millis(100);

// 宿主接收端
//
// 回调在阻塞线程池中执行，不保证调用线程；
// 阻塞只会使对应的流停滞，并通过有界通道反压到核心
pub trait HostSink: Send + Sync + 'static {
    fn on_log(&self, category: &str, message: &str);

    fn on_traffic(&self, upload: i64, download: i64);
}

pub struct EventBridge {
    sink: Arc<dyn HostSink>,
    traffic_interval: Duration,
    // 当前的日志 / 流量转发任务，再次启动时替换
    log_subscription: Mutex<Option<Subscription>>,
    traffic_subscription: Mutex<Option<Subscription>>,
}

impl EventBridge {
    pub fn new(sink: Arc<dyn HostSink>) -> Self {
        Self {
            sink,
            traffic_interval: TRAFFIC_INTERVAL,
            log_subscription: Mutex::new(None),
            traffic_subscription: Mutex::new(None),
        }
    }

    pub fn with_traffic_interval(mut self, interval: Duration) -> Self {
        self.traffic_interval = interval;
        self
    }

    // 订阅核心日志并开始转发，已有的日志转发任务会被取消
    pub fn start_log_forwarding<E: Engine>(&self, engine: &E) -> Subscription {
        log::info!("开始转发日志数据");

        let receiver = engine.subscribe_logs();
        let subscription = spawn_log_forwarder(receiver, self.sink.clone());
        replace_subscription(&self.log_subscription, subscription.clone());
        subscription
    }

    // 开始周期性转发流量，已有的流量转发任务会被取消
    pub fn start_traffic_forwarding<E: Engine>(&self, engine: Arc<E>) -> Subscription {
        log::info!("开始转发流量数据（周期 {}ms）", self.traffic_interval.as_millis());

        let subscription = spawn_traffic_forwarder(engine, self.sink.clone(), self.traffic_interval);
        replace_subscription(&self.traffic_subscription, subscription.clone());
        subscription
    }

    // 停止日志转发，返回是否存在正在运行的任务
    pub fn stop_log_forwarding(&self) -> bool {
        log::info!("停止转发日志数据");
        take_and_cancel(&self.log_subscription)
    }

    pub fn stop_traffic_forwarding(&self) -> bool {
        log::info!("停止转发流量数据");
        take_and_cancel(&self.traffic_subscription)
    }

    pub fn stop_all(&self) {
        self.stop_log_forwarding();
        self.stop_traffic_forwarding();
    }
}

impl Drop for EventBridge {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn replace_subscription(slot: &Mutex<Option<Subscription>>, subscription: Subscription) {
    let previous = slot
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .replace(subscription);

    if let Some(previous) = previous {
        log::debug!("替换已有的{}转发任务[{}]", previous.kind(), previous.id());
        previous.cancel();
    }
}

fn take_and_cancel(slot: &Mutex<Option<Subscription>>) -> bool {
    let current = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    match current {
        Some(subscription) => {
            subscription.cancel();
            true
        }
        None => false,
    }
}

fn spawn_log_forwarder(
    mut receiver: mpsc::Receiver<LogEvent>,
    sink: Arc<dyn HostSink>,
) -> Subscription {
    Subscription::spawn("日志", move |id, mut cancel| async move {
        let mut delivered: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = receiver.recv() => {
                    let Some(event) = event else {
                        log::info!("核心日志流已关闭[{}]", id);
                        break;
                    };

                    // 等待回调返回后再取下一条，保证顺序
                    call_sink("日志", id, &sink, move |sink| {
                        sink.on_log(event.level.as_str(), &event.payload);
                    })
                    .await;
                    delivered += 1;
                }
            }
        }

        log::debug!("日志转发任务已结束[{}]，共转发 {} 条", id, delivered);
    })
}

fn spawn_traffic_forwarder<E: Engine>(
    engine: Arc<E>,
    sink: Arc<dyn HostSink>,
    period: Duration,
) -> Subscription {
    Subscription::spawn("流量", move |id, mut cancel| async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await; // 跳过首次立即触发

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let sample = engine.traffic_now();
                    log::trace!("流量采样[{}]：↑{} ↓{}", id, sample.upload, sample.download);

                    call_sink("流量", id, &sink, move |sink| {
                        sink.on_traffic(sample.upload, sample.download);
                    })
                    .await;
                }
            }
        }

        log::debug!("流量转发任务已结束[{}]", id);
    })
}

// 在阻塞线程池中调用宿主回调并等待完成
async fn call_sink<F>(kind: &str, id: SubscriptionId, sink: &Arc<dyn HostSink>, callback: F)
where
    F: FnOnce(&dyn HostSink) + Send + 'static,
{
    let sink = sink.clone();
    let started = Instant::now();

    if let Err(e) = tokio::task::spawn_blocking(move || callback(sink.as_ref())).await {
        log::error!("宿主{}回调执行失败[{}]：{}", kind, id, e);
    }

    let elapsed = started.elapsed();
    if elapsed > SLOW_SINK_THRESHOLD {
        log::warn!(
            "宿主处理{}回调耗时 {}ms[{}]，转发已被阻塞",
            kind,
            elapsed.as_millis(),
            id
        );
    }
}
