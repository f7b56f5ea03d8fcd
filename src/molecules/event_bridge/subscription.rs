// 转发任务句柄：用于取消与等待后台转发任务

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

// 转发任务句柄（可克隆，所有克隆共享同一个取消信号）
//
// 任务在每个挂起点检查取消信号；最后一个句柄被释放时任务同样会退出
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

struct Inner {
    id: SubscriptionId,
    kind: &'static str,
    cancel_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

// 转发任务持有的取消信号接收端
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    // 等待取消；句柄全部释放时同样返回
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
    }
}

impl Subscription {
    // 创建句柄并启动任务，任务函数接收取消信号
    pub fn spawn<F, Fut>(kind: &'static str, task: F) -> Self
    where
        F: FnOnce(SubscriptionId, CancelSignal) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(task(id, CancelSignal { rx: cancel_rx }));
        log::debug!("{}转发任务已启动[{}]", kind, id);

        Self {
            inner: Arc::new(Inner {
                id,
                kind,
                cancel_tx,
                handle: Mutex::new(Some(handle)),
            }),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    pub fn kind(&self) -> &'static str {
        self.inner.kind
    }

    // 发送取消信号（重复调用无副作用）
    pub fn cancel(&self) {
        let was_cancelled = self.inner.cancel_tx.send_replace(true);
        if !was_cancelled {
            log::info!("{}转发任务已取消[{}]", self.inner.kind, self.inner.id);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancel_tx.borrow()
    }

    // 任务是否已退出
    pub fn is_finished(&self) -> bool {
        self.inner
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_none_or(|h| h.is_finished())
    }

    // 等待任务退出（只有第一个调用者真正等待）
    pub async fn join(&self) {
        let handle = self
            .inner
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            log::error!("{}转发任务异常退出[{}]：{}", self.inner.kind, self.inner.id, e);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
