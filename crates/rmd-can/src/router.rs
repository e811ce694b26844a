//! 按设备 ID 分发的 CAN 路由器
//!
//! 同一条总线上挂着多台电机，每个驱动实例只关心自己设备 ID 的帧。
//! `CanRouter` 持有底层适配器，负责发送，并把入站帧交给按 ID 注册的回调。
//!
//! # 线程模型
//!
//! - 发送与接收分别加锁，发送不会被分发阻塞
//! - 分发由 `dispatch_lock` 串行化：同一设备 ID 的回调永远不会并发执行
//! - 入站帧可以由调用方线程（`poll()`）或后台 RX 线程（[`RxThread`]）取出
//! - 路由只匹配 11 位标准帧，扩展帧不会交给任何回调
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use rmd_can::{CanRouter, FrameCallback, MockCanAdapter};
//! use rmd_protocol::CanFrame;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl FrameCallback for Counter {
//!     fn on_frame_received(&self, _frame: &CanFrame) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let router = CanRouter::new(MockCanAdapter::new());
//! let counter = Arc::new(Counter(AtomicUsize::new(0)));
//! let route = router.add_message_callback(0x141, counter.clone());
//!
//! router.dispatch(&CanFrame::new_standard(0x141, &[0x9C; 8]));
//! router.dispatch(&CanFrame::new_standard(0x142, &[0x9C; 8]));
//! assert_eq!(counter.0.load(Ordering::Relaxed), 1);
//!
//! drop(route);
//! assert_eq!(router.route_count(), 0);
//! ```

use crate::{CanAdapter, CanError, CanFrame};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tracing::{trace, warn};

/// 单次 `poll()` 最多取出的帧数
pub const MAX_FRAMES_PER_POLL: usize = 16;

/// 帧回调 Trait
///
/// 在路由器收到匹配设备 ID 的帧时调用。
///
/// # 要求
///
/// - **快速返回**: 回调在分发锁内执行，会阻塞后续帧的分发
/// - **不可重入**: 回调内不要调用 `CanRouter::poll()` 或 `dispatch()`
pub trait FrameCallback: Send + Sync {
    /// 当接收到目标设备 ID 的 CAN 帧时调用
    fn on_frame_received(&self, frame: &CanFrame);
}

struct Route {
    key: u64,
    id: u32,
    callback: Arc<dyn FrameCallback>,
}

/// CAN 路由器
pub struct CanRouter {
    /// 底层适配器（发送/接收共用，单次操作持锁）
    adapter: Mutex<Box<dyn CanAdapter + Send>>,
    /// 路由表
    routes: RwLock<Vec<Route>>,
    /// 串行化分发
    dispatch_lock: Mutex<()>,
    /// 路由项的唯一键
    next_key: AtomicU64,
}

impl CanRouter {
    /// 创建新的路由器
    pub fn new(adapter: impl CanAdapter + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            adapter: Mutex::new(Box::new(adapter)),
            routes: RwLock::new(Vec::new()),
            dispatch_lock: Mutex::new(()),
            next_key: AtomicU64::new(0),
        })
    }

    /// 为设备 ID 注册回调
    ///
    /// 返回的 [`RouteItem`] 被 drop 时自动注销该回调。
    pub fn add_message_callback(
        self: &Arc<Self>,
        id: u32,
        callback: Arc<dyn FrameCallback>,
    ) -> RouteItem {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        self.routes.write().push(Route { key, id, callback });
        trace!("Route registered: ID=0x{:X}, key={}", id, key);

        RouteItem {
            router: Arc::downgrade(self),
            key,
            id,
        }
    }

    fn remove_route(&self, key: u64) {
        self.routes.write().retain(|route| route.key != key);
    }

    /// 当前注册的路由数量
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// 发送一帧
    ///
    /// # 错误
    /// - `CanError`: 底层适配器发送失败（原样返回，不重试）
    pub fn send(&self, frame: CanFrame) -> Result<(), CanError> {
        self.adapter.lock().send(frame)?;
        trace!("Sent CAN frame: ID=0x{:X}, data={:02X?}", frame.id, frame.data_slice());
        Ok(())
    }

    /// 把一帧分发给所有注册在 `frame.id` 上的回调
    ///
    /// 返回被调用的回调数量。扩展帧总是返回 0。
    pub fn dispatch(&self, frame: &CanFrame) -> usize {
        let _guard = self.dispatch_lock.lock();
        self.dispatch_locked(frame)
    }

    fn dispatch_locked(&self, frame: &CanFrame) -> usize {
        // 先复制回调列表再调用，避免持有路由表读锁执行回调
        let callbacks: Vec<Arc<dyn FrameCallback>> = self
            .routes
            .read()
            .iter()
            .filter(|route| !frame.is_extended && route.id == frame.id)
            .map(|route| route.callback.clone())
            .collect();

        for callback in &callbacks {
            callback.on_frame_received(frame);
        }

        trace!(
            "Dispatched CAN frame: ID=0x{:X}, callbacks={}",
            frame.id,
            callbacks.len()
        );
        callbacks.len()
    }

    /// 取出适配器中当前可读的帧并逐一分发（非阻塞）
    ///
    /// 最多取 [`MAX_FRAMES_PER_POLL`] 帧就返回，总线持续繁忙时调用方也能按时检查超时。
    /// 返回取出的帧数量。
    ///
    /// # 错误
    /// - `CanError`: 接收失败（`Timeout` 视为没有更多帧，不会返回）
    pub fn poll(&self) -> Result<usize, CanError> {
        let _guard = self.dispatch_lock.lock();
        let mut received = 0;

        while received < MAX_FRAMES_PER_POLL {
            // 每次接收单独持锁，保证发送可以穿插进来
            let frame = self.adapter.lock().try_receive()?;
            match frame {
                Some(frame) => {
                    trace!(
                        "Received CAN frame: ID=0x{:X}, data={:02X?}",
                        frame.id,
                        frame.data_slice()
                    );
                    self.dispatch_locked(&frame);
                    received += 1;
                },
                None => break,
            }
        }
        Ok(received)
    }

    /// 启动后台 RX 线程，持续调用 `poll()`
    ///
    /// # 参数
    /// - `idle_interval`: 没有帧可读时的休眠时间
    pub fn spawn_rx_thread(self: &Arc<Self>, idle_interval: Duration) -> RxThread {
        let router = self.clone();
        let is_running = Arc::new(AtomicBool::new(true));
        let is_running_clone = is_running.clone();

        let handle = spawn(move || {
            while is_running_clone.load(Ordering::Acquire) {
                match router.poll() {
                    Ok(0) => spin_sleep::sleep(idle_interval),
                    Ok(_) => {},
                    Err(e) => {
                        warn!("RX thread: receive error: {}", e);
                        spin_sleep::sleep(idle_interval);
                    },
                }
            }
            trace!("RX thread: is_running flag is false, exiting");
        });

        RxThread {
            is_running,
            handle: Some(handle),
        }
    }
}

/// 路由注册项（RAII）
///
/// drop 时从路由器中移除对应回调；路由器已释放时什么也不做。
pub struct RouteItem {
    router: Weak<CanRouter>,
    key: u64,
    id: u32,
}

impl RouteItem {
    /// 注册的设备 ID
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for RouteItem {
    fn drop(&mut self) {
        if let Some(router) = self.router.upgrade() {
            router.remove_route(self.key);
            trace!("Route removed: ID=0x{:X}, key={}", self.id, self.key);
        }
    }
}

/// 后台 RX 线程句柄，drop 时停止并 join
pub struct RxThread {
    is_running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RxThread {
    /// 线程是否仍在运行
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl Drop for RxThread {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("RX thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCanAdapter;
    use std::sync::atomic::AtomicUsize;

    struct Counter(AtomicUsize);

    impl Counter {
        fn new() -> Arc<Self> {
            Arc::new(Self(AtomicUsize::new(0)))
        }

        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl FrameCallback for Counter {
        fn on_frame_received(&self, _frame: &CanFrame) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn frame(id: u16) -> CanFrame {
        CanFrame::new_standard(id, &[0x9C, 0, 0, 0, 0, 0, 0, 0])
    }

    #[test]
    fn test_dispatch_by_id() {
        let router = CanRouter::new(MockCanAdapter::new());
        let a = Counter::new();
        let b = Counter::new();
        let _ra = router.add_message_callback(0x141, a.clone());
        let _rb = router.add_message_callback(0x142, b.clone());

        assert_eq!(router.dispatch(&frame(0x141)), 1);
        assert_eq!(router.dispatch(&frame(0x141)), 1);
        assert_eq!(router.dispatch(&frame(0x142)), 1);
        assert_eq!(router.dispatch(&frame(0x200)), 0);

        assert_eq!(a.count(), 2);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn test_multiple_callbacks_same_id() {
        let router = CanRouter::new(MockCanAdapter::new());
        let a = Counter::new();
        let b = Counter::new();
        let _ra = router.add_message_callback(0x141, a.clone());
        let _rb = router.add_message_callback(0x141, b.clone());

        assert_eq!(router.dispatch(&frame(0x141)), 2);
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn test_route_item_drop_unregisters() {
        let router = CanRouter::new(MockCanAdapter::new());
        let a = Counter::new();
        let route = router.add_message_callback(0x141, a.clone());
        assert_eq!(route.id(), 0x141);
        assert_eq!(router.route_count(), 1);

        drop(route);
        assert_eq!(router.route_count(), 0);
        assert_eq!(router.dispatch(&frame(0x141)), 0);
        assert_eq!(a.count(), 0);
    }

    #[test]
    fn test_route_item_outlives_router() {
        let router = CanRouter::new(MockCanAdapter::new());
        let route = router.add_message_callback(0x141, Counter::new());
        drop(router);
        // 路由器已释放，drop 不应 panic
        drop(route);
    }

    #[test]
    fn test_poll_drains_inbound_frames() {
        let adapter = MockCanAdapter::new();
        let handle = adapter.handle();
        let router = CanRouter::new(adapter);
        let a = Counter::new();
        let _ra = router.add_message_callback(0x141, a.clone());

        handle.inject(frame(0x141));
        handle.inject(frame(0x199));
        handle.inject(frame(0x141));

        assert_eq!(router.poll().unwrap(), 3);
        assert_eq!(a.count(), 2);
        assert_eq!(router.poll().unwrap(), 0);
    }

    #[test]
    fn test_extended_frames_not_routed() {
        let router = CanRouter::new(MockCanAdapter::new());
        let a = Counter::new();
        let _ra = router.add_message_callback(0x141, a.clone());

        let extended = CanFrame::new_extended(0x141, &[0x9C, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(router.dispatch(&extended), 0);
        assert_eq!(router.dispatch(&frame(0x141)), 1);
        assert_eq!(a.count(), 1);
    }

    /// 总是有帧可读的总线
    struct BusyBus;

    impl CanAdapter for BusyBus {
        fn send(&mut self, _frame: CanFrame) -> Result<(), CanError> {
            Ok(())
        }
        fn receive(&mut self) -> Result<CanFrame, CanError> {
            Ok(frame(0x200))
        }
    }

    #[test]
    fn test_poll_returns_on_busy_bus() {
        let router = CanRouter::new(BusyBus);
        let a = Counter::new();
        let _ra = router.add_message_callback(0x141, a.clone());

        assert_eq!(router.poll().unwrap(), MAX_FRAMES_PER_POLL);
        assert_eq!(router.poll().unwrap(), MAX_FRAMES_PER_POLL);
        assert_eq!(a.count(), 0);
    }

    #[test]
    fn test_send_records_and_propagates_errors() {
        let adapter = MockCanAdapter::new();
        let handle = adapter.handle();
        handle.fail_on_send(2);
        let router = CanRouter::new(adapter);

        router.send(frame(0x141)).unwrap();
        assert!(matches!(router.send(frame(0x141)), Err(CanError::Io(_))));
        assert_eq!(handle.sent_frames().len(), 1);
    }

    #[test]
    fn test_rx_thread_delivers_frames() {
        let adapter = MockCanAdapter::new();
        let handle = adapter.handle();
        let router = CanRouter::new(adapter);
        let a = Counter::new();
        let _ra = router.add_message_callback(0x141, a.clone());

        let rx = router.spawn_rx_thread(Duration::from_micros(100));
        assert!(rx.is_alive());
        handle.inject(frame(0x141));

        let start = std::time::Instant::now();
        while a.count() == 0 && start.elapsed() < Duration::from_secs(2) {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(a.count(), 1);
        drop(rx);
    }
}
