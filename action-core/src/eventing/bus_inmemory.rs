//! 内存版事件总线（InMemoryEventBus）
//!
//! 基于 `tokio::sync::broadcast` 实现，满足 `EventBus` 协议：
//! - `publish`：克隆并广播事件，无订阅者时视为投递给 0 个接收方；
//! - `subscribe`：返回 `'static` 生命周期事件流；
//! - `shutdown`：丢弃发送端，订阅流读完缓冲后结束。
//!
//! 注意：缓冲区容量有限，消费过慢的订阅者会收到 `Lagged` 错误项，随后从最新位置继续。

use crate::error::{ActionError, ActionResult as Result};
use crate::eventing::{ActionEvent, EventBus};
use futures_core::stream::BoxStream;
use futures_util::{StreamExt, stream};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// 默认广播缓冲区容量
pub const DEFAULT_CAPACITY: usize = 1024;

/// 简单的内存事件总线实现
pub struct InMemoryEventBus {
    tx: RwLock<Option<broadcast::Sender<ActionEvent>>>,
}

impl InMemoryEventBus {
    /// 创建一个内存总线，`capacity` 为广播缓冲区容量
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx: RwLock::new(Some(tx)),
        }
    }

    fn sender(&self) -> Option<broadcast::Sender<ActionEvent>> {
        self.tx
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, event: ActionEvent) -> Result<usize> {
        let Some(tx) = self.sender() else {
            return Err(ActionError::ChannelClosed);
        };
        // 若当前无订阅者，broadcast 的 send 会返回错误，这里视为投递给 0 个订阅者
        Ok(tx.send(event).unwrap_or(0))
    }

    fn subscribe(&self) -> BoxStream<'static, Result<ActionEvent>> {
        match self.sender() {
            Some(tx) => Box::pin(
                BroadcastStream::new(tx.subscribe()).map(|r| r.map_err(ActionError::from)),
            ),
            None => Box::pin(stream::empty()),
        }
    }

    fn shutdown(&self) {
        self.tx
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_closed(&self) -> bool {
        self.tx
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn subscriber_count(&self) -> usize {
        self.sender().map(|tx| tx.receiver_count()).unwrap_or(0)
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("closed", &self.is_closed())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
