//! 事件总线（EventBus）协议
//!
//! 定义动作事件发布与订阅的统一抽象：
//! - `publish` 为同步调用，返回前事件已进入每个当前订阅者的缓冲区；
//! - `subscribe` 返回 'static 生命周期事件流，便于在 tokio::spawn 中消费；
//! - `shutdown` 之后发布失败（`ChannelClosed`），已有订阅者在读完缓冲后收到流结束。
//!
use crate::error::ActionResult as Result;
use crate::eventing::ActionEvent;
use futures_core::stream::BoxStream;
use futures_util::{StreamExt, future};

/// 事件总线：负责广播动作事件与提供订阅流
pub trait EventBus: Send + Sync {
    /// 广播事件，返回收到事件的订阅者数量
    fn publish(&self, event: ActionEvent) -> Result<usize>;

    /// 订阅全部事件
    fn subscribe(&self) -> BoxStream<'static, Result<ActionEvent>>;

    /// 仅订阅指定类别的事件；错误项（如 `Lagged`）原样透传
    fn subscribe_kind(&self, kind: &'static str) -> BoxStream<'static, Result<ActionEvent>> {
        Box::pin(self.subscribe().filter(move |item| {
            future::ready(match item {
                Ok(event) => event.kind() == kind,
                Err(_) => true,
            })
        }))
    }

    /// 关闭总线
    fn shutdown(&self);

    fn is_closed(&self) -> bool;

    /// 当前订阅者数量
    fn subscriber_count(&self) -> usize;
}
