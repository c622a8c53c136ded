//! 事件子系统（eventing）
//!
//! 将动作实例在生命周期关键节点（进入 loading、进入终态）的快照广播给所有订阅者：
//! - `ActionEvent`：发布时刻的动作实例快照；
//! - `EventBus`：统一发布/订阅接口，要求扇出（fan-out）而非工作队列语义；
//! - `InMemoryEventBus`：基于 `tokio::sync::broadcast` 的默认实现。
//!
//! 总线不保留历史，订阅者只能看到订阅之后发布的事件。
//!
pub mod bus;
pub mod bus_inmemory;
pub mod event;

pub use bus::EventBus;
pub use bus_inmemory::InMemoryEventBus;
pub use event::ActionEvent;
