//! 响应式动作/状态协调层（action-core）
//!
//! 为 UI 框架提供命令式异步操作与声明式重绘之间的胶水层：
//! - 唯一的可变应用状态仓库（`store`），并按动作类别记录最近一次状态；
//! - 动作（`action`）：创建即执行的异步/同步工作单元，驱动 `Idle → Loading → Success/Error`；
//! - 事件系统（`eventing`）：把动作实例快照广播给所有订阅者（UI 组件等）；
//! - 中间件（`middleware`）：执行前否决、执行后观察；
//! - 上下文（`context`）：显式持有上述组件，取代进程级单例。
//!
//! 典型用法：
//! 1. 定义状态类型，构造 `ActionContext`（或先构造再 `init`）；
//! 2. 用 `#[action]` 标注动作类型并实现 `Action<S>`；
//! 3. `ctx.dispatch(MyAction { .. })` 启动动作，通过 `ctx.events()` / `Store::status` 观察结果。
//!
//! ```rust
//! use action_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! #[action]
//! struct Increment;
//!
//! impl Action<Counter> for Increment {
//!     type Output = ();
//!
//!     fn execute(&mut self, scope: &ActionScope<Counter>) -> Execution<()> {
//!         scope.update(|s| s.count += 1);
//!         Execution::done()
//!     }
//! }
//!
//! let ctx = ActionContext::with_state(Counter::default());
//! let handle = ctx.dispatch(Increment);
//!
//! assert_eq!(handle.status(), ActionStatus::Success);
//! assert_eq!(ctx.store().unwrap().read(|s| s.count), 1);
//! ```
//!
pub mod action;
pub mod context;
pub mod error;
pub mod eventing;
pub mod middleware;
pub mod status;
pub mod store;

pub use action::{Action, ActionHandle, ActionScope, Execution};
pub use action_macros::action;
pub use context::{ActionContext, ContextConfig, DEFAULT_ERROR_MESSAGE};
pub use error::{ActionError, ActionResult};
pub use eventing::{ActionEvent, EventBus, InMemoryEventBus};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain};
pub use status::{ActionKind, ActionStatus};
pub use store::{StatusSnapshot, Store};

/// 常用导入
pub mod prelude {
    pub use crate::action;
    pub use crate::{
        Action, ActionContext, ActionError, ActionEvent, ActionHandle, ActionKind, ActionResult,
        ActionScope, ActionStatus, Execution, Middleware, Store,
    };
}

// 允许在本 crate 内部通过 ::action_core 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::action_core 路径。
extern crate self as action_core;
