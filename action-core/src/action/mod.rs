//! 动作（Action）抽象
//!
//! 约束一个动作的核心行为：
//! - `execute` 执行业务逻辑，可立即完成（`Execution::Ready`），也可挂起（`Execution::Pending`）；
//! - `chain` 可选的后续处理能力：将 `execute` 的产出喂给一段续体，续体失败即本动作失败；
//! - `on_error` 失败钩子，在终态事件发布前恰好调用一次；
//! - 通过 `ActionScope::next` 排队后续动作，仅在本动作成功后按排队顺序依次启动。
//!
//! 创建即执行：`ctx.dispatch(action)`（或 `action.start(&ctx)`）会立即驱动生命周期，
//! 调用方无需处理任何错误，失败一律体现在状态与错误描述上；
//! `execute`、`chain` 及其挂起的计算中发生的 panic 也按失败处理，不会越过 `dispatch`。
//!
mod engine;
mod handle;
mod scope;

pub(crate) use engine::run;
pub use handle::ActionHandle;
pub use scope::ActionScope;

use crate::context::ActionContext;
use crate::status::ActionKind;
use futures_core::future::BoxFuture;
use std::future::Future;
use tracing::warn;

/// 动作接口
pub trait Action<S>: ActionKind + Send + Sized + 'static {
    /// `execute` 的产出，交给 `chain` 续体
    type Output: Send + 'static;

    /// 执行动作
    fn execute(&mut self, scope: &ActionScope<S>) -> Execution<Self::Output>;

    /// 后续处理能力：返回 `None` 表示不具备该能力，产出被丢弃
    fn chain(
        &mut self,
        _scope: &ActionScope<S>,
        _output: Self::Output,
    ) -> Option<Execution<()>> {
        None
    }

    /// 失败钩子；默认仅在 debug 构建下输出诊断日志
    fn on_error(&mut self, scope: &ActionScope<S>, error: &anyhow::Error) {
        if cfg!(debug_assertions) {
            let reason = format!("{error:#}");
            warn!(kind = Self::KIND, id = %scope.id(), error = %reason, "action failed");
        }
    }

    /// 启动动作，等价于 `ctx.dispatch(self)`
    ///
    /// Loading 的投递时机与运行时类型有关，见 [`ActionContext::dispatch`]。
    fn start(self, ctx: &ActionContext<S>) -> ActionHandle
    where
        S: Send + Sync + 'static,
    {
        ctx.dispatch(self)
    }
}

/// 执行结果：立即完成或挂起中的计算
pub enum Execution<T> {
    Ready(anyhow::Result<T>),
    Pending(BoxFuture<'static, anyhow::Result<T>>),
}

impl<T> Execution<T> {
    pub fn ready(value: T) -> Self {
        Self::Ready(Ok(value))
    }

    pub fn fail(error: impl Into<anyhow::Error>) -> Self {
        Self::Ready(Err(error.into()))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl Execution<()> {
    pub fn done() -> Self {
        Self::ready(())
    }
}

impl<T> From<anyhow::Result<T>> for Execution<T> {
    fn from(result: anyhow::Result<T>) -> Self {
        Self::Ready(result)
    }
}

impl<T> std::fmt::Debug for Execution<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(Ok(_)) => f.write_str("Execution::Ready(Ok(..))"),
            Self::Ready(Err(e)) => write!(f, "Execution::Ready(Err({e}))"),
            Self::Pending(_) => f.write_str("Execution::Pending(..)"),
        }
    }
}
