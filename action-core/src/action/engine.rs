//! 动作引擎：驱动单个动作实例走完生命周期
//!
//! ```text
//! dispatch ─► Idle ─► 中间件准入 ──否决──► 停留 Idle（无事件、无状态提交）
//!                         │
//!                         ▼
//!                     execute()
//!                    ╱          ╲
//!               Ready            Pending ─► Loading（提交）─► spawn ─► 发布 Loading ─► await
//!                  │                                                                    │
//!                  ▼                                                                    ▼
//!               chain()（可选，可挂起）◄─────────────────────────────────────────────────┘
//!                  │
//!          ┌───────┴────────┐
//!          ▼                ▼
//!      Success           Error（记录描述 → on_error → 提交 → 发布）
//!  （提交 → 发布 → 启动后续动作）
//!          └───────┬────────┘
//!                  ▼
//!            中间件 observe
//! ```
//!
//! Loading 事件在被 spawn 的任务中发布，调用方此时已拿回控制权，
//! 在 `dispatch` 返回后立即订阅的监听者也能观察到 Loading（current-thread 运行时下保证）。
//!
use super::handle::{ActionCell, ActionHandle};
use super::{Action, ActionScope, Execution};
use crate::context::ActionContext;
use crate::middleware::Admission;
use crate::status::ActionStatus;
use crate::store::Store;
use anyhow::anyhow;
use futures_core::future::BoxFuture;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// 启动一个动作实例并立即返回其句柄
pub(crate) fn run<S, A>(ctx: &ActionContext<S>, mut action: A) -> ActionHandle
where
    S: Send + Sync + 'static,
    A: Action<S>,
{
    let cell = Arc::new(ActionCell::new(A::KIND));
    let handle = ActionHandle::new(cell.clone());

    let admission = ctx.middlewares().snapshot();
    if !admission.admit(&cell.snapshot()) {
        trace!(kind = A::KIND, id = %cell.id(), "action not admitted");
        return handle;
    }
    cell.mark_admitted();

    let store = match ctx.store() {
        Ok(store) => store,
        Err(err) => {
            warn!(kind = A::KIND, id = %cell.id(), error = %err, "action dispatched before init");
            let lifecycle = Lifecycle {
                ctx: ctx.clone(),
                cell,
                admission,
                store: None,
            };
            lifecycle.settle_error(err.to_string());
            return handle;
        }
    };

    let lifecycle = Lifecycle {
        ctx: ctx.clone(),
        cell: cell.clone(),
        admission,
        store: Some(store.clone()),
    };
    let scope = ActionScope::new(ctx.clone(), store, cell.id(), A::KIND);

    let execution = catch(|| action.execute(&scope)).unwrap_or_else(Execution::fail);
    match execution {
        Execution::Ready(Ok(output)) => {
            let chained = catch(|| action.chain(&scope, output))
                .unwrap_or_else(|e| Some(Execution::fail(e)));
            match chained {
                None => lifecycle.succeed(&scope),
                Some(Execution::Ready(result)) => lifecycle.complete(action, &scope, result),
                Some(Execution::Pending(continuation)) => {
                    lifecycle.clone().drive(async move {
                        let result = guarded(continuation).await;
                        lifecycle.complete(action, &scope, result);
                    });
                }
            }
        }
        Execution::Ready(Err(error)) => lifecycle.fail(&mut action, &scope, error),
        Execution::Pending(work) => {
            lifecycle.commit(ActionStatus::Loading);
            lifecycle.clone().drive(async move {
                lifecycle.publish();
                let result = match guarded(work).await {
                    Ok(output) => {
                        let chained = catch(|| action.chain(&scope, output))
                            .unwrap_or_else(|e| Some(Execution::fail(e)));
                        match chained {
                            None => Ok(()),
                            Some(Execution::Ready(result)) => result,
                            Some(Execution::Pending(continuation)) => guarded(continuation).await,
                        }
                    }
                    Err(error) => Err(error),
                };
                lifecycle.complete(action, &scope, result);
            });
        }
    }

    handle
}

/// 在同步调用中捕获 panic，转为普通的执行失败
fn catch<R>(f: impl FnOnce() -> R) -> anyhow::Result<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(panicked)
}

/// 挂起的计算中发生的 panic 同样转为执行失败
async fn guarded<T>(work: BoxFuture<'static, anyhow::Result<T>>) -> anyhow::Result<T> {
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panicked(payload)),
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %message, "action panicked");
    anyhow!("action panicked: {message}")
}

struct Lifecycle<S> {
    ctx: ActionContext<S>,
    cell: Arc<ActionCell>,
    admission: Admission,
    store: Option<Arc<Store<S>>>,
}

impl<S> Clone for Lifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            cell: self.cell.clone(),
            admission: self.admission.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> Lifecycle<S> {
    /// 在当前 tokio 运行时上驱动挂起的部分；无运行时则按失败处理
    fn drive<F>(self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                rt.spawn(task);
            }
            Err(err) => {
                warn!(
                    kind = self.cell.kind(),
                    id = %self.cell.id(),
                    error = %err,
                    "no runtime to drive suspended action"
                );
                self.settle_error(format!("no async runtime available: {err}"));
            }
        }
    }

    fn complete<A: Action<S>>(
        self,
        mut action: A,
        scope: &ActionScope<S>,
        result: anyhow::Result<()>,
    ) {
        match result {
            Ok(()) => self.succeed(scope),
            Err(error) => self.fail(&mut action, scope, error),
        }
    }

    fn succeed(self, scope: &ActionScope<S>) {
        self.commit(ActionStatus::Success);
        self.publish();

        for follow_up in scope.take_follow_ups() {
            follow_up(&self.ctx);
        }

        self.admission.observe(&self.cell.snapshot());
    }

    fn fail<A: Action<S>>(self, action: &mut A, scope: &ActionScope<S>, error: anyhow::Error) {
        self.cell.set_error(self.describe(&error));
        action.on_error(scope, &error);
        drop(scope.take_follow_ups());
        self.commit(ActionStatus::Error);
        self.publish();
        self.admission.observe(&self.cell.snapshot());
    }

    /// 未进入执行体的失败（未初始化、无运行时），不调用 `on_error`
    fn settle_error(self, reason: String) {
        let reason = if reason.trim().is_empty() {
            self.ctx.config().default_error.clone()
        } else {
            reason
        };
        self.cell.set_error(reason);
        self.commit(ActionStatus::Error);
        self.publish();
        self.admission.observe(&self.cell.snapshot());
    }

    fn describe(&self, error: &anyhow::Error) -> String {
        let reason = format!("{error:#}");
        if reason.trim().is_empty() {
            self.ctx.config().default_error.clone()
        } else {
            reason
        }
    }

    fn commit(&self, status: ActionStatus) {
        self.cell.set_status(status);
        if let Some(store) = &self.store {
            store.set_status(self.cell.kind(), status);
        }
        debug!(kind = self.cell.kind(), id = %self.cell.id(), %status, "action status changed");
    }

    fn publish(&self) {
        if let Err(err) = self.ctx.bus().publish(self.cell.snapshot()) {
            warn!(
                kind = self.cell.kind(),
                id = %self.cell.id(),
                error = %err,
                "failed to publish action event"
            );
        }
    }
}
