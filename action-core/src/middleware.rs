//! 中间件（Middleware）与中间件链
//!
//! - `before`：执行前的准入检查，任一中间件返回 `false` 即否决，后续中间件不再被询问；
//! - `after`：动作到达终态后的观察钩子，按注册顺序无条件调用；被否决的动作不会触发。
//!
//! 中间件钩子自身 panic 视为协作方缺陷，不做兜底，直接传播给调用方。
//!
use crate::eventing::ActionEvent;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// 中间件：可持有自身状态（需 `Send + Sync`，通常为原子计数器）
pub trait Middleware: Send + Sync {
    /// 中间件名称（用于日志）
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 准入检查，返回 `false` 否决该动作
    fn before(&self, _action: &ActionEvent) -> bool {
        true
    }

    /// 终态观察
    fn after(&self, _action: &ActionEvent) {}
}

/// 中间件链：保持注册顺序
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    inner: Arc<RwLock<Vec<Arc<dyn Middleware>>>>,
}

impl MiddlewareChain {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(middlewares)),
        }
    }

    /// 追加中间件，仅对之后准入的动作生效
    pub fn push(&self, middleware: Arc<dyn Middleware>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    /// 整体替换（用于重新初始化）
    pub fn replace(&self, middlewares: Vec<Arc<dyn Middleware>>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = middlewares;
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 冻结当前中间件列表；同一动作的 `admit` 与 `observe` 使用同一份快照
    pub fn snapshot(&self) -> Admission {
        Admission {
            middlewares: self
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// 单个动作的中间件快照
///
/// 钩子调用期间不持有链上的锁，中间件可在钩子内继续注册新的中间件。
#[derive(Clone)]
pub struct Admission {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Admission {
    pub fn admit(&self, action: &ActionEvent) -> bool {
        for m in &self.middlewares {
            if !m.before(action) {
                debug!(
                    middleware = m.name(),
                    kind = action.kind(),
                    id = %action.id(),
                    "action rejected by middleware"
                );
                return false;
            }
        }
        true
    }

    pub fn observe(&self, action: &ActionEvent) {
        for m in &self.middlewares {
            m.after(action);
        }
    }
}

/// 内置日志中间件：记录准入与终态
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn before(&self, action: &ActionEvent) -> bool {
        debug!(kind = action.kind(), id = %action.id(), "action admitted");
        true
    }

    fn after(&self, action: &ActionEvent) {
        match action.error() {
            Some(reason) => warn!(
                kind = action.kind(),
                id = %action.id(),
                status = %action.status(),
                reason,
                "action finished with error"
            ),
            None => info!(
                kind = action.kind(),
                id = %action.id(),
                status = %action.status(),
                "action finished"
            ),
        }
    }
}
