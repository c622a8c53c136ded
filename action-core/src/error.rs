//! 统一错误定义
//!
//! 聚焦上下文初始化、事件总线与动作执行三类最小必要集合：
//! - 中间件否决（admission denied）不是错误，不出现在此处；
//! - 动作体内的失败以 `anyhow::Error` 形式返回，由引擎收敛为状态与错误描述，
//!   仅在调用方显式索取结果（`ActionHandle::outcome`）时转换为 `ActionError::Execution`。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    // --- 上下文 ---
    #[error("store not initialized: call `init` before accessing the store")]
    NotInitialized,

    // --- 事件总线 ---
    #[error("event channel closed")]
    ChannelClosed,
    #[error("subscriber lagged behind: skipped={skipped}")]
    Lagged { skipped: u64 },

    // --- 动作执行 ---
    #[error("action failed: kind={kind}, reason={reason}")]
    Execution { kind: &'static str, reason: String },
}

/// 统一 Result 类型别名
pub type ActionResult<T> = Result<T, ActionError>;

impl ActionError {
    pub fn execution(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Execution {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<tokio_stream::wrappers::errors::BroadcastStreamRecvError> for ActionError {
    fn from(err: tokio_stream::wrappers::errors::BroadcastStreamRecvError) -> Self {
        match err {
            tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped) => {
                ActionError::Lagged { skipped }
            }
        }
    }
}
