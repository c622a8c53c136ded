//! 动作状态与动作类别
//!
//! - `ActionStatus`：单个动作实例的生命周期状态，同时也是 Store 中按类别记录的“最近一次状态”；
//! - `ActionKind`：为每种动作分配稳定的类别名，用作状态表的键与事件流过滤条件。
//!   类别名不依赖 `type_name::<T>()`，避免随重构或编译器版本变化。
//!
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// 动作生命周期状态：`Idle → Loading → {Success, Error}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl ActionStatus {
    /// `Success` 与 `Error` 为终态，实例到达后不再变化
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub fn is_loading(self) -> bool {
        self == Self::Loading
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl Display for ActionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 动作类别
///
/// 通常通过 `#[action]` 宏实现；默认类别名为类型名，可用 `#[action(kind = "...")]` 覆写。
pub trait ActionKind {
    /// 动作的稳定类别名（建议常量字符串，不随重构变化）
    const KIND: &'static str;
}
