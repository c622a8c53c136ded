//! 应用状态仓库（Store）
//!
//! 一个上下文内唯一的可变状态容器：
//! - 用户自定义状态 `S`，对引擎不透明，仅通过 `read/update` 访问；
//! - 按动作类别记录“最近一次提交”的状态表，供 UI 层直接查询。
//!
//! 状态写入遵循“动作执行体内单写者”的约定，内部锁只保证单次访问安全，
//! 跨 `.await` 的读-改-写需调用方自行保证。
//!
use crate::status::{ActionKind, ActionStatus};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// 状态仓库
#[derive(Debug, Default)]
pub struct Store<S> {
    state: RwLock<S>,
    statuses: DashMap<&'static str, ActionStatus>,
}

impl<S> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: RwLock::new(state),
            statuses: DashMap::new(),
        }
    }

    /// 只读访问用户状态
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// 修改用户状态
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// 获取某类别最近一次提交的状态，从未执行过则为 `Idle`
    pub fn status(&self, kind: &str) -> ActionStatus {
        self.statuses.get(kind).map(|s| *s).unwrap_or_default()
    }

    pub fn status_of<A: ActionKind>(&self) -> ActionStatus {
        self.status(A::KIND)
    }

    /// 覆写某类别的状态；不负责通知，通知由引擎经事件总线完成
    pub fn set_status(&self, kind: &'static str, status: ActionStatus) {
        self.statuses.insert(kind, status);
    }

    /// 状态表快照（按类别名排序）
    pub fn statuses(&self) -> StatusSnapshot {
        StatusSnapshot(
            self.statuses
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
        )
    }
}

impl<S: Clone> Store<S> {
    /// 克隆一份当前用户状态
    pub fn snapshot(&self) -> S {
        self.read(S::clone)
    }
}

/// 状态表的只读快照，可直接序列化给调试面板等外部消费方
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusSnapshot(BTreeMap<&'static str, ActionStatus>);

impl StatusSnapshot {
    pub fn get(&self, kind: &str) -> ActionStatus {
        self.0.get(kind).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ActionStatus)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}
