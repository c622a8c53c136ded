use crate::status::ActionStatus;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 动作事件：动作实例在发布时刻的快照
///
/// 同一实例会在 `Loading`（若挂起）与终态各发布一次，两次共享同一个 `id`。
#[derive(Builder, Debug, Clone, PartialEq, Serialize)]
pub struct ActionEvent {
    id: Uuid,
    kind: &'static str,
    #[builder(default)]
    status: ActionStatus,
    error: Option<String>,
    #[builder(default = Utc::now())]
    occurred_at: DateTime<Utc>,
}

impl ActionEvent {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    /// 仅在 `Error` 状态下存在，且保证非空
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn is<A: crate::status::ActionKind>(&self) -> bool {
        self.kind == A::KIND
    }
}
