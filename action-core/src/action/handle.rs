use crate::error::{ActionError, ActionResult};
use crate::eventing::ActionEvent;
use crate::status::ActionStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

/// 单个动作实例的可变部分，由引擎写入、由句柄读取
pub(crate) struct ActionCell {
    id: Uuid,
    kind: &'static str,
    admitted: AtomicBool,
    status: watch::Sender<ActionStatus>,
    error: RwLock<Option<String>>,
}

impl ActionCell {
    pub(crate) fn new(kind: &'static str) -> Self {
        let (status, _rx) = watch::channel(ActionStatus::Idle);
        Self {
            id: Uuid::new_v4(),
            kind,
            admitted: AtomicBool::new(false),
            status,
            error: RwLock::new(None),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn kind(&self) -> &'static str {
        self.kind
    }

    pub(crate) fn mark_admitted(&self) {
        self.admitted.store(true, Ordering::Release);
    }

    pub(crate) fn set_status(&self, status: ActionStatus) {
        self.status.send_replace(status);
    }

    pub(crate) fn set_error(&self, reason: String) {
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = Some(reason);
    }

    fn status(&self) -> ActionStatus {
        *self.status.borrow()
    }

    fn error(&self) -> Option<String> {
        self.error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 当前时刻的实例快照
    pub(crate) fn snapshot(&self) -> ActionEvent {
        ActionEvent::builder()
            .id(self.id)
            .kind(self.kind)
            .status(self.status())
            .maybe_error(self.error())
            .build()
    }
}

/// 动作句柄：`dispatch` 的返回值，用于查询与等待单个动作实例
///
/// 丢弃句柄不会影响动作执行。
#[derive(Clone)]
pub struct ActionHandle {
    cell: Arc<ActionCell>,
}

impl ActionHandle {
    pub(crate) fn new(cell: Arc<ActionCell>) -> Self {
        Self { cell }
    }

    pub fn id(&self) -> Uuid {
        self.cell.id
    }

    pub fn kind(&self) -> &'static str {
        self.cell.kind
    }

    /// 是否通过了中间件准入；被否决的动作永远停留在 `Idle`
    pub fn is_admitted(&self) -> bool {
        self.cell.admitted.load(Ordering::Acquire)
    }

    pub fn status(&self) -> ActionStatus {
        self.cell.status()
    }

    /// 失败描述，仅在 `Error` 终态下存在
    pub fn error(&self) -> Option<String> {
        self.cell.error()
    }

    pub fn snapshot(&self) -> ActionEvent {
        self.cell.snapshot()
    }

    /// 等待终态；被否决的动作立即返回 `Idle`
    pub async fn settled(&self) -> ActionStatus {
        if !self.is_admitted() {
            return ActionStatus::Idle;
        }

        let mut rx = self.cell.status.subscribe();
        match rx.wait_for(|s| s.is_terminal()).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        }
    }

    /// 将当前状态转换为结果：`Error` 终态转换为 `ActionError::Execution`
    pub fn outcome(&self) -> ActionResult<ActionStatus> {
        match self.status() {
            ActionStatus::Error => Err(ActionError::execution(
                self.kind(),
                self.error().unwrap_or_default(),
            )),
            status => Ok(status),
        }
    }
}

impl std::fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandle")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("status", &self.status())
            .finish()
    }
}
