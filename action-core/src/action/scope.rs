use super::Action;
use crate::context::ActionContext;
use crate::store::Store;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

pub(crate) type FollowUp<S> = Box<dyn FnOnce(&ActionContext<S>) + Send>;

/// 动作执行期间可见的作用域：实例标识、共享 Store 与后续动作队列
///
/// 可廉价克隆，挂起的执行体通常克隆一份带入 `async move` 块。
pub struct ActionScope<S> {
    ctx: ActionContext<S>,
    store: Arc<Store<S>>,
    id: Uuid,
    kind: &'static str,
    follow_ups: Arc<Mutex<Vec<FollowUp<S>>>>,
}

impl<S> Clone for ActionScope<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            store: self.store.clone(),
            id: self.id,
            kind: self.kind,
            follow_ups: self.follow_ups.clone(),
        }
    }
}

impl<S> ActionScope<S> {
    pub(crate) fn new(
        ctx: ActionContext<S>,
        store: Arc<Store<S>>,
        id: Uuid,
        kind: &'static str,
    ) -> Self {
        Self {
            ctx,
            store,
            id,
            kind,
            follow_ups: Arc::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// 本动作启动时解析到的 Store
    pub fn store(&self) -> &Arc<Store<S>> {
        &self.store
    }

    pub fn context(&self) -> &ActionContext<S> {
        &self.ctx
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.store.read(f)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.store.update(f)
    }

    pub(crate) fn take_follow_ups(&self) -> Vec<FollowUp<S>> {
        std::mem::take(&mut *self.follow_ups.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<S: Send + Sync + 'static> ActionScope<S> {
    /// 排队一个后续动作的构造器
    ///
    /// 构造器在本动作成功后才被调用，多个后续动作按排队顺序各自独立走完整生命周期；
    /// 本动作失败时队列被丢弃。
    pub fn next<A, F>(&self, constructor: F)
    where
        A: Action<S>,
        F: FnOnce() -> A + Send + 'static,
    {
        let follow_up: FollowUp<S> = Box::new(move |ctx: &ActionContext<S>| {
            ctx.dispatch(constructor());
        });
        self.follow_ups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(follow_up);
    }

    /// 已排队但尚未启动的后续动作数量
    pub fn pending_follow_ups(&self) -> usize {
        self.follow_ups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
