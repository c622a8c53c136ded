//! 动作上下文（ActionContext）
//!
//! 以显式持有的上下文对象取代进程级单例，统一承载：
//! - 当前生效的 `Store`（`init` 整体替换，未初始化时访问返回 `NotInitialized`）；
//! - 事件总线（上下文生命周期内唯一，重新初始化不会替换，已有订阅保持有效）；
//! - 中间件链与配置。
//!
//! 上下文可廉价克隆，所有克隆共享同一份内部状态；测试中可各自构造互不干扰的上下文。
//!
use crate::action::{self, Action, ActionHandle};
use crate::error::{ActionError, ActionResult};
use crate::eventing::{ActionEvent, EventBus, InMemoryEventBus, bus_inmemory::DEFAULT_CAPACITY};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::status::ActionKind;
use crate::store::Store;
use bon::bon;
use futures_core::stream::BoxStream;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// 默认错误描述：动作失败但错误本身没有可读描述时使用
pub const DEFAULT_ERROR_MESSAGE: &str = "an unexpected error occurred";

/// 上下文配置
#[derive(Clone, Debug)]
pub struct ContextConfig {
    /// 内存事件总线的广播缓冲区容量
    pub bus_capacity: usize,
    /// 缺省错误描述
    pub default_error: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_CAPACITY,
            default_error: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

struct ContextInner<S> {
    store: RwLock<Option<Arc<Store<S>>>>,
    bus: Arc<dyn EventBus>,
    middlewares: MiddlewareChain,
    config: ContextConfig,
}

/// 动作上下文
pub struct ActionContext<S> {
    inner: Arc<ContextInner<S>>,
}

impl<S> Clone for ActionContext<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[bon]
impl<S> ActionContext<S> {
    /// 构造上下文
    ///
    /// - `state`：可选的初始状态，缺省时需随后调用 `init`；
    /// - `bus`：可选的自定义总线，缺省使用 `InMemoryEventBus`；
    /// - `middlewares`：初始中间件，按顺序生效。
    #[builder]
    pub fn new(
        state: Option<S>,
        bus: Option<Arc<dyn EventBus>>,
        #[builder(default)] middlewares: Vec<Arc<dyn Middleware>>,
        #[builder(default)] config: ContextConfig,
    ) -> Self {
        let bus = bus.unwrap_or_else(|| Arc::new(InMemoryEventBus::new(config.bus_capacity)));
        Self {
            inner: Arc::new(ContextInner {
                store: RwLock::new(state.map(|s| Arc::new(Store::new(s)))),
                bus,
                middlewares: MiddlewareChain::new(middlewares),
                config,
            }),
        }
    }
}

impl<S> ActionContext<S> {
    /// 以给定状态构造一个已初始化、无中间件的上下文
    pub fn with_state(state: S) -> Self {
        Self::builder().state(state).build()
    }

    /// 初始化（或重新初始化）：整体替换 Store 与中间件链
    ///
    /// 总线保持不变，已有订阅不受影响；新 Store 的状态表为空。
    pub fn init(&self, state: S, middlewares: Vec<Arc<dyn Middleware>>) {
        let store = Arc::new(Store::new(state));
        *self
            .inner
            .store
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(store);
        self.inner.middlewares.replace(middlewares);
        info!(
            middlewares = self.inner.middlewares.len(),
            "action context initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.inner
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// 当前生效的 Store
    pub fn store(&self) -> ActionResult<Arc<Store<S>>> {
        self.inner
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ActionError::NotInitialized)
    }

    pub fn bus(&self) -> &Arc<dyn EventBus> {
        &self.inner.bus
    }

    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.inner.middlewares
    }

    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    /// 追加中间件，对之后准入的动作生效
    pub fn add_middleware(&self, middleware: impl Middleware + 'static) {
        self.inner.middlewares.push(Arc::new(middleware));
    }

    /// 订阅全部动作事件
    pub fn events(&self) -> BoxStream<'static, ActionResult<ActionEvent>> {
        self.inner.bus.subscribe()
    }

    /// 订阅指定类别的动作事件
    pub fn events_of(&self, kind: &'static str) -> BoxStream<'static, ActionResult<ActionEvent>> {
        self.inner.bus.subscribe_kind(kind)
    }

    pub fn events_for<A: ActionKind>(&self) -> BoxStream<'static, ActionResult<ActionEvent>> {
        self.events_of(A::KIND)
    }

    /// 关闭事件总线；之后的发布均失败（`ChannelClosed`）
    pub fn dispose(&self) {
        self.inner.bus.shutdown();
        info!("action context disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.bus.is_closed()
    }
}

impl<S: Send + Sync + 'static> ActionContext<S> {
    /// 启动动作：立即进入生命周期，返回句柄
    ///
    /// 挂起的动作在当前 tokio 运行时上被驱动，Loading 事件由被 spawn 的任务发布。
    /// 只有在 current-thread 运行时下，`dispatch` 返回后才订阅的监听者也一定能收到 Loading；
    /// 多线程运行时下该任务可能先于调用方的订阅执行，此时应在 `dispatch` 之前订阅。
    pub fn dispatch<A: Action<S>>(&self, action: A) -> ActionHandle {
        action::run(self, action)
    }
}

impl<S> std::fmt::Debug for ActionContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("initialized", &self.is_initialized())
            .field("middlewares", &self.inner.middlewares.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
