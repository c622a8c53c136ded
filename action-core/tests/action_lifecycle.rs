use action_core::DEFAULT_ERROR_MESSAGE;
use action_core::prelude::*;
use anyhow::anyhow;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct AppState {
    count: i64,
    log: Vec<String>,
}

#[action]
struct Increment;

impl Action<AppState> for Increment {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<AppState>) -> Execution<()> {
        scope.update(|s| s.count += 1);
        Execution::done()
    }
}

#[action]
struct SlowIncrement {
    delay: Duration,
}

impl Action<AppState> for SlowIncrement {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<AppState>) -> Execution<()> {
        let scope = scope.clone();
        let delay = self.delay;
        Execution::pending(async move {
            tokio::time::sleep(delay).await;
            scope.update(|s| s.count += 1);
            Ok(())
        })
    }
}

#[action]
struct FailNow {
    message: &'static str,
}

impl Action<AppState> for FailNow {
    type Output = ();

    fn execute(&mut self, _scope: &ActionScope<AppState>) -> Execution<()> {
        Execution::fail(anyhow!("{}", self.message))
    }
}

#[action(kind = "delayed_failure")]
struct DelayedFailure {
    hook_calls: Arc<AtomicUsize>,
    status_in_hook: Arc<Mutex<Option<ActionStatus>>>,
}

impl Action<AppState> for DelayedFailure {
    type Output = ();

    fn execute(&mut self, _scope: &ActionScope<AppState>) -> Execution<()> {
        Execution::pending(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(anyhow!("backend unavailable"))
        })
    }

    fn on_error(&mut self, scope: &ActionScope<AppState>, _error: &anyhow::Error) {
        self.hook_calls.fetch_add(1, Ordering::SeqCst);
        *self.status_in_hook.lock().unwrap() = Some(scope.store().status(Self::KIND));
    }
}

#[action]
struct Record {
    label: &'static str,
}

impl Action<AppState> for Record {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<AppState>) -> Execution<()> {
        let label = self.label;
        scope.update(|s| s.log.push(label.to_string()));
        Execution::done()
    }
}

#[action]
struct Parent {
    fail: bool,
}

impl Action<AppState> for Parent {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<AppState>) -> Execution<()> {
        scope.next(|| Record { label: "first" });
        scope.next(|| Record { label: "second" });
        scope.update(|s| s.log.push("parent".into()));

        if self.fail {
            Execution::fail(anyhow!("parent failed"))
        } else {
            Execution::done()
        }
    }
}

#[action]
struct AsyncParent;

impl Action<AppState> for AsyncParent {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<AppState>) -> Execution<()> {
        let scope = scope.clone();
        Execution::pending(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            scope.next(|| SlowIncrement {
                delay: Duration::from_millis(30),
            });
            scope.next(|| SlowIncrement {
                delay: Duration::from_millis(10),
            });
            Ok(())
        })
    }
}

#[action]
struct FailingFollowUpParent;

impl Action<AppState> for FailingFollowUpParent {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<AppState>) -> Execution<()> {
        scope.next(|| FailNow {
            message: "child failed",
        });
        Execution::done()
    }
}

#[action]
struct FetchAndStore {
    value: i64,
    fail_continuation: bool,
}

impl Action<AppState> for FetchAndStore {
    type Output = i64;

    fn execute(&mut self, _scope: &ActionScope<AppState>) -> Execution<i64> {
        let value = self.value;
        Execution::pending(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(value)
        })
    }

    fn chain(&mut self, scope: &ActionScope<AppState>, output: i64) -> Option<Execution<()>> {
        let scope = scope.clone();
        let fail = self.fail_continuation;
        Some(Execution::pending(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if fail {
                return Err(anyhow!("continuation failed"));
            }
            scope.update(|s| s.count = output);
            Ok(())
        }))
    }
}

#[action]
struct SyncDouble;

impl Action<AppState> for SyncDouble {
    type Output = i64;

    fn execute(&mut self, _scope: &ActionScope<AppState>) -> Execution<i64> {
        Execution::ready(21)
    }

    fn chain(&mut self, scope: &ActionScope<AppState>, output: i64) -> Option<Execution<()>> {
        scope.update(|s| s.count = output * 2);
        Some(Execution::done())
    }
}

#[action]
struct PanicNow;

impl Action<AppState> for PanicNow {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<AppState>) -> Execution<()> {
        scope.next(|| Increment);
        let empty: Vec<i64> = Vec::new();
        scope.update(|s| s.count = empty[3]);
        Execution::done()
    }
}

#[action]
struct PanicLater;

impl Action<AppState> for PanicLater {
    type Output = ();

    fn execute(&mut self, _scope: &ActionScope<AppState>) -> Execution<()> {
        Execution::pending(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let empty: Vec<i64> = Vec::new();
            let _ = empty[3];
            Ok(())
        })
    }
}

#[action]
struct PanicInChain;

impl Action<AppState> for PanicInChain {
    type Output = i64;

    fn execute(&mut self, _scope: &ActionScope<AppState>) -> Execution<i64> {
        Execution::ready(1)
    }

    fn chain(&mut self, _scope: &ActionScope<AppState>, output: i64) -> Option<Execution<()>> {
        panic!("cannot handle {output}");
    }
}

fn context() -> ActionContext<AppState> {
    ActionContext::with_state(AppState::default())
}

/// 关闭总线后读取订阅流中缓冲的全部事件
async fn drain(
    ctx: &ActionContext<AppState>,
    stream: BoxStream<'static, ActionResult<ActionEvent>>,
) -> Vec<ActionEvent> {
    ctx.dispose();
    stream.map(|e| e.expect("no lag expected")).collect().await
}

fn statuses(events: &[ActionEvent]) -> Vec<ActionStatus> {
    events.iter().map(|e| e.status()).collect()
}

#[tokio::test]
async fn sync_action_succeeds_without_loading() {
    let ctx = context();
    let events = ctx.events();
    let store = ctx.store().unwrap();
    let before = store.read(|s| s.count);

    let handle = ctx.dispatch(Increment);

    assert_eq!(handle.status(), ActionStatus::Success);
    assert_eq!(store.read(|s| s.count), before + 1);
    assert_eq!(store.status_of::<Increment>(), ActionStatus::Success);

    let events = drain(&ctx, events).await;
    assert_eq!(statuses(&events), vec![ActionStatus::Success]);
    assert_eq!(events[0].id(), handle.id());
    assert_eq!(events[0].kind(), "Increment");
}

#[tokio::test(start_paused = true)]
async fn suspending_action_reports_loading_then_success() {
    let ctx = context();
    let events = ctx.events_for::<SlowIncrement>();

    let handle = ctx.dispatch(SlowIncrement {
        delay: Duration::from_millis(100),
    });

    assert_eq!(handle.status(), ActionStatus::Loading);
    let store = ctx.store().unwrap();
    assert_eq!(store.status_of::<SlowIncrement>(), ActionStatus::Loading);
    assert_eq!(store.read(|s| s.count), 0);

    assert_eq!(handle.settled().await, ActionStatus::Success);
    assert_eq!(store.read(|s| s.count), 1);
    assert_eq!(store.status_of::<SlowIncrement>(), ActionStatus::Success);

    let events = drain(&ctx, events).await;
    assert_eq!(
        statuses(&events),
        vec![ActionStatus::Loading, ActionStatus::Success]
    );
    assert!(events.iter().all(|e| e.id() == handle.id()));
}

#[tokio::test(start_paused = true)]
async fn listener_attached_after_dispatch_still_sees_loading() {
    let ctx = context();

    let handle = ctx.dispatch(SlowIncrement {
        delay: Duration::from_millis(10),
    });
    let mut events = ctx.events_for::<SlowIncrement>();

    let first = events.next().await.unwrap().unwrap();
    assert_eq!(first.status(), ActionStatus::Loading);
    let second = events.next().await.unwrap().unwrap();
    assert_eq!(second.status(), ActionStatus::Success);
    assert_eq!(handle.status(), ActionStatus::Success);
}

#[tokio::test]
async fn immediate_failure_is_contained() {
    let ctx = context();
    let events = ctx.events();

    let handle = ctx.dispatch(FailNow { message: "bad input" });

    assert_eq!(handle.status(), ActionStatus::Error);
    assert_eq!(handle.error().as_deref(), Some("bad input"));
    assert_eq!(
        handle.outcome(),
        Err(ActionError::Execution {
            kind: "FailNow",
            reason: "bad input".into(),
        })
    );
    assert_eq!(
        ctx.store().unwrap().status_of::<FailNow>(),
        ActionStatus::Error
    );

    let events = drain(&ctx, events).await;
    assert_eq!(statuses(&events), vec![ActionStatus::Error]);
    assert_eq!(events[0].error(), Some("bad input"));
}

#[tokio::test]
async fn empty_error_falls_back_to_default_message() {
    let ctx = context();

    let handle = ctx.dispatch(FailNow { message: "" });

    assert_eq!(handle.status(), ActionStatus::Error);
    assert_eq!(handle.error().as_deref(), Some(DEFAULT_ERROR_MESSAGE));
}

#[tokio::test(start_paused = true)]
async fn delayed_failure_runs_hook_once_before_terminal_event() {
    let ctx = context();
    let events = ctx.events_of("delayed_failure");
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let status_in_hook = Arc::new(Mutex::new(None));

    let handle = ctx.dispatch(DelayedFailure {
        hook_calls: hook_calls.clone(),
        status_in_hook: status_in_hook.clone(),
    });
    assert_eq!(handle.status(), ActionStatus::Loading);

    assert_eq!(handle.settled().await, ActionStatus::Error);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    // 钩子运行时终态尚未提交
    assert_eq!(*status_in_hook.lock().unwrap(), Some(ActionStatus::Loading));
    assert_eq!(handle.error().as_deref(), Some("backend unavailable"));

    let events = drain(&ctx, events).await;
    assert_eq!(
        statuses(&events),
        vec![ActionStatus::Loading, ActionStatus::Error]
    );
    assert_ne!(events[1].error(), Some(DEFAULT_ERROR_MESSAGE));
}

#[tokio::test]
async fn follow_ups_run_in_queue_order_after_success() {
    let ctx = context();
    let events = ctx.events();

    let handle = ctx.dispatch(Parent { fail: false });

    assert_eq!(handle.status(), ActionStatus::Success);
    let log = ctx.store().unwrap().read(|s| s.log.clone());
    assert_eq!(log, vec!["parent", "first", "second"]);

    let events = drain(&ctx, events).await;
    let kinds: Vec<_> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec!["Parent", "Record", "Record"]);
    // 两个后续动作是互相独立的实例
    assert_ne!(events[1].id(), events[2].id());
}

#[tokio::test]
async fn follow_ups_are_dropped_when_parent_fails() {
    let ctx = context();

    let handle = ctx.dispatch(Parent { fail: true });

    assert_eq!(handle.status(), ActionStatus::Error);
    let log = ctx.store().unwrap().read(|s| s.log.clone());
    assert_eq!(log, vec!["parent"]);
    assert_eq!(
        ctx.store().unwrap().status_of::<Record>(),
        ActionStatus::Idle
    );
}

#[tokio::test(start_paused = true)]
async fn async_parent_starts_independent_follow_ups() {
    let ctx = context();
    let mut children = ctx.events_for::<SlowIncrement>();

    let handle = ctx.dispatch(AsyncParent);
    assert_eq!(handle.settled().await, ActionStatus::Success);

    let mut loading = Vec::new();
    let mut finished = Vec::new();
    while finished.len() < 2 {
        let event = children.next().await.unwrap().unwrap();
        match event.status() {
            ActionStatus::Loading => loading.push(event.id()),
            ActionStatus::Success => finished.push(event.id()),
            other => panic!("unexpected status {other}"),
        }
    }

    // 两个实例各自独立地经历 Loading → Success
    assert_eq!(loading.len(), 2);
    assert_ne!(loading[0], loading[1]);
    finished.sort();
    loading.sort();
    assert_eq!(finished, loading);
    assert_eq!(ctx.store().unwrap().read(|s| s.count), 2);
}

#[tokio::test]
async fn failing_follow_up_does_not_touch_parent() {
    let ctx = context();

    let handle = ctx.dispatch(FailingFollowUpParent);

    assert_eq!(handle.status(), ActionStatus::Success);
    let store = ctx.store().unwrap();
    assert_eq!(
        store.status_of::<FailingFollowUpParent>(),
        ActionStatus::Success
    );
    assert_eq!(store.status_of::<FailNow>(), ActionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn chain_continuation_runs_before_success() {
    let ctx = context();
    let events = ctx.events_for::<FetchAndStore>();

    let handle = ctx.dispatch(FetchAndStore {
        value: 42,
        fail_continuation: false,
    });

    assert_eq!(handle.settled().await, ActionStatus::Success);
    assert_eq!(ctx.store().unwrap().read(|s| s.count), 42);

    let events = drain(&ctx, events).await;
    assert_eq!(
        statuses(&events),
        vec![ActionStatus::Loading, ActionStatus::Success]
    );
}

#[tokio::test(start_paused = true)]
async fn failing_continuation_fails_the_parent() {
    let ctx = context();

    let handle = ctx.dispatch(FetchAndStore {
        value: 42,
        fail_continuation: true,
    });

    assert_eq!(handle.settled().await, ActionStatus::Error);
    assert_eq!(handle.error().as_deref(), Some("continuation failed"));
    assert_eq!(ctx.store().unwrap().read(|s| s.count), 0);
}

#[tokio::test]
async fn sync_chain_completes_immediately() {
    let ctx = context();

    let handle = SyncDouble.start(&ctx);

    assert_eq!(handle.status(), ActionStatus::Success);
    assert_eq!(ctx.store().unwrap().read(|s| s.count), 42);
}

#[tokio::test(start_paused = true)]
async fn every_subscriber_sees_the_same_sequence() {
    let ctx = context();
    let a = ctx.events_for::<SlowIncrement>();
    let b = ctx.events_for::<SlowIncrement>();

    let handle = ctx.dispatch(SlowIncrement {
        delay: Duration::from_millis(20),
    });
    handle.settled().await;

    ctx.dispose();
    let a: Vec<_> = a.map(|e| e.unwrap()).collect().await;
    let b: Vec<_> = b.map(|e| e.unwrap()).collect().await;

    assert_eq!(statuses(&a), vec![ActionStatus::Loading, ActionStatus::Success]);
    assert_eq!(a, b);
}

#[tokio::test(start_paused = true)]
async fn filtered_stream_never_yields_other_kinds() {
    let ctx = context();
    let only_increment = ctx.events_for::<Increment>();

    ctx.dispatch(Increment);
    let slow = ctx.dispatch(SlowIncrement {
        delay: Duration::from_millis(5),
    });
    ctx.dispatch(FailNow { message: "nope" });
    ctx.dispatch(Increment);
    slow.settled().await;

    let events = drain(&ctx, only_increment).await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.is::<Increment>()));
}

#[tokio::test]
async fn status_snapshot_tracks_every_kind() {
    let ctx = context();

    ctx.dispatch(Increment);
    ctx.dispatch(FailNow { message: "x" });

    let snapshot = ctx.store().unwrap().statuses();
    assert_eq!(snapshot.get("Increment"), ActionStatus::Success);
    assert_eq!(snapshot.get("FailNow"), ActionStatus::Error);
    assert_eq!(snapshot.get("SlowIncrement"), ActionStatus::Idle);
    assert_eq!(
        serde_json::to_value(&snapshot).unwrap(),
        serde_json::json!({"FailNow": "error", "Increment": "success"})
    );
}

#[tokio::test]
async fn panicking_body_settles_as_error() {
    let ctx = context();
    let events = ctx.events();

    let handle = ctx.dispatch(PanicNow);

    assert_eq!(handle.status(), ActionStatus::Error);
    let reason = handle.error().unwrap();
    assert!(reason.starts_with("action panicked"), "{reason}");
    assert!(reason.contains("index out of bounds"), "{reason}");

    let store = ctx.store().unwrap();
    assert_eq!(store.status_of::<PanicNow>(), ActionStatus::Error);
    // 排队的后续动作随失败丢弃，Store 仍可继续使用
    assert_eq!(store.status_of::<Increment>(), ActionStatus::Idle);
    assert_eq!(ctx.dispatch(Increment).status(), ActionStatus::Success);
    assert_eq!(store.read(|s| s.count), 1);

    let events = drain(&ctx, events).await;
    assert_eq!(
        statuses(&events),
        vec![ActionStatus::Error, ActionStatus::Success]
    );
    assert_eq!(events[0].error(), Some(reason.as_str()));
}

#[tokio::test]
async fn panicking_chain_fails_the_action() {
    let ctx = context();

    let handle = ctx.dispatch(PanicInChain);

    assert_eq!(handle.status(), ActionStatus::Error);
    assert_eq!(
        handle.error().as_deref(),
        Some("action panicked: cannot handle 1")
    );
}

#[tokio::test(start_paused = true)]
async fn panicking_suspended_work_still_reaches_terminal_status() {
    let ctx = context();
    let events = ctx.events_for::<PanicLater>();

    let handle = ctx.dispatch(PanicLater);
    assert_eq!(handle.status(), ActionStatus::Loading);

    let settled = tokio::time::timeout(Duration::from_secs(1), handle.settled()).await;
    assert_eq!(settled, Ok(ActionStatus::Error));
    assert!(!handle.error().unwrap().is_empty());
    assert_eq!(
        ctx.store().unwrap().status_of::<PanicLater>(),
        ActionStatus::Error
    );

    let events = drain(&ctx, events).await;
    assert_eq!(
        statuses(&events),
        vec![ActionStatus::Loading, ActionStatus::Error]
    );
    assert!(events[1].error().unwrap().starts_with("action panicked"));
}
