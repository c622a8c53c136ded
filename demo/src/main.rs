use action_core::prelude::*;
use action_core::LoggingMiddleware;
use anyhow::{anyhow, bail};
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Clone)]
struct CounterState {
    count: i64,
    remote: Option<i64>,
    save_failures: usize,
}

#[action(kind = "counter.increment")]
struct Increment;

impl Action<CounterState> for Increment {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<CounterState>) -> Execution<()> {
        scope.update(|s| s.count += 1);
        Execution::done()
    }
}

#[action(kind = "counter.decrement")]
struct Decrement;

impl Action<CounterState> for Decrement {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<CounterState>) -> Execution<()> {
        scope.update(|s| s.count -= 1);
        Execution::done()
    }
}

/// 模拟从远端拉取计数，拉取结果经 chain 写回并排队一次 Increment
#[action(kind = "counter.load_remote")]
struct LoadRemote {
    latency: Duration,
}

impl Action<CounterState> for LoadRemote {
    type Output = i64;

    fn execute(&mut self, scope: &ActionScope<CounterState>) -> Execution<i64> {
        let latency = self.latency;
        scope.next(|| Increment);
        Execution::pending(async move {
            tokio::time::sleep(latency).await;
            Ok(41)
        })
    }

    fn chain(&mut self, scope: &ActionScope<CounterState>, output: i64) -> Option<Execution<()>> {
        scope.update(|s| {
            s.remote = Some(output);
            s.count = output;
        });
        Some(Execution::done())
    }
}

#[action(kind = "counter.save")]
struct Save;

impl Action<CounterState> for Save {
    type Output = ();

    fn execute(&mut self, scope: &ActionScope<CounterState>) -> Execution<()> {
        let count = scope.read(|s| s.count);
        Execution::pending(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            if count > 40 {
                bail!("quota exceeded: count={count}");
            }
            Ok(())
        })
    }

    fn on_error(&mut self, scope: &ActionScope<CounterState>, error: &anyhow::Error) {
        scope.update(|s| s.save_failures += 1);
        tracing::error!(error = %error, "save rejected by backend");
    }
}

/// 计数不允许为负：在计数为 0 时否决 Decrement
struct NonNegative {
    store: Arc<Store<CounterState>>,
    rejected: AtomicUsize,
}

impl Middleware for NonNegative {
    fn name(&self) -> &str {
        "non-negative"
    }

    fn before(&self, action: &ActionEvent) -> bool {
        if action.is::<Decrement>() && self.store.read(|s| s.count) <= 0 {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ctx: ActionContext<CounterState> = ActionContext::builder().build();
    ctx.init(
        CounterState::default(),
        vec![Arc::new(LoggingMiddleware) as Arc<dyn Middleware>],
    );
    let guard = Arc::new(NonNegative {
        store: ctx.store()?,
        rejected: AtomicUsize::new(0),
    });
    ctx.middlewares().push(guard.clone());

    // 充当 UI 组件：订阅事件流并“重绘”
    let mut events = ctx.events();
    let store = ctx.store()?;
    let widget = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => println!(
                    "render: {:<22} {:<8} count={} {}",
                    event.kind(),
                    event.status(),
                    store.read(|s| s.count),
                    event.error().unwrap_or_default()
                ),
                Err(err) => println!("render: skipped ({err})"),
            }
        }
    });

    ctx.dispatch(Decrement);
    ctx.dispatch(Increment);
    ctx.dispatch(Decrement);

    let load = ctx.dispatch(LoadRemote {
        latency: Duration::from_millis(50),
    });
    load.settled().await;

    let save = Save.start(&ctx);
    let status = save.settled().await;
    if let Err(err) = save.outcome() {
        println!("save finished with {status}: {err}");
    }

    ctx.dispose();
    widget
        .await
        .map_err(|e| anyhow!("widget task failed: {e}"))?;

    let state = ctx.store()?.snapshot();
    println!(
        "final: count={}, remote={:?}, save_failures={}, rejected={}",
        state.count,
        state.remote,
        state.save_failures,
        guard.rejected.load(Ordering::Relaxed)
    );
    println!("statuses: {:?}", ctx.store()?.statuses());

    Ok(())
}
