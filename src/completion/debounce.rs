use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A task that runs after a delay unless cancelled first.
///
/// Dropping the handle cancels it as well. Once the delay has elapsed the
/// task is running and can no longer be cancelled.
pub struct ScheduledTask {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn cancel(&mut self) {
        self.cancel.take();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

pub fn schedule<F>(task: F, delay: Duration) -> ScheduledTask
where
    F: Future<Output = ()> + Send + 'static,
{
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let fire = tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel_rx => false,
        };
        if fire {
            task.await;
        } else {
            tracing::trace!("scheduled task cancelled before firing");
        }
    });

    ScheduledTask {
        cancel: Some(cancel_tx),
        handle,
    }
}

/// Trailing-edge debounce: each `schedule` cancels the previous one if it
/// has not fired yet and restarts the delay.
pub struct Debouncer {
    delay: Duration,
    pending: Option<ScheduledTask>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(schedule(task, self.delay));
    }

    pub fn cancel(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            pending.cancel();
        }
    }

    #[allow(dead_code)]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.is_finished())
    }
}
