//! Per-document compilation scheduling.
//!
//! Every open document gets one actor task. Edits send it compile requests;
//! it waits for the edits to settle, compiles at most once at a time, and
//! compiles again if a newer version was requested while it was busy.
//!
//! ```text
//!            request            window elapsed           compile done
//!   Idle ──────────────▶ Scheduled ─────────────▶ Compiling ──────────▶ Done
//!    ▲                      │  ▲ request resets                          │
//!    │                      │  └─ the window              newer version? │
//!    │ already compiled     │                     Scheduled ◀────────────┤
//!    └──────────────────────┴────────────────────────────────────────────┘
//! ```
//!
//! Requests for a version no newer than the compiled or wanted one are
//! ignored, so both versions only ever move forward.
//! A compile in progress is never interrupted; requests that arrive while it
//! runs only move the wanted version, and the actor compiles again after it.

use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SchedulerError;

/// A boxed future as returned by [`CompileFn`].
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Compiles the document and returns the version that was compiled, or
/// `None` if the document was gone by the time the compile started.
pub type CompileFn = Arc<dyn Fn() -> BoxFuture<Option<i32>> + Send + Sync>;

/// Quiescence window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Request queue capacity used when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Where the actor is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing to do.
    Idle,
    /// Waiting for edits to settle.
    Scheduled,
    /// The compiler is running.
    Compiling,
    /// A compile just finished.
    Done,
}

/// Observable state of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    /// Where the actor is in its cycle.
    pub state: SchedulerState,
    /// Version produced by the last finished compile.
    pub compiled_version: Option<i32>,
    /// Version the actor currently wants compiled.
    pub desired_version: Option<i32>,
    /// Number of compiles run so far.
    pub compilations: u64,
}

enum Message {
    RequestCompile {
        version: i32,
        waiter: Option<oneshot::Sender<()>>,
    },
    Cancel,
}

/// Handle to one document's scheduling actor.
#[derive(Clone)]
pub struct CompilationScheduler {
    sender: mpsc::Sender<Message>,
    status: watch::Receiver<SchedulerStatus>,
    runtime: Handle,
}

impl std::fmt::Debug for CompilationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationScheduler")
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

impl CompilationScheduler {
    /// Start an actor on `runtime` that runs `compile` for each settled
    /// request.
    pub fn spawn(
        runtime: &Handle,
        debounce: Duration,
        queue_capacity: usize,
        compile: CompileFn,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let initial = SchedulerStatus {
            state: SchedulerState::Idle,
            compiled_version: None,
            desired_version: None,
            compilations: 0,
        };
        let (status_sender, status) = watch::channel(initial);

        let actor = Actor {
            debounce,
            compile,
            status: status_sender,
            current: initial,
            waiters: Vec::new(),
        };
        runtime.spawn(actor.run(receiver));

        Self {
            sender,
            status,
            runtime: runtime.clone(),
        }
    }

    /// Ask for `version` to be compiled. Never blocks.
    pub fn request(&self, version: i32) {
        self.post(Message::RequestCompile {
            version,
            waiter: None,
        });
    }

    /// Ask for `version` and wait until the actor has nothing left to do.
    ///
    /// Cancelling `cancel` abandons the wait only; the compile carries on for
    /// whoever else needs it.
    pub async fn await_compilation(
        &self,
        version: i32,
        cancel: &CancellationToken,
    ) -> Result<(), SchedulerError> {
        let (waiter, done) = oneshot::channel();
        let message = Message::RequestCompile {
            version,
            waiter: Some(waiter),
        };

        tokio::select! {
            () = cancel.cancelled() => return Err(SchedulerError::Cancelled),
            sent = self.sender.send(message) => sent.map_err(|_| SchedulerError::Closed)?,
        }

        tokio::select! {
            () = cancel.cancelled() => Err(SchedulerError::Cancelled),
            result = done => result.map_err(|_| SchedulerError::Closed),
        }
    }

    /// Stop the actor. Pending waiters see [`SchedulerError::Closed`].
    pub fn cancel(&self) {
        self.post(Message::Cancel);
    }

    /// Current state of the actor.
    pub fn status(&self) -> SchedulerStatus {
        *self.status.borrow()
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn post(&self, message: Message) {
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                let sender = self.sender.clone();
                self.runtime.spawn(async move {
                    let _ = sender.send(message).await;
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Compilation scheduler already stopped");
            }
        }
    }
}

struct Actor {
    debounce: Duration,
    compile: CompileFn,
    status: watch::Sender<SchedulerStatus>,
    current: SchedulerStatus,
    waiters: Vec<oneshot::Sender<()>>,
}

impl Actor {
    async fn run(mut self, mut receiver: mpsc::Receiver<Message>) {
        while let Some(message) = receiver.recv().await {
            let Message::RequestCompile { version, waiter } = message else {
                break;
            };
            self.waiters.extend(waiter);

            if self.accept(version) && self.cycle(&mut receiver).await.is_break() {
                break;
            }

            self.set_state(SchedulerState::Idle);
            for waiter in self.waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
        tracing::debug!("Compilation scheduler stopped");
    }

    /// Take `version` as the new target if it is newer than anything
    /// compiled or wanted.
    fn accept(&mut self, version: i32) -> bool {
        let version = Some(version);
        if version <= self.current.desired_version.max(self.current.compiled_version) {
            return false;
        }
        self.current.desired_version = version;
        self.publish();
        true
    }

    /// Debounce, compile, and repeat while newer versions keep arriving.
    async fn cycle(&mut self, receiver: &mut mpsc::Receiver<Message>) -> ControlFlow<()> {
        loop {
            self.set_state(SchedulerState::Scheduled);
            let window = tokio::time::sleep(self.debounce);
            tokio::pin!(window);
            loop {
                tokio::select! {
                    () = &mut window => break,
                    message = receiver.recv() => match message {
                        None | Some(Message::Cancel) => return ControlFlow::Break(()),
                        Some(Message::RequestCompile { version, waiter }) => {
                            self.waiters.extend(waiter);
                            if self.accept(version) {
                                window.as_mut().reset(Instant::now() + self.debounce);
                            }
                        }
                    },
                }
            }

            if self.up_to_date() {
                return ControlFlow::Continue(());
            }

            let target = self.current.desired_version;
            self.set_state(SchedulerState::Compiling);
            let compile = (self.compile)();
            tokio::pin!(compile);
            let compiled = loop {
                tokio::select! {
                    compiled = &mut compile => break compiled,
                    message = receiver.recv() => match message {
                        None | Some(Message::Cancel) => return ControlFlow::Break(()),
                        Some(Message::RequestCompile { version, waiter }) => {
                            self.waiters.extend(waiter);
                            self.accept(version);
                        }
                    },
                }
            };

            self.current.compiled_version = self.current.compiled_version.max(compiled);
            self.current.compilations += 1;
            self.set_state(SchedulerState::Done);

            if self.current.desired_version == target || self.up_to_date() {
                return ControlFlow::Continue(());
            }
            tracing::debug!(
                "Version {:?} requested during compile of {:?}, compiling again",
                self.current.desired_version,
                target
            );
        }
    }

    fn up_to_date(&self) -> bool {
        self.current.compiled_version >= self.current.desired_version
    }

    fn set_state(&mut self, state: SchedulerState) {
        self.current.state = state;
        self.publish();
    }

    fn publish(&self) {
        self.status.send_replace(self.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn recording_compile(
        version: Arc<AtomicI32>,
        log: Arc<Mutex<Vec<i32>>>,
        duration: Duration,
    ) -> CompileFn {
        Arc::new(move || {
            let version = Arc::clone(&version);
            let log = Arc::clone(&log);
            Box::pin(async move {
                let compiling = version.load(Ordering::SeqCst);
                log.lock().push(compiling);
                tokio::time::sleep(duration).await;
                Some(compiling)
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_request_is_ignored() {
        let version = Arc::new(AtomicI32::new(1));
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = CompilationScheduler::spawn(
            &Handle::current(),
            DEFAULT_DEBOUNCE,
            DEFAULT_QUEUE_CAPACITY,
            recording_compile(version, Arc::clone(&log), Duration::ZERO),
        );
        let token = CancellationToken::new();

        scheduler.await_compilation(1, &token).await.unwrap();
        scheduler.await_compilation(1, &token).await.unwrap();

        assert_eq!(*log.lock(), vec![1]);
        let status = scheduler.status();
        assert_eq!(status.state, SchedulerState::Idle);
        assert_eq!(status.compiled_version, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unversioned_document_compiles() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = CompilationScheduler::spawn(
            &Handle::current(),
            DEFAULT_DEBOUNCE,
            DEFAULT_QUEUE_CAPACITY,
            recording_compile(Arc::new(AtomicI32::new(0)), Arc::clone(&log), Duration::ZERO),
        );
        scheduler
            .await_compilation(0, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(*log.lock(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_document_keeps_compiled_version() {
        let results = Arc::new(Mutex::new(vec![None, Some(2)]));
        let compile: CompileFn = {
            let results = Arc::clone(&results);
            Arc::new(move || {
                let result = results.lock().pop().flatten();
                Box::pin(async move { result })
            })
        };
        let scheduler = CompilationScheduler::spawn(
            &Handle::current(),
            DEFAULT_DEBOUNCE,
            DEFAULT_QUEUE_CAPACITY,
            compile,
        );
        let token = CancellationToken::new();

        scheduler.await_compilation(2, &token).await.unwrap();
        assert_eq!(scheduler.status().compiled_version, Some(2));

        scheduler.await_compilation(3, &token).await.unwrap();
        let status = scheduler.status();
        assert_eq!(status.compilations, 2);
        assert_eq!(status.compiled_version, Some(2));
        assert_eq!(status.desired_version, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_closes_waiters() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = CompilationScheduler::spawn(
            &Handle::current(),
            DEFAULT_DEBOUNCE,
            DEFAULT_QUEUE_CAPACITY,
            recording_compile(Arc::new(AtomicI32::new(1)), Arc::clone(&log), Duration::from_secs(1)),
        );
        scheduler.cancel();
        let result = scheduler
            .await_compilation(1, &CancellationToken::new())
            .await;
        assert_eq!(result, Err(SchedulerError::Closed));
        assert!(log.lock().is_empty());
    }
}
