use fenestra_assets::AssetError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

/// Errors from a background model load.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("load did not finish within {0:?}")]
    Timeout(Duration),
    #[error("loader went away without reporting a result")]
    Disconnected,
    #[error("failed to start loader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Shared cancellation flag between a task and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Worker-side end of a [`LoadTask`].
#[derive(Debug)]
pub struct Completer<T> {
    sender: Sender<Result<T, ModelLoadError>>,
    token: CancellationToken,
}

impl<T> Completer<T> {
    /// Deliver the result. Returns false when nobody is listening any more.
    pub fn complete(self, result: Result<T, ModelLoadError>) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.sender.send(result).is_ok()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Outcome of one [`LoadTask::poll`].
#[derive(Debug)]
pub enum LoadStatus<T> {
    Pending,
    Ready(T),
    Failed(ModelLoadError),
    Cancelled,
    /// A terminal status was already returned.
    Finished,
}

impl<T> LoadStatus<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadStatus::Pending)
    }
}

/// A load running off the frame thread, polled once per frame.
#[derive(Debug)]
pub struct LoadTask<T> {
    label: String,
    receiver: Option<Receiver<Result<T, ModelLoadError>>>,
    token: CancellationToken,
    started: Instant,
    timeout: Duration,
}

impl<T: Send + 'static> LoadTask<T> {
    /// Run `work` on a new thread. The worker may check the token and give up
    /// early; its result is dropped if the task was cancelled meanwhile.
    pub fn spawn<F>(
        label: impl Into<String>,
        timeout: Duration,
        now: Instant,
        work: F,
    ) -> Result<Self, ModelLoadError>
    where
        F: FnOnce(&CancellationToken) -> Result<T, ModelLoadError> + Send + 'static,
    {
        let label = label.into();
        let (task, completer) = Self::pending(label.clone(), timeout, now);
        std::thread::Builder::new()
            .name(format!("load-{label}"))
            .spawn(move || {
                let result = work(completer.token());
                if !completer.complete(result) {
                    tracing::debug!("load result discarded");
                }
            })
            .map_err(ModelLoadError::Spawn)?;
        tracing::debug!(label = %task.label, ?timeout, "load started");
        Ok(task)
    }
}

impl<T> LoadTask<T> {
    /// A task whose result is delivered by hand through the returned [`Completer`].
    pub fn pending(label: impl Into<String>, timeout: Duration, now: Instant) -> (Self, Completer<T>) {
        let (sender, receiver) = mpsc::channel();
        let token = CancellationToken::new();
        let task = Self {
            label: label.into(),
            receiver: Some(receiver),
            token: token.clone(),
            started: now,
            timeout,
        };
        (task, Completer { sender, token })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.receiver.is_none()
    }

    /// Cancel the task. The next poll reports [`LoadStatus::Cancelled`].
    pub fn cancel(&mut self) {
        if !self.is_finished() {
            tracing::debug!(label = %self.label, "load cancelled");
        }
        self.token.cancel();
    }

    /// Check for a result without blocking.
    pub fn poll(&mut self, now: Instant) -> LoadStatus<T> {
        let Some(receiver) = &self.receiver else {
            return LoadStatus::Finished;
        };
        if self.token.is_cancelled() {
            self.receiver = None;
            return LoadStatus::Cancelled;
        }
        let status = match receiver.try_recv() {
            Ok(Ok(value)) => LoadStatus::Ready(value),
            Ok(Err(err)) => LoadStatus::Failed(err),
            Err(TryRecvError::Disconnected) => LoadStatus::Failed(ModelLoadError::Disconnected),
            Err(TryRecvError::Empty) => {
                if now.duration_since(self.started) < self.timeout {
                    return LoadStatus::Pending;
                }
                self.token.cancel();
                LoadStatus::Failed(ModelLoadError::Timeout(self.timeout))
            }
        };
        self.receiver = None;
        status
    }
}

impl<T> Drop for LoadTask<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
