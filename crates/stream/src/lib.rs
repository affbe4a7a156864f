//! Work that spans more than one frame.
//!
//! The frame loop is single-threaded. Anything that cannot finish inside one
//! frame is either moved to a worker thread and polled ([`LoadTask`]) or
//! deferred until input settles ([`ResizeDebouncer`]).
//!
//! # Invariants
//! - A task reports exactly one terminal status; later polls return
//!   [`LoadStatus::Finished`].
//! - After [`LoadTask::cancel`], on timeout, or once the task is dropped, a
//!   result produced by the worker is discarded.
//! - Polling never blocks the frame.

mod debounce;
mod load;
mod timer;

pub use debounce::ResizeDebouncer;
pub use load::{CancellationToken, Completer, LoadStatus, LoadTask, ModelLoadError};
pub use timer::FrameTimer;
