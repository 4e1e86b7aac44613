//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Crymap.
//
// Crymap is free software: you can  redistribute it and/or modify it under the
// terms of  the GNU General Public  License as published by  the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Crymap is distributed  in the hope that  it will be useful,  but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Crymap. If not, see <http://www.gnu.org/licenses/>.

//! Ordered delivery of responses to the client.
//!
//! Responses can be submitted both by the command loop and by flows running
//! beside it (the IDLE tick, an external idle-timeout notice). Whatever the
//! submitter, responses reach the wire, and their completion callbacks fire,
//! in exactly the order they were submitted.
//!
//! Whoever submits into an idle pipeline becomes the sender and drains the
//! queue inline for as long as the transport accepts writes without
//! blocking. The first write that would block is handed to a background task
//! which finishes it and then carries on draining; until it is done, further
//! submissions simply queue up behind it.

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use futures::task::noop_waker_ref;
use log::{error, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;

use super::response::Response;
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;

/// The write half of the transport, as seen by the pipeline.
pub trait ResponseSink: Send + Sync + 'static {
    /// Writes and flushes `data`.
    ///
    /// The returned future is first polled exactly once with a no-op waker;
    /// if it is ready at that point, the write is considered to have
    /// completed synchronously.
    fn write(&self, data: Vec<u8>) -> BoxFuture<'static, io::Result<()>>;
}

/// A `ResponseSink` over an `AsyncWrite`.
///
/// The writer can be temporarily taken out (to rejoin it with the read half
/// for a TLS upgrade) and put back afterwards. Writes attempted while it is
/// out fail with `NotConnected`.
pub struct StreamSink<W> {
    writer: Arc<tokio::sync::Mutex<Option<W>>>,
}

impl<W> Clone for StreamSink<W> {
    fn clone(&self) -> Self {
        StreamSink {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send + 'static> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        StreamSink {
            writer: Arc::new(tokio::sync::Mutex::new(Some(writer))),
        }
    }

    /// Removes the writer, waiting for any write in progress to finish.
    pub async fn take(&self) -> Option<W> {
        self.writer.lock().await.take()
    }

    pub async fn restore(&self, writer: W) {
        *self.writer.lock().await = Some(writer);
    }
}

impl<W: AsyncWrite + Unpin + Send + 'static> ResponseSink for StreamSink<W> {
    fn write(&self, data: Vec<u8>) -> BoxFuture<'static, io::Result<()>> {
        let writer = Arc::clone(&self.writer);
        async move {
            let mut writer = writer.lock().await;
            let writer = writer.as_mut().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotConnected, "Writer detached")
            })?;
            writer.write_all(&data).await?;
            writer.flush().await
        }
        .boxed()
    }
}

/// Invoked once a response has been written.
pub type Completion = Box<dyn FnOnce() + Send>;

type ErrorHandler = Arc<dyn Fn(&io::Error) + Send + Sync>;

struct Pending {
    data: Vec<u8>,
    on_complete: Option<Completion>,
}

#[derive(Default)]
struct State {
    queue: VecDeque<Pending>,
    /// Whether some flow is currently draining the queue.
    sending: bool,
    /// Set after a write failure. Nothing is written after that point.
    halted: bool,
    /// The number of items ever submitted.
    submitted: u64,
    /// The number of items ever written.
    completed: u64,
    error_handler: Option<ErrorHandler>,
}

struct Shared {
    sink: Box<dyn ResponseSink>,
    state: Mutex<State>,
    unicode_aware: AtomicBool,
    log_prefix: LogPrefix,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking completion callback never holds the lock, so the state
        // itself is consistent even if poisoned.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The FIFO response queue of one session.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct ResponsePipeline {
    shared: Arc<Shared>,
}

impl ResponsePipeline {
    pub fn new(sink: impl ResponseSink, log_prefix: LogPrefix) -> Self {
        ResponsePipeline {
            shared: Arc::new(Shared {
                sink: Box::new(sink),
                state: Mutex::new(State::default()),
                unicode_aware: AtomicBool::new(false),
                log_prefix,
            }),
        }
    }

    /// Sets the function to call when a write fails.
    ///
    /// It is called at most once, after the pipeline has halted.
    pub fn set_error_handler(&self, handler: impl Fn(&io::Error) + Send + Sync + 'static) {
        self.shared.state().error_handler = Some(Arc::new(handler));
    }

    /// Controls whether mailbox names in later responses may be sent as raw
    /// UTF-8.
    pub fn set_unicode_aware(&self, unicode_aware: bool) {
        self.shared
            .unicode_aware
            .store(unicode_aware, Ordering::Relaxed);
    }

    pub fn is_halted(&self) -> bool {
        self.shared.state().halted
    }

    /// Queues `response` for sending.
    ///
    /// Returns `false` if the response was written (and `on_complete`
    /// invoked) before this call returned, and `true` if completion happens
    /// later. A response submitted to a halted pipeline is discarded along
    /// with its callback, and `false` is returned.
    pub fn submit(
        &self,
        response: Response,
        on_complete: Option<Completion>,
    ) -> bool {
        let data = response
            .to_bytes(self.shared.unicode_aware.load(Ordering::Relaxed));
        self.submit_raw(data, on_complete)
    }

    fn submit_raw(&self, data: Vec<u8>, on_complete: Option<Completion>) -> bool {
        let seq = {
            let mut state = self.shared.state();
            if state.halted {
                return false;
            }

            state.queue.push_back(Pending { data, on_complete });
            state.submitted += 1;
            if state.sending {
                return true;
            }

            state.sending = true;
            state.submitted
        };

        drain(&self.shared);

        let state = self.shared.state();
        !state.halted && state.completed < seq
    }

    /// Queues `response` without caring when it is written.
    pub fn send(&self, response: Response) {
        self.submit(response, None);
    }

    /// Queues `response` and waits for it to be written.
    pub async fn submit_and_wait(&self, response: Response) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        self.submit(
            response,
            Some(Box::new(move || {
                let _ = tx.send(());
            })),
        );
        rx.await.map_err(|_| Error::PipelineHalted)
    }

    /// Waits until everything submitted so far has been written.
    pub async fn flush(&self) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel();
        self.submit_raw(
            Vec::new(),
            Some(Box::new(move || {
                let _ = tx.send(());
            })),
        );
        rx.await.map_err(|_| Error::PipelineHalted)
    }
}

/// Writes queued items until the queue is empty or a write would block.
fn drain(shared: &Arc<Shared>) {
    loop {
        let Pending { data, on_complete } = {
            let mut state = shared.state();
            match state.queue.pop_front() {
                Some(pending) => pending,
                None => {
                    state.sending = false;
                    return;
                },
            }
        };

        let mut write = shared.sink.write(data);
        let mut cx = Context::from_waker(noop_waker_ref());
        match write.as_mut().poll(&mut cx) {
            Poll::Ready(result) => {
                if !finish_one(shared, result, on_complete) {
                    return;
                }
            },

            Poll::Pending => {
                let shared = Arc::clone(shared);
                tokio::spawn(async move {
                    let result = write.await;
                    if finish_one(&shared, result, on_complete) {
                        drain(&shared);
                    }
                });
                return;
            },
        }
    }
}

/// Records the outcome of one write. Returns whether draining may continue.
fn finish_one(
    shared: &Shared,
    result: io::Result<()>,
    on_complete: Option<Completion>,
) -> bool {
    match result {
        Ok(()) => {
            shared.state().completed += 1;
            if let Some(on_complete) = on_complete {
                on_complete();
            }
            true
        },

        Err(e) => {
            let (handler, dropped) = {
                let mut state = shared.state();
                state.halted = true;
                state.sending = false;
                let dropped = state.queue.len();
                state.queue.clear();
                (state.error_handler.take(), dropped)
            };

            if dropped > 0 {
                warn!(
                    "{} Discarding {} unsent responses",
                    shared.log_prefix, dropped
                );
            }

            match handler {
                Some(handler) => handler(&e),
                None => error!("{} Write failed: {}", shared.log_prefix, e),
            }
            false
        },
    }
}

/// A sink that collects everything written into memory.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemorySink {
    pub data: Arc<Mutex<Vec<u8>>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl ResponseSink for MemorySink {
    fn write(&self, data: Vec<u8>) -> BoxFuture<'static, io::Result<()>> {
        self.data.lock().unwrap().extend_from_slice(&data);
        futures::future::ready(Ok(())).boxed()
    }
}
