// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Completion signals with gated-task release.

use crate::scheduler::Message;
use std::sync::{Arc, Condvar, Mutex};

pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// A task queued behind an unfired signal, together with the worker feed it
/// is released into when the signal fires.
struct GatedTask {
    task: Task,
    feed: flume::Sender<Message>,
}

struct SignalState {
    done: bool,
    gated: Vec<GatedTask>,
}

struct SignalInner {
    state: Mutex<SignalState>,
    cond: Condvar,
}

/// A one-shot completion marker produced by [`JobScheduler::spawn`].
///
/// Cloning a `Signal` clones a reference to the same marker. A signal fires
/// exactly once, when the task that produced it returns; firing wakes every
/// [`wait`](Signal::wait)er and releases every task gated on it.
///
/// [`JobScheduler::spawn`]: crate::JobScheduler::spawn
#[derive(Clone)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

impl Signal {
    pub(crate) fn pending() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                state: Mutex::new(SignalState {
                    done: false,
                    gated: Vec::new(),
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Returns a signal that has already fired.
    ///
    /// Useful as the initial value of a "previous task" chain: the first
    /// real task gated on it starts immediately.
    pub fn fired() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                state: Mutex::new(SignalState {
                    done: true,
                    gated: Vec::new(),
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Returns `true` once the producing task has completed.
    pub fn is_done(&self) -> bool {
        self.inner.state.lock().unwrap().done
    }

    /// Blocks the calling thread until the signal fires.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock().unwrap();
        while !state.done {
            state = self.inner.cond.wait(state).unwrap();
        }
    }

    /// Marks the signal fired, wakes waiters, and releases gated tasks into
    /// their worker feeds.
    pub(crate) fn fire(&self) {
        let gated = {
            let mut state = self.inner.state.lock().unwrap();
            debug_assert!(!state.done, "a signal fires exactly once");
            state.done = true;
            self.inner.cond.notify_all();
            std::mem::take(&mut state.gated)
        };
        for entry in gated {
            if entry.feed.send(Message::Run(entry.task)).is_err() {
                log::warn!("Dropping a gated task: the scheduler has shut down.");
            }
        }
    }

    /// Queues `task` behind this signal, or feeds it straight to the
    /// workers if the signal already fired.
    pub(crate) fn gate_or_feed(&self, task: Task, feed: &flume::Sender<Message>) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if !state.done {
                state.gated.push(GatedTask {
                    task,
                    feed: feed.clone(),
                });
                return;
            }
        }
        if feed.send(Message::Run(task)).is_err() {
            log::warn!("Dropping a task: the scheduler has shut down.");
        }
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().unwrap();
        f.debug_struct("Signal")
            .field("done", &state.done)
            .field("gated", &state.gated.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fired_signal_is_done() {
        let signal = Signal::fired();
        assert!(signal.is_done());
        signal.wait(); // must not block
    }

    #[test]
    fn pending_signal_completes_on_fire() {
        let signal = Signal::pending();
        assert!(!signal.is_done());

        let waiter = {
            let signal = signal.clone();
            std::thread::spawn(move || signal.wait())
        };
        signal.fire();
        waiter.join().expect("waiter should wake up");
        assert!(signal.is_done());
    }

    #[test]
    fn gated_task_is_released_on_fire() {
        let (tx, rx) = flume::unbounded();
        let signal = Signal::pending();
        signal.gate_or_feed(Box::new(|| {}), &tx);
        assert!(rx.is_empty(), "task must stay gated until the signal fires");

        signal.fire();
        assert!(matches!(rx.try_recv(), Ok(Message::Run(_))));
    }

    #[test]
    fn task_gated_on_a_fired_signal_runs_immediately() {
        let (tx, rx) = flume::unbounded();
        Signal::fired().gate_or_feed(Box::new(|| {}), &tx);
        assert!(matches!(rx.try_recv(), Ok(Message::Run(_))));
    }
}
