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

//! The worker pool.

use crate::signal::{Signal, Task};
use std::thread::{self, JoinHandle};

pub(crate) enum Message {
    Run(Task),
    Stop,
}

/// A pool of worker threads executing tasks gated on [`Signal`]
/// preconditions.
///
/// Tasks whose precondition has already fired go straight into a shared
/// channel the workers drain; the rest park inside the precondition signal
/// and are released when it fires. Dropping the scheduler stops the workers
/// after the tasks already in the channel have run.
pub struct JobScheduler {
    feed: flume::Sender<Message>,
    workers: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Creates a scheduler with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (feed, intake) = flume::unbounded::<Message>();

        let handles = (0..workers)
            .map(|_| {
                let intake = intake.clone();
                thread::spawn(move || {
                    while let Ok(message) = intake.recv() {
                        match message {
                            Message::Run(task) => task(),
                            Message::Stop => break,
                        }
                    }
                })
            })
            .collect();

        log::info!("Job scheduler started with {workers} worker(s).");
        Self {
            feed,
            workers: handles,
        }
    }

    /// Schedules `f`, gated on `precondition` if one is given, and returns
    /// the task's completion signal.
    ///
    /// The completion signal fires after `f` returns; tasks gated on it are
    /// released at that point, and [`Signal::wait`] unblocks.
    pub fn spawn<F>(&self, precondition: Option<&Signal>, f: F) -> Signal
    where
        F: FnOnce() + Send + 'static,
    {
        let completion = Signal::pending();
        let task: Task = {
            let completion = completion.clone();
            Box::new(move || {
                f();
                completion.fire();
            })
        };

        match precondition {
            Some(signal) => signal.gate_or_feed(task, &self.feed),
            None => {
                if self.feed.send(Message::Run(task)).is_err() {
                    log::warn!("Dropping a task: the scheduler has shut down.");
                }
            }
        }
        completion
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        let workers = thread::available_parallelism().map_or(2, |n| n.get());
        Self::new(workers)
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        for _ in &self.workers {
            let _ = self.feed.send(Message::Stop);
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("A scheduler worker panicked.");
            }
        }
        log::info!("Job scheduler stopped.");
    }
}

impl std::fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScheduler")
            .field("workers", &self.workers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn a_spawned_task_runs_and_fires_its_signal() {
        let scheduler = JobScheduler::new(2);
        let ran = Arc::new(AtomicUsize::new(0));

        let signal = {
            let ran = ran.clone();
            scheduler.spawn(None, move || {
                ran.fetch_add(1, Ordering::SeqCst);
            })
        };
        signal.wait();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn a_precondition_orders_two_tasks() {
        let scheduler = JobScheduler::new(4);
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let log = log.clone();
            scheduler.spawn(None, move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                log.lock().unwrap().push("first");
            })
        };
        let second = {
            let log = log.clone();
            scheduler.spawn(Some(&first), move || {
                log.lock().unwrap().push("second");
            })
        };

        second.wait();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn a_chain_of_preconditions_serialises_a_fan_out() {
        let scheduler = JobScheduler::new(8);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut last = Signal::fired();
        for i in 0..64usize {
            let order = order.clone();
            last = scheduler.spawn(Some(&last), move || {
                order.lock().unwrap().push(i);
            });
        }

        last.wait();
        let order = order.lock().unwrap();
        assert_eq!(*order, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn waiting_on_an_already_completed_task_returns() {
        let scheduler = JobScheduler::new(1);
        let signal = scheduler.spawn(None, || {});
        signal.wait();
        signal.wait(); // second wait must not block either
        assert!(signal.is_done());
    }

    #[test]
    fn independent_tasks_run_on_multiple_workers() {
        // Two tasks that each need the other's side effect to finish would
        // deadlock on a single worker; two workers let them overlap.
        let scheduler = JobScheduler::new(2);
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let a = {
            let barrier = barrier.clone();
            scheduler.spawn(None, move || {
                barrier.wait();
            })
        };
        let b = {
            let barrier = barrier.clone();
            scheduler.spawn(None, move || {
                barrier.wait();
            })
        };
        a.wait();
        b.wait();
    }
}
