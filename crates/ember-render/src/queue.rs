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

//! The single-consumer command queue between push tasks and the render
//! thread.

use crate::job::RenderJob;
use crate::sync::Semaphore;
use std::collections::VecDeque;
use std::sync::Mutex;

/// FIFO of pending render jobs.
///
/// Producers (the scheduler's push tasks) append under the lock and signal
/// the semaphore; the render thread waits the semaphore, detaches one job
/// under the lock, and executes it outside. Because every push task has the
/// previous push task as its precondition, queue order equals submission
/// order.
pub(crate) struct CommandQueue {
    jobs: Mutex<VecDeque<Box<dyn RenderJob>>>,
    ready: Semaphore,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            ready: Semaphore::new(0, u32::MAX),
        }
    }

    /// Appends a job and wakes the consumer.
    pub(crate) fn push(&self, job: Box<dyn RenderJob>) {
        self.jobs.lock().unwrap().push_back(job);
        self.ready.signal();
    }

    /// Blocks until a job is available and detaches it.
    pub(crate) fn pop(&self) -> Box<dyn RenderJob> {
        loop {
            self.ready.wait();
            if let Some(job) = self.jobs.lock().unwrap().pop_front() {
                return job;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::RenderContext;
    use std::sync::Arc;

    /// Records its tag when dropped, which happens right after `pop` in
    /// these tests, so the drop order is the queue order.
    struct Tagged {
        tag: usize,
        popped: Arc<Mutex<Vec<usize>>>,
    }

    impl RenderJob for Tagged {
        fn execute(&mut self, _ctx: &mut RenderContext<'_>) {}
    }

    impl Drop for Tagged {
        fn drop(&mut self) {
            self.popped.lock().unwrap().push(self.tag);
        }
    }

    #[test]
    fn pop_returns_jobs_in_push_order() {
        let queue = CommandQueue::new();
        let popped = Arc::new(Mutex::new(Vec::new()));
        for tag in 1..=4 {
            queue.push(Box::new(Tagged {
                tag,
                popped: popped.clone(),
            }));
        }
        assert_eq!(queue.len(), 4);

        for _ in 0..4 {
            drop(queue.pop());
        }
        assert_eq!(queue.len(), 0);
        assert_eq!(*popped.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn pop_blocks_until_a_job_arrives() {
        let queue = Arc::new(CommandQueue::new());
        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                let _job = queue.pop();
            })
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!consumer.is_finished(), "pop must block on an empty queue");

        queue.push(Box::new(Tagged {
            tag: 1,
            popped: Arc::new(Mutex::new(Vec::new())),
        }));
        consumer.join().expect("consumer should wake up");
    }
}
