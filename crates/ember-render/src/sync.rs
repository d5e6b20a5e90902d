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

//! A counting semaphore.

use std::sync::{Condvar, Mutex};

/// A counting semaphore with an optional maximum count.
///
/// The command queue uses an uncapped instance to wake the render thread;
/// the frame-pacing handshake uses an instance with initial and maximum
/// count 2, which is what bounds CPU render-ahead.
#[derive(Debug)]
pub struct Semaphore {
    count: Mutex<u32>,
    cond: Condvar,
    max: u32,
}

impl Semaphore {
    /// Creates a semaphore holding `initial` tokens, never exceeding `max`.
    pub fn new(initial: u32, max: u32) -> Self {
        debug_assert!(initial <= max);
        Self {
            count: Mutex::new(initial),
            cond: Condvar::new(),
            max,
        }
    }

    /// Adds a token and wakes one waiter.
    ///
    /// Signalling a full semaphore drops the token, keeping the count
    /// within `[0, max]`. The swap job can reach its signal before the
    /// producer reaches the matching wait, so this is a reachable state
    /// for the frame semaphore, not a logic error.
    pub fn signal(&self) {
        let mut count = self.count.lock().unwrap();
        *count = (*count + 1).min(self.max);
        self.cond.notify_one();
    }

    /// Blocks until a token is available, then takes it.
    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            count = self.cond.wait(count).unwrap();
        }
        *count -= 1;
    }

    /// Takes a token if one is available without blocking.
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock().unwrap();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// The number of tokens currently held.
    pub fn count(&self) -> u32 {
        *self.count.lock().unwrap()
    }
}
