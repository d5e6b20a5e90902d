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

//! GPU timestamp profiling.
//!
//! The render thread brackets work in begin/end timestamp queries. At each
//! swap the frame's queries are resolved, their handles return to a free
//! pool, and the resolved timings rotate into a three-slot history ring the
//! producer side drains through [`Renderer::get_gpu_timings`]. The ring
//! never overwrites an unread slot: when the producer falls three frames
//! behind, whole frames of timings are dropped instead.
//!
//! [`Renderer::get_gpu_timings`]: crate::Renderer::get_gpu_timings

use ember_core::{GpuDevice, QueryHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Depth of the timing history ring.
pub const PROFILER_HISTORY_FRAMES: usize = 3;

/// One resolved timestamp record.
///
/// Records appear in emission order; a block is the span between a record
/// and the matching `is_end` record at the same nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuTiming {
    /// The block name given to `begin_profile_block`; empty for end marks.
    pub name: &'static str,
    /// The GPU timestamp in nanoseconds.
    pub timestamp: u64,
    /// `true` if this record closes a block.
    pub is_end: bool,
}

/// The single-producer/single-consumer history ring.
///
/// The render thread is the only writer of `write`, the producer side the
/// only writer of `read`; `read <= write` and `write - read <= 3` always
/// hold.
pub(crate) struct ProfilerHistory {
    slots: [Mutex<Vec<GpuTiming>>; PROFILER_HISTORY_FRAMES],
    write: AtomicU64,
    read: AtomicU64,
}

impl ProfilerHistory {
    pub(crate) fn new() -> Self {
        Self {
            slots: [
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
            ],
            write: AtomicU64::new(0),
            read: AtomicU64::new(0),
        }
    }

    /// Rotates a finished frame into the ring. Returns `false` (dropping
    /// the frame) when all slots hold unread results.
    pub(crate) fn publish(&self, timings: &mut Vec<GpuTiming>) -> bool {
        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        if write - read >= PROFILER_HISTORY_FRAMES as u64 {
            return false;
        }
        {
            let mut slot = self.slots[write as usize % PROFILER_HISTORY_FRAMES]
                .lock()
                .unwrap();
            std::mem::swap(&mut *slot, timings);
        }
        timings.clear();
        self.write.fetch_add(1, Ordering::Release);
        true
    }

    /// Swaps the oldest unread frame into `out`. Returns `false` when no
    /// unread frame exists.
    pub(crate) fn read_into(&self, out: &mut Vec<GpuTiming>) -> bool {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        if read == write {
            return false;
        }
        {
            let mut slot = self.slots[read as usize % PROFILER_HISTORY_FRAMES]
                .lock()
                .unwrap();
            std::mem::swap(&mut *slot, out);
            slot.clear();
        }
        self.read.fetch_add(1, Ordering::Release);
        true
    }
}

struct QueryRecord {
    name: &'static str,
    query: QueryHandle,
    is_end: bool,
}

/// Render-thread profiler state: the frame's query records and the free
/// query pool.
pub(crate) struct GpuProfiler {
    pool: Vec<QueryHandle>,
    records: Vec<QueryRecord>,
    scratch: Vec<GpuTiming>,
    history: Arc<ProfilerHistory>,
    dropped_frames: u64,
}

impl GpuProfiler {
    pub(crate) fn new(history: Arc<ProfilerHistory>) -> Self {
        Self {
            pool: Vec::new(),
            records: Vec::new(),
            scratch: Vec::new(),
            history,
            dropped_frames: 0,
        }
    }

    fn alloc_query(&mut self, device: &dyn GpuDevice) -> QueryHandle {
        self.pool.pop().unwrap_or_else(|| device.create_query())
    }

    /// Opens a named block: emits a timestamp and records the begin mark.
    pub(crate) fn begin_query(&mut self, device: &dyn GpuDevice, name: &'static str) {
        let query = self.alloc_query(device);
        device.query_timestamp(query);
        self.records.push(QueryRecord {
            name,
            query,
            is_end: false,
        });
    }

    /// Closes the innermost block.
    pub(crate) fn end_query(&mut self, device: &dyn GpuDevice) {
        let query = self.alloc_query(device);
        device.query_timestamp(query);
        self.records.push(QueryRecord {
            name: "",
            query,
            is_end: true,
        });
    }

    /// Resolves the frame's queries and publishes the timings.
    ///
    /// Reading a query result may stall until the GPU reaches the
    /// timestamp; that cost is paid here, at the frame boundary, not in the
    /// middle of the frame.
    pub(crate) fn frame(&mut self, device: &dyn GpuDevice) {
        self.scratch.clear();
        for record in self.records.drain(..) {
            self.scratch.push(GpuTiming {
                name: record.name,
                timestamp: device.query_result(record.query),
                is_end: record.is_end,
            });
            self.pool.push(record.query);
        }
        // A full ring means the producer is behind on reads; the frame is
        // dropped rather than overwriting unread history.
        if !self.history.publish(&mut self.scratch) {
            self.dropped_frames += 1;
        }
    }

    /// Returns pooled queries to the driver. Called during render-thread
    /// teardown.
    pub(crate) fn cleanup(&mut self, device: &dyn GpuDevice) {
        debug_assert!(
            self.records.is_empty(),
            "profiler torn down with an open frame"
        );
        for record in self.records.drain(..) {
            device.destroy_query(record.query);
        }
        for query in self.pool.drain(..) {
            device.destroy_query(query);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(tag: u64) -> Vec<GpuTiming> {
        vec![GpuTiming {
            name: "block",
            timestamp: tag,
            is_end: false,
        }]
    }

    #[test]
    fn results_come_back_oldest_first() {
        let history = ProfilerHistory::new();
        assert!(history.publish(&mut frame_of(1)));
        assert!(history.publish(&mut frame_of(2)));

        let mut out = Vec::new();
        assert!(history.read_into(&mut out));
        assert_eq!(out[0].timestamp, 1);
        assert!(history.read_into(&mut out));
        assert_eq!(out[0].timestamp, 2);
        assert!(!history.read_into(&mut out), "no third frame exists");
    }

    #[test]
    fn a_full_ring_drops_new_frames() {
        let history = ProfilerHistory::new();
        for tag in 1..=3 {
            assert!(history.publish(&mut frame_of(tag)));
        }
        assert!(!history.publish(&mut frame_of(4)), "ring is full");

        // Draining one slot makes exactly one slot writable again.
        let mut out = Vec::new();
        assert!(history.read_into(&mut out));
        assert_eq!(out[0].timestamp, 1, "the oldest frame survives, not the dropped one");
        assert!(history.publish(&mut frame_of(5)));
        assert!(!history.publish(&mut frame_of(6)));
    }

    #[test]
    fn cursors_respect_the_ring_invariant() {
        let history = ProfilerHistory::new();
        let mut out = Vec::new();
        for round in 0..10u64 {
            let _ = history.publish(&mut frame_of(round));
            let write = history.write.load(Ordering::Relaxed);
            let read = history.read.load(Ordering::Relaxed);
            assert!(read <= write);
            assert!(write - read <= PROFILER_HISTORY_FRAMES as u64);
            if round % 2 == 0 {
                let _ = history.read_into(&mut out);
            }
        }
    }
}
