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

//! Transient allocator budget and per-frame reset behaviour.

use ember_infra::HeadlessDevice;
use ember_jobs::JobScheduler;
use ember_render::{Renderer, RendererSettings, TRANSIENT_BUFFER_SIZE};
use std::sync::Arc;

const MIB: u32 = 1024 * 1024;

fn pipeline() -> Renderer {
    let scheduler = Arc::new(JobScheduler::new(2));
    let device = Arc::new(HeadlessDevice::new());
    Renderer::new(device, scheduler, RendererSettings::new()).expect("headless startup succeeds")
}

/// Blocks until every job submitted so far, the swap included, has
/// executed, by riding a marker job through the FIFO.
fn drain_render_thread(renderer: &Renderer) {
    let (tx, rx) = std::sync::mpsc::channel();
    renderer.run_in_render_thread(move |_ctx| {
        let _ = tx.send(());
    });
    rx.recv().expect("render thread is alive");
}

#[test]
fn a_frame_of_allocations_fills_the_budget_exactly() {
    let renderer = pipeline();
    let frames = TRANSIENT_BUFFER_SIZE / MIB;

    let mut previous_offset = None;
    for i in 0..frames {
        let slice = renderer.alloc_transient(MIB);
        assert!(!slice.is_empty(), "allocation {i} fits the budget");
        assert_eq!(slice.size, MIB);
        if let Some(previous) = previous_offset {
            assert!(slice.offset > previous, "offsets ascend within a frame");
        }
        previous_offset = Some(slice.offset);
    }

    let overflow = renderer.alloc_transient(MIB);
    assert!(overflow.is_empty(), "the budget is exhausted");
    assert_eq!(overflow.size, 0);
}

#[test]
fn the_swap_resets_the_bump_offset() {
    let renderer = pipeline();

    let first = renderer.alloc_transient(MIB);
    assert_eq!(first.offset, 0);
    let second = renderer.alloc_transient(MIB);
    assert_eq!(second.offset, MIB);

    renderer.frame();
    drain_render_thread(&renderer);

    let next = renderer.alloc_transient(MIB);
    assert_eq!(next.offset, 0, "a new frame starts at the buffer base");
}

#[test]
fn a_failed_allocation_leaves_the_budget_intact() {
    let renderer = pipeline();

    let half = renderer.alloc_transient(TRANSIENT_BUFFER_SIZE / 2);
    assert!(!half.is_empty());

    // Larger than what remains; must fail without consuming anything.
    let too_big = renderer.alloc_transient(TRANSIENT_BUFFER_SIZE);
    assert!(too_big.is_empty());

    let rest = renderer.alloc_transient(TRANSIENT_BUFFER_SIZE / 2);
    assert!(!rest.is_empty(), "the remaining half is still available");
    assert_eq!(rest.offset, TRANSIENT_BUFFER_SIZE / 2);
}

#[test]
fn transient_writes_are_visible_through_the_slice() {
    let renderer = pipeline();
    let mut slice = renderer.alloc_transient(64);
    assert_eq!(slice.bytes_mut().len(), 64);
    slice.bytes_mut().fill(0xAB);
    assert!(slice.bytes_mut().iter().all(|&b| b == 0xAB));
}
