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

//! Back-pressure and read ordering of the GPU timing history ring.

use ember_infra::HeadlessDevice;
use ember_jobs::JobScheduler;
use ember_render::{GpuTiming, Renderer, RendererSettings, PROFILER_HISTORY_FRAMES};
use std::sync::Arc;

const FRAME_NAMES: [&str; 10] = [
    "frame0", "frame1", "frame2", "frame3", "frame4", "frame5", "frame6", "frame7", "frame8",
    "frame9",
];

fn pipeline() -> Renderer {
    let scheduler = Arc::new(JobScheduler::new(2));
    let device = Arc::new(HeadlessDevice::new());
    Renderer::new(device, scheduler, RendererSettings::new()).expect("headless startup succeeds")
}

fn drain_render_thread(renderer: &Renderer) {
    let (tx, rx) = std::sync::mpsc::channel();
    renderer.run_in_render_thread(move |_ctx| {
        let _ = tx.send(());
    });
    rx.recv().expect("render thread is alive");
}

fn profiled_frame(renderer: &Renderer, name: &'static str) {
    renderer.begin_profile_block(name);
    renderer.end_profile_block();
    renderer.frame();
}

#[test]
fn an_unread_ring_keeps_the_oldest_three_frames() {
    let renderer = pipeline();

    for name in FRAME_NAMES {
        profiled_frame(&renderer, name);
    }
    drain_render_thread(&renderer);

    // Only the oldest three frames survive; everything later was dropped
    // rather than overwriting unread history.
    let mut out: Vec<GpuTiming> = Vec::new();
    for expected in FRAME_NAMES.iter().take(PROFILER_HISTORY_FRAMES) {
        assert!(renderer.get_gpu_timings(&mut out));
        assert_eq!(out.len(), 2, "one begin and one end record per frame");
        assert_eq!(out[0].name, *expected);
        assert!(!out[0].is_end);
        assert!(out[1].is_end);
    }
    assert!(
        !renderer.get_gpu_timings(&mut out),
        "frames beyond the oldest three were dropped"
    );
}

#[test]
fn reading_a_slot_makes_it_writable_again() {
    let renderer = pipeline();

    for name in FRAME_NAMES.into_iter().take(4) {
        profiled_frame(&renderer, name);
    }
    drain_render_thread(&renderer);

    let mut out: Vec<GpuTiming> = Vec::new();
    assert!(renderer.get_gpu_timings(&mut out));
    assert_eq!(out[0].name, "frame0");

    // One slot is free again, so one more frame can be recorded.
    profiled_frame(&renderer, "late");
    drain_render_thread(&renderer);

    assert!(renderer.get_gpu_timings(&mut out));
    assert_eq!(out[0].name, "frame1");
    assert!(renderer.get_gpu_timings(&mut out));
    assert_eq!(out[0].name, "frame2");
    assert!(renderer.get_gpu_timings(&mut out));
    assert_eq!(out[0].name, "late");
    assert!(!renderer.get_gpu_timings(&mut out));
}

#[test]
fn no_frame_of_timings_is_returned_twice() {
    let renderer = pipeline();

    for name in FRAME_NAMES.into_iter().take(PROFILER_HISTORY_FRAMES) {
        profiled_frame(&renderer, name);
    }
    drain_render_thread(&renderer);

    let mut seen = Vec::new();
    let mut out: Vec<GpuTiming> = Vec::new();
    while renderer.get_gpu_timings(&mut out) {
        seen.push(out[0].name);
    }
    assert_eq!(seen, ["frame0", "frame1", "frame2"]);
}

#[test]
fn timestamps_within_a_block_are_ordered() {
    let renderer = pipeline();
    profiled_frame(&renderer, "frame0");
    drain_render_thread(&renderer);

    let mut out: Vec<GpuTiming> = Vec::new();
    assert!(renderer.get_gpu_timings(&mut out));
    assert!(
        out[1].timestamp >= out[0].timestamp,
        "the end mark cannot precede the begin mark"
    );
}
