use std::hint::black_box;
use std::time::Instant;

use glam::Vec3;
use tilelight_common::RenderConfig;
use tilelight_render::demo::DemoScene;
use tilelight_render::{FrameController, Light, RecordingBackend, RenderBackend};

/// Backend that drops every submission, so only batching is measured.
struct NullBackend;

impl RenderBackend for NullBackend {
    fn submit(&mut self, frame: &tilelight_render::FrameSubmission<'_>) {
        black_box(frame.vertex_count);
    }
}

fn bench_floor_fill(tiles: usize, iterations: usize) {
    let mut frames = FrameController::new(RenderConfig::default()).unwrap();
    let side = (tiles as f32).sqrt().ceil() as usize;

    let start = Instant::now();
    for _ in 0..iterations {
        frames.begin_frame(Vec3::ZERO).unwrap();
        for i in 0..tiles {
            let x = (i % side) as f32 * 8.0;
            let z = (i / side) as f32 * 8.0;
            frames.emit_floor_tile(black_box(x), black_box(z), 1).unwrap();
        }
        black_box(frames.end_frame(&mut NullBackend).unwrap());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  floor fill ({tiles} tiles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_light_culling(candidates: usize, iterations: usize) {
    let mut frames = FrameController::new(RenderConfig::default()).unwrap();
    let lights: Vec<Light> = (0..candidates)
        .map(|i| Light::new(Vec3::new(i as f32 * 24.0, 4.0, 0.0), Vec3::ONE, 0.05))
        .collect();

    let start = Instant::now();
    for _ in 0..iterations {
        frames.begin_frame(Vec3::ZERO).unwrap();
        for light in &lights {
            black_box(frames.push_light(*light).unwrap());
        }
        black_box(frames.end_frame(&mut NullBackend).unwrap());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  light culling ({candidates} candidates, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_demo_frames(iterations: usize) {
    let scene = DemoScene::new();
    let mut frames = FrameController::new(RenderConfig::default()).unwrap();
    frames.build_level(|level| scene.build_level(level)).unwrap();
    let mut backend = RecordingBackend::new();

    let start = Instant::now();
    for i in 0..iterations {
        frames.begin_frame(scene.start_camera()).unwrap();
        scene.emit_frame(&mut frames, i as f32 / 60.0).unwrap();
        if i % 100 == 0 {
            frames.end_frame(&mut backend).unwrap();
        } else {
            frames.end_frame(&mut NullBackend).unwrap();
        }
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  demo scene ({iterations} frames): {per_iter:?}/frame, total {elapsed:?}");
}

fn main() {
    println!("=== Frame Batching Benchmarks ===\n");

    println!("Dynamic floor tiles:");
    bench_floor_fill(100, 10000);
    bench_floor_fill(1000, 1000);
    bench_floor_fill(10000, 100);

    println!("\nLight culling:");
    bench_light_culling(16, 10000);
    bench_light_culling(256, 1000);

    println!("\nDemo scene:");
    bench_demo_frames(1000);

    println!("\n=== Done ===");
}
