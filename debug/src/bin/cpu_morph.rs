//! Runs PointMorph against the CPU reference backend and prints per-transition statistics.
//! Run: cargo run -p debug --bin cpu_morph -- [seconds]

use glam::Vec3;
use point_api::{ExtractedView, PointCloudBackend};
use pointmorph_core::{primitives, CpuBackend, MorphConfig, Phase, PointMorph};

const DT: f32 = 1.0 / 60.0;

fn bounds(points: &[[f32; 4]]) -> f32 {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for p in points {
        let p = Vec3::from_slice(&p[..3]);
        min = min.min(p);
        max = max.max(p);
    }
    if points.is_empty() { 0.0 } else { (max - min).length() }
}

fn main() -> Result<(), String> {
    env_logger::init();
    let seconds: f32 = match std::env::args().nth(1) {
        Some(s) => s.parse().map_err(|e| format!("seconds: {}", e))?,
        None => 30.0,
    };
    let config = MorphConfig { resolution: 120, seed: Some(7), ..MorphConfig::default() };
    let mut backend = CpuBackend::new();
    let mut morph = PointMorph::new(primitives::demo_set(), config).map_err(|e| e.to_string())?;
    morph.start(&mut backend).map_err(|e| e.to_string())?;

    let view = ExtractedView::default();
    let mut min_active = u32::MAX;
    let mut max_active = 0;
    let mut was_transitioning = false;
    let frames = (seconds / DT) as u32;
    for _ in 0..frames {
        morph.update(DT, &mut backend).map_err(|e| e.to_string())?;
        backend.render_frame(&view)?;
        let state = morph.state();
        match morph.phase() {
            Phase::Transitioning => {
                if !was_transitioning {
                    let ease = morph.current_ease().map(|e| e.name()).unwrap_or("-");
                    println!("mesh {} -> {} ({})", state.current_mesh_index, state.target_mesh_index, ease);
                    min_active = u32::MAX;
                    max_active = 0;
                }
                min_active = min_active.min(state.active_point_count);
                max_active = max_active.max(state.active_point_count);
                was_transitioning = true;
            }
            Phase::Idle if was_transitioning => {
                println!(
                    "  settled: {} points (range {}..={}), step {:.1}, extent {:.2}, {} live buffers",
                    state.active_point_count,
                    min_active,
                    max_active,
                    state.step_size,
                    bounds(backend.visible_points()),
                    backend.live_buffers()
                );
                was_transitioning = false;
            }
            _ => {}
        }
    }
    morph.stop(&mut backend);
    println!(
        "{} transitions, {} dispatches, {} frames, {} buffers leaked",
        morph.completed_transitions(),
        backend.dispatch_count(),
        backend.frames_rendered(),
        backend.live_buffers()
    );
    Ok(())
}
