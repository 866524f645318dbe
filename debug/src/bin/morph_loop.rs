//! Headless host loop: PointMorph driving PointMorphPlugin at a fixed 60 Hz step.
//! Run: cargo run -p debug --bin morph_loop -- [config.toml] [frames]

use point_api::{ExtractedView, PointCloudBackend};
use pointmorph_bridge::PointMorphPlugin;
use pointmorph_core::{primitives, MorphConfig, PointMorph};
use pointmorph_renderer::RendererConfig;

const DT: f32 = 1.0 / 60.0;

fn main() -> Result<(), String> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => MorphConfig::from_toml_file(&path).map_err(|e| e.to_string())?,
        None => MorphConfig::default(),
    };
    let frames: u32 = match args.next() {
        Some(n) => n.parse().map_err(|e| format!("frames: {}", e))?,
        None => 600,
    };

    let mut backend: Box<dyn PointCloudBackend> = Box::new(PointMorphPlugin::headless(RendererConfig::default())?);
    let mut morph = PointMorph::new(primitives::demo_set(), config).map_err(|e| e.to_string())?;
    morph.start(backend.as_mut()).map_err(|e| e.to_string())?;

    let view = ExtractedView::default();
    let mut completed = 0;
    for frame in 0..frames {
        morph.update(DT, backend.as_mut()).map_err(|e| e.to_string())?;
        backend.render_frame(&view)?;
        if morph.completed_transitions() != completed {
            completed = morph.completed_transitions();
            let state = morph.state();
            log::info!(
                "frame {}: transition {} done, mesh {} with {} points (step {:.1})",
                frame,
                completed,
                state.current_mesh_index,
                state.active_point_count,
                state.step_size
            );
        }
    }
    morph.stop(backend.as_mut());
    println!("PointMorph morph_loop: {} frames, {} transitions OK", frames, completed);
    Ok(())
}
