//! # Chunk Streamer Demo
//!
//! A headless fly-through over generated terrain. The camera drifts forward
//! while turning at random, and streaming statistics are logged once a second.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use std::sync::Arc;
use std::thread;

use cgmath::{Deg, InnerSpace, Rad, Vector3};
use log::{error, info};
use web_time::{Duration, Instant};

use chunk_streamer::{
    BlockRegistry, BlockType, Camera, ChunkManager, EngineConfig, EngineState, HeadlessUploader,
    Projection, Result, TerrainGenerator,
};

const FRAME_TIME: Duration = Duration::from_millis(16);
const FRAME_COUNT: usize = 1200;
const STATS_INTERVAL: usize = 60;
const EDIT_INTERVAL: usize = 240;
/// Flight speed in blocks per second.
const FLY_SPEED: f32 = 20.0;
/// Largest random turn per frame in radians.
const MAX_TURN: f32 = 0.03;

fn main() {
    chunk_streamer::init_logging();
    if let Err(err) = run() {
        error!("Demo failed: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            EngineConfig::from_path(path)?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;

    let manager = ChunkManager::new(
        config.streaming.clone(),
        Arc::new(BlockRegistry::standard()),
        Box::new(TerrainGenerator::new(config.terrain.clone())),
        HeadlessUploader::new(),
    )?;
    let camera = Camera::new(
        (0.0, (config.terrain.grass_level + 20) as f32, 0.0),
        Deg(0.0),
        Deg(-20.0),
        Projection::default(),
        config.streaming.render_distance,
    );
    let mut engine = EngineState::new(camera, manager);
    let mut rng = fastrand::Rng::with_seed(u64::from(config.terrain.seed));

    let started = Instant::now();
    let mut last_frame = started;
    for frame in 0..FRAME_COUNT {
        let now = Instant::now();
        let dt = now - last_frame;
        last_frame = now;

        let turn = if rng.bool() {
            (rng.f32() * 2.0 - 1.0) * MAX_TURN
        } else {
            0.0
        };
        fly(engine.camera_mut(), dt, Rad(turn));
        let stats = engine.update();

        if frame % EDIT_INTERVAL == EDIT_INTERVAL - 1 && engine.break_selected_block() {
            engine.place_block(BlockType::SAND);
        }

        if frame % STATS_INTERVAL == 0 {
            let manager = engine.chunk_manager();
            info!(
                "Frame {}: camera chunk {:?}, {} chunks, {} pending, {} drawn ({} indices), {:?}",
                frame,
                engine.camera().chunk_position(),
                manager.world().len(),
                manager.pending_chunks(),
                engine.render_list().len(),
                engine.render_list().index_count(),
                stats
            );
        }

        thread::sleep(FRAME_TIME);
    }

    let uploader = engine.chunk_manager().uploader();
    info!(
        "Finished {} frames in {:?}: {} live meshes, {} bytes resident, {} uploads, {} releases",
        FRAME_COUNT,
        started.elapsed(),
        uploader.live_meshes(),
        uploader.resident_bytes(),
        uploader.total_uploads(),
        uploader.total_releases()
    );
    Ok(())
}

/// Moves the camera forward along its heading, keeping its height.
fn fly(camera: &mut Camera, dt: Duration, turn: Rad<f32>) {
    camera.rotate(turn, Rad(0.0));
    let (yaw_sin, yaw_cos) = camera.yaw.0.sin_cos();
    let heading = Vector3::new(yaw_cos, 0.0, yaw_sin).normalize();
    camera.position += heading * FLY_SPEED * dt.as_secs_f32();
}
