use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cgmath::{Deg, Point3};
use chunk_streamer::{
    BlockRegistry, BlockType, Camera, Chunk, ChunkManager, HeadlessUploader, Projection,
    StreamingConfig, TerrainFn,
};

fn flat_terrain() -> TerrainFn<impl FnMut(i32, i32, i32) -> BlockType + Send> {
    TerrainFn(|_: i32, y: i32, _: i32| {
        if y < 0 {
            BlockType::STONE
        } else {
            BlockType::AIR
        }
    })
}

fn inline_manager(config: StreamingConfig) -> ChunkManager {
    ChunkManager::with_inline_loader(
        config,
        Arc::new(BlockRegistry::standard()),
        Box::new(flat_terrain()),
        HeadlessUploader::new(),
    )
}

fn camera_at(x: f32, y: f32, z: f32, render_distance: i32) -> Camera {
    Camera::new((x, y, z), Deg(0.0), Deg(-10.0), Projection::default(), render_distance)
}

fn settle(manager: &mut ChunkManager, camera: &Camera) {
    for _ in 0..16 {
        manager.update(camera);
    }
}

#[test]
fn render_distance_one_at_origin_loads_eighty_one_chunks() {
    let mut manager = inline_manager(StreamingConfig::default());
    let camera = camera_at(8.0, 8.0, 8.0, 1);

    let stats = manager.update(&camera);
    assert_eq!(stats.created, 27);
    assert_eq!(stats.neighbors_created, 54);
    assert!(stats.full_rescan);

    settle(&mut manager, &camera);
    let world = manager.world();
    assert_eq!(world.len(), 81);
    assert!(world.iter().all(|chunk| chunk.is_loaded()));
    assert!(world.check_neighbor_symmetry().is_empty());

    let center = world.get_chunk_at(Point3::new(0, 0, 0)).unwrap();
    assert!(center.is_mesh_generated());
    assert!(center.is_mesh_loaded());
    assert!(manager.is_position_fully_loaded());
}

#[test]
fn updates_without_movement_are_idempotent() {
    let mut manager = inline_manager(StreamingConfig::default());
    let camera = camera_at(8.0, 8.0, 8.0, 2);
    settle(&mut manager, &camera);

    let before = manager.render_list().clone();
    assert!(!before.is_empty());
    let stats = manager.update(&camera);
    assert_eq!(stats.created, 0);
    assert_eq!(stats.neighbors_created, 0);
    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.queued_for_mesh, 0);
    assert_eq!(stats.uploaded, 0);
    assert_eq!(manager.render_list(), &before);
}

#[test]
fn creation_respects_the_frame_budget() {
    let config = StreamingConfig {
        max_generated: 10,
        ..StreamingConfig::default()
    };
    let mut manager = inline_manager(config);
    let camera = camera_at(8.0, 8.0, 8.0, 2);

    let stats = manager.update(&camera);
    assert_eq!(stats.created, 10);
    assert!(!manager.is_position_fully_loaded());

    let mut frames = 1;
    while !manager.is_position_fully_loaded() {
        let stats = manager.update(&camera);
        assert!(stats.created + stats.queued_for_mesh <= 10);
        assert!(stats.full_rescan);
        frames += 1;
        assert!(frames < 100, "creation never finished");
    }
    assert!(manager.world().check_neighbor_symmetry().is_empty());
}

#[test]
fn uploads_and_deletions_respect_their_budgets() {
    let config = StreamingConfig {
        max_loaded: 3,
        max_deleted: 4,
        ..StreamingConfig::default()
    };
    let mut manager = inline_manager(config);
    let mut camera = camera_at(8.0, 8.0, 8.0, 1);
    manager.update(&camera);
    let stats = manager.update(&camera);
    assert_eq!(stats.uploaded, 3);

    settle(&mut manager, &camera);
    camera.position.x += 16.0 * 20.0;
    for _ in 0..40 {
        let stats = manager.update(&camera);
        assert!(stats.uploaded <= 3);
        assert!(stats.deleted <= 4);
    }
    assert!(manager.world().get_chunk_at(Point3::new(0, 0, 0)).is_none());
}

#[test]
fn moving_away_evicts_old_chunks_safely() {
    let mut manager = inline_manager(StreamingConfig::default());
    let mut camera = camera_at(8.0, 8.0, 8.0, 1);
    settle(&mut manager, &camera);
    let uploads_before = manager.uploader().live_meshes();
    assert!(uploads_before > 0);

    camera.position.x += 16.0 * 10.0;
    for _ in 0..8 {
        manager.update(&camera);
        let world = manager.world();
        assert!(world.check_neighbor_symmetry().is_empty());
        assert!(world
            .iter()
            .all(|chunk| chunk.position.x >= 10 - 3 || chunk.position.x <= 1 + 2));
    }

    let world = manager.world();
    let current = camera.chunk_position();
    assert!(world.iter().all(|chunk| {
        let d = chunk.position - current;
        d.x.abs().max(d.y.abs()).max(d.z.abs()) <= 1 + 2
    }));
    assert_eq!(world.len(), 81);
    assert_eq!(
        manager.uploader().total_uploads() - manager.uploader().total_releases(),
        manager.uploader().live_meshes() as u64
    );
}

#[test]
fn slab_scan_after_small_move_matches_a_fresh_start() {
    let mut moved = inline_manager(StreamingConfig::default());
    let mut camera = camera_at(8.0, 8.0, 8.0, 2);
    settle(&mut moved, &camera);

    camera.position.x += 16.0;
    camera.position.z -= 16.0;
    let stats = moved.update(&camera);
    assert!(!stats.full_rescan);
    assert!(stats.created > 0);
    settle(&mut moved, &camera);

    let mut fresh = inline_manager(StreamingConfig::default());
    settle(&mut fresh, &camera);

    let positions = |manager: &ChunkManager| {
        let mut positions: Vec<_> = manager
            .render_list()
            .entries()
            .iter()
            .map(|entry| entry.position)
            .collect();
        positions.sort_by_key(|p| (p.x, p.y, p.z));
        positions
    };
    assert_eq!(positions(&moved), positions(&fresh));
}

#[test]
fn edits_rebuild_meshes_and_read_back() {
    let mut manager = inline_manager(StreamingConfig::default());
    let camera = camera_at(8.0, 8.0, 8.0, 1);
    settle(&mut manager, &camera);

    assert_eq!(manager.get_block(Point3::new(4, -1, 4)), BlockType::STONE);
    assert_eq!(manager.get_block(Point3::new(4, 3, 4)), BlockType::AIR);
    assert_eq!(manager.get_block(Point3::new(4000, 0, 0)), BlockType::AIR);

    let below = manager.world().get_chunk_at(Point3::new(0, -1, 0)).unwrap();
    let faces_before = below.with_meshes(|meshes| meshes.face_count());
    let uploads_before = manager.uploader().total_uploads();

    assert!(manager.set_block(Point3::new(4, -1, 4), BlockType::AIR));
    assert_eq!(manager.get_block(Point3::new(4, -1, 4)), BlockType::AIR);
    // The hole removes one top face and exposes four sides and a floor.
    assert_eq!(
        below.with_meshes(|meshes| meshes.face_count()),
        faces_before + 4
    );
    assert!(manager.uploader().total_uploads() > uploads_before);

    assert!(!manager.set_block(Point3::new(4000, 0, 0), BlockType::SAND));
}

#[test]
fn distant_teleport_evicts_the_old_neighborhood() {
    let mut manager = inline_manager(StreamingConfig::default());
    let mut camera = camera_at(8.0, 8.0, 8.0, 1);
    settle(&mut manager, &camera);

    camera.position.x = 16.0 * 50_000.0 + 8.0;
    let stats = manager.update(&camera);
    assert!(stats.full_rescan);
    assert_eq!(stats.queued_for_mesh, 0);
    settle(&mut manager, &camera);

    let world = manager.world();
    assert!(world.get_chunk_at(Point3::new(0, 0, 0)).is_none());
    assert!(world.iter().all(|chunk| chunk.position.x >= 50_000 - 3));
    assert_eq!(world.len(), 81);
    assert!(world.check_neighbor_symmetry().is_empty());
    assert!(manager
        .render_list()
        .entries()
        .iter()
        .all(|entry| entry.distance_squared <= 3));
}

fn lifecycle_flags(chunk: &Chunk) -> [bool; 3] {
    [
        chunk.is_data_generated(),
        chunk.is_mesh_generated(),
        chunk.is_mesh_loaded(),
    ]
}

fn assert_no_flag_reverted(before: [bool; 3], after: [bool; 3]) {
    for (was, is) in before.into_iter().zip(after) {
        assert!(!was || is, "lifecycle flag reverted: {before:?} -> {after:?}");
    }
}

#[test]
fn lifecycle_flags_never_revert_and_data_is_generated_once() {
    let calls: Arc<Mutex<HashMap<(i32, i32, i32), usize>>> = Arc::default();
    let counter = Arc::clone(&calls);
    let mut manager = ChunkManager::with_inline_loader(
        StreamingConfig::default(),
        Arc::new(BlockRegistry::standard()),
        Box::new(TerrainFn(move |x: i32, y: i32, z: i32| {
            let chunk = (x.div_euclid(16), y.div_euclid(16), z.div_euclid(16));
            *counter.lock().unwrap().entry(chunk).or_default() += 1;
            if y < 0 {
                BlockType::STONE
            } else {
                BlockType::AIR
            }
        })),
        HeadlessUploader::new(),
    );
    let mut camera = camera_at(8.0, 8.0, 8.0, 1);

    // (2, 0, 0) starts as a neighbor that only gets data, then is meshed
    // after the viewer steps toward it.
    manager.update(&camera);
    let chunk = manager.world().get_chunk_at(Point3::new(2, 0, 0)).unwrap();
    let mut flags = lifecycle_flags(&chunk);
    assert_eq!(flags, [true, false, false]);

    for _ in 0..8 {
        manager.update(&camera);
        let next = lifecycle_flags(&chunk);
        assert_no_flag_reverted(flags, next);
        flags = next;
    }
    assert_eq!(flags, [true, false, false]);

    camera.position.x += 16.0;
    let stats = manager.update(&camera);
    assert!(stats.queued_for_mesh > 0);
    assert!(chunk.is_loaded());
    for _ in 0..8 {
        let next = lifecycle_flags(&chunk);
        assert_no_flag_reverted(flags, next);
        flags = next;
        manager.update(&camera);
    }
    assert_eq!(lifecycle_flags(&chunk), [true, true, true]);

    let uploads_before = manager.uploader().total_uploads();
    assert!(manager.set_block(Point3::new(40, 3, 8), BlockType::STONE));
    assert_eq!(lifecycle_flags(&chunk), [true, true, true]);
    assert!(manager.uploader().total_uploads() > uploads_before);
    manager.update(&camera);
    assert_eq!(lifecycle_flags(&chunk), [true, true, true]);

    assert_eq!(calls.lock().unwrap().get(&(2, 0, 0)), Some(&4096));
}

#[test]
fn writing_the_same_block_skips_the_remesh() {
    let mut manager = inline_manager(StreamingConfig::default());
    let camera = camera_at(8.0, 8.0, 8.0, 1);
    settle(&mut manager, &camera);

    let uploads_before = manager.uploader().total_uploads();
    assert!(manager.set_block(Point3::new(0, -1, 0), BlockType::STONE));
    assert!(manager.set_block(Point3::new(4, 3, 4), BlockType::AIR));
    assert_eq!(manager.uploader().total_uploads(), uploads_before);

    assert!(manager.set_block(Point3::new(4, 3, 4), BlockType::SAND));
    assert!(manager.uploader().total_uploads() > uploads_before);
}

#[test]
fn threaded_loader_converges_to_the_same_world() {
    let mut manager = ChunkManager::new(
        StreamingConfig::default(),
        Arc::new(BlockRegistry::standard()),
        Box::new(flat_terrain()),
        HeadlessUploader::new(),
    )
    .unwrap();
    let camera = camera_at(8.0, 8.0, 8.0, 1);

    for _ in 0..1000 {
        manager.update(&camera);
        let settled = manager.pending_chunks() == 0
            && manager.world().len() == 81
            && manager.world().iter().all(|chunk| chunk.is_loaded())
            && manager
                .world()
                .get_chunk_at(Point3::new(0, 0, 0))
                .is_some_and(|chunk| chunk.is_mesh_loaded());
        if settled {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    manager.update(&camera);
    let world = manager.world();
    assert_eq!(world.len(), 81);
    assert!(world.iter().all(|chunk| chunk.is_loaded()));
    assert!(world.check_neighbor_symmetry().is_empty());
}
