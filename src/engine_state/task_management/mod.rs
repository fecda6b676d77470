//! # Task Management System
//!
//! This module runs chunk data generation and meshing off the main thread.
//!
//! ## Architecture Overview
//!
//! - `ChunkLoader`: owns the background worker and the channel feeding it
//! - `ChunkBatch`: the chunks and viewpoint sent in one dispatch
//! - `process_batch`: the work done for a batch, shared by both backends
//!
//! ## Threaded Backend
//! - One named OS thread owns the terrain source.
//! - It blocks on `recv()`. On wake it drains every batch already queued with
//!   `try_recv()` and merges them, so a burst of small dispatches is processed
//!   as one priority-ordered batch against the newest viewpoint.
//! - Dropping the loader closes the channel; the worker finishes its current
//!   batch, sees the disconnect and exits, and the drop joins it.
//!
//! ## Inline Backend
//! - Batches are processed on the caller's thread inside `dispatch`. Useful for
//!   tools and deterministic tests.
//!
//! ## Ownership Hand-off
//! Chunks inside a batch are not marked loaded. The main thread leaves their
//! meshes and GPU state alone until the worker marks them loaded again.

pub mod task;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info};
use web_time::Instant;

use crate::engine_state::voxels::block::BlockRegistry;
use crate::engine_state::voxels::terrain::TerrainSource;
use crate::error::{EngineError, Result};
use task::{process_batch, ChunkBatch};

/// Name of the background loader thread.
pub const LOADER_THREAD_NAME: &str = "chunk-loader";

enum LoaderBackend {
    Threaded {
        sender: Option<Sender<ChunkBatch>>,
        worker: Option<JoinHandle<()>>,
    },
    Inline {
        terrain: Box<dyn TerrainSource>,
    },
}

/// Sends chunk batches to be generated and meshed.
pub struct ChunkLoader {
    backend: LoaderBackend,
    registry: Arc<BlockRegistry>,
    pending: Arc<AtomicUsize>,
}

impl ChunkLoader {
    /// Starts a background worker that owns `terrain`.
    ///
    /// # Returns
    /// `Err(EngineError::ThreadSpawn)` if the OS refuses to start the thread.
    pub fn spawn(terrain: Box<dyn TerrainSource>, registry: Arc<BlockRegistry>) -> Result<Self> {
        let (sender, receiver) = channel::<ChunkBatch>();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker_registry = Arc::clone(&registry);
        let worker_pending = Arc::clone(&pending);
        let worker = thread::Builder::new()
            .name(LOADER_THREAD_NAME.to_string())
            .spawn(move || run_worker(receiver, terrain, worker_registry, worker_pending))
            .map_err(EngineError::ThreadSpawn)?;

        info!("Chunk loader started on thread '{}'", LOADER_THREAD_NAME);
        Ok(Self {
            backend: LoaderBackend::Threaded {
                sender: Some(sender),
                worker: Some(worker),
            },
            registry,
            pending,
        })
    }

    /// Creates a loader that processes batches synchronously in
    /// [`dispatch`](Self::dispatch).
    pub fn inline(terrain: Box<dyn TerrainSource>, registry: Arc<BlockRegistry>) -> Self {
        Self {
            backend: LoaderBackend::Inline { terrain },
            registry,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Whether batches are processed on a background thread.
    pub fn is_threaded(&self) -> bool {
        matches!(self.backend, LoaderBackend::Threaded { .. })
    }

    /// Chunks dispatched and not yet handed back.
    pub fn pending_chunks(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Hands a batch to the worker.
    ///
    /// # Returns
    /// `Err(EngineError::LoaderDisconnected)` if the worker thread has exited.
    pub fn dispatch(&mut self, batch: ChunkBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        match &mut self.backend {
            LoaderBackend::Threaded { sender, .. } => {
                let sender = sender.as_ref().ok_or(EngineError::LoaderDisconnected)?;
                self.pending.fetch_add(count, Ordering::AcqRel);
                if sender.send(batch).is_err() {
                    self.pending.fetch_sub(count, Ordering::AcqRel);
                    return Err(EngineError::LoaderDisconnected);
                }
            }
            LoaderBackend::Inline { terrain } => {
                let report = process_batch(batch, terrain.as_mut(), &self.registry);
                debug!("Processed inline batch: {:?}", report);
            }
        }
        Ok(())
    }
}

fn run_worker(
    receiver: Receiver<ChunkBatch>,
    mut terrain: Box<dyn TerrainSource>,
    registry: Arc<BlockRegistry>,
    pending: Arc<AtomicUsize>,
) {
    while let Ok(mut batch) = receiver.recv() {
        while let Ok(later) = receiver.try_recv() {
            batch.merge(later);
        }

        let count = batch.len();
        let started = Instant::now();
        let report = process_batch(batch, terrain.as_mut(), &registry);
        pending.fetch_sub(count, Ordering::AcqRel);
        debug!(
            "Processed {} chunks in {:?}: {:?}",
            count,
            started.elapsed(),
            report
        );
    }
    info!("Chunk loader channel closed, worker exiting");
}

impl Drop for ChunkLoader {
    fn drop(&mut self) {
        if let LoaderBackend::Threaded { sender, worker } = &mut self.backend {
            drop(sender.take());
            if let Some(worker) = worker.take() {
                if worker.join().is_err() {
                    error!("Chunk loader thread panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::chunk::Chunk;
    use crate::engine_state::voxels::terrain::TerrainFn;
    use cgmath::Point3;
    use std::time::Duration;

    fn dirt() -> Box<dyn TerrainSource> {
        Box::new(TerrainFn(|_, _, _| BlockType::DIRT))
    }

    #[test]
    fn inline_loader_finishes_during_dispatch() {
        let mut loader = ChunkLoader::inline(dirt(), Arc::new(BlockRegistry::standard()));
        let chunk = Arc::new(Chunk::new(Point3::new(0, 0, 0)));
        let mut batch = ChunkBatch::new(Point3::new(0, 0, 0), 1);
        batch.chunks.push(Arc::clone(&chunk));

        loader.dispatch(batch).unwrap();
        assert!(!loader.is_threaded());
        assert_eq!(loader.pending_chunks(), 0);
        assert!(chunk.is_data_generated());
        assert!(chunk.is_loaded());
    }

    #[test]
    fn threaded_loader_hands_chunks_back() {
        let mut loader = ChunkLoader::spawn(dirt(), Arc::new(BlockRegistry::standard())).unwrap();
        let chunks: Vec<_> = (0..4)
            .map(|x| Arc::new(Chunk::new(Point3::new(x, 0, 0))))
            .collect();
        for chunk in &chunks {
            let mut batch = ChunkBatch::new(Point3::new(0, 0, 0), 2);
            batch.chunks.push(Arc::clone(chunk));
            loader.dispatch(batch).unwrap();
        }

        for _ in 0..500 {
            if loader.pending_chunks() == 0 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(loader.pending_chunks(), 0);
        assert!(chunks.iter().all(|chunk| chunk.is_loaded() && chunk.is_data_generated()));
        drop(loader);
    }
}
