//! # Terrain Module
//!
//! Per-block terrain decisions consumed by chunk data generation.
//!
//! The loader thread owns exactly one [`TerrainSource`] and calls
//! [`TerrainSource::clear_cache`] after every batch, so sources are free to
//! memoize whatever they like between clears.
//!
//! [`TerrainGenerator`] is the built-in height-map world: rolling hills from
//! fractal Perlin noise, stone peaks above the grass line, sandy beaches and
//! water filling everything below sea level.

use std::num::NonZeroUsize;

use lru::LruCache;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::block::block_type::BlockType;
use crate::config::TerrainConfig;

/// Source of block types for world coordinates.
pub trait TerrainSource: Send {
    /// Block type at a world block coordinate.
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockType;

    /// Drops memoized data. Called once per processed batch.
    fn clear_cache(&mut self) {}
}

/// Adapts a closure into a [`TerrainSource`] without a cache.
///
/// ```
/// use chunk_streamer::{BlockType, TerrainFn, TerrainSource};
///
/// let mut flat = TerrainFn(|_x, y, _z| if y < 0 { BlockType::STONE } else { BlockType::AIR });
/// assert_eq!(flat.generate(0, -1, 0), BlockType::STONE);
/// ```
pub struct TerrainFn<F>(pub F);

impl<F> TerrainSource for TerrainFn<F>
where
    F: FnMut(i32, i32, i32) -> BlockType + Send,
{
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockType {
        (self.0)(x, y, z)
    }
}

/// Memoized column data of the height map.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TerrainData {
    /// Surface height of the column
    pub height: i32,
    /// Per-column jitter applied to the grass line and beach depth
    pub offset: i32,
}

const HEIGHT_SCALE: f64 = 256.0;
const HEIGHT_OCTAVES: usize = 6;
const OFFSET_SCALE: f64 = 16.0;
const OFFSET_OCTAVES: usize = 3;
const OFFSET_AMPLITUDE: f64 = 64.0;
/// How far above sea level a column may reach and still grow a beach.
const BEACH_MARGIN: i32 = 2;

/// Height-map terrain built from two fractal noise fields.
pub struct TerrainGenerator {
    config: TerrainConfig,
    height_noise: Fbm<Perlin>,
    offset_noise: Fbm<Perlin>,
    cache: LruCache<(i32, i32), TerrainData>,
}

impl TerrainGenerator {
    /// Creates a generator from its configuration.
    pub fn new(config: TerrainConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let height_noise = Fbm::<Perlin>::new(config.seed)
            .set_octaves(HEIGHT_OCTAVES)
            .set_frequency(1.0 / HEIGHT_SCALE);
        let offset_noise = Fbm::<Perlin>::new(config.seed.wrapping_add(1))
            .set_octaves(OFFSET_OCTAVES)
            .set_frequency(1.0 / OFFSET_SCALE);

        Self {
            config,
            height_noise,
            offset_noise,
            cache: LruCache::new(capacity),
        }
    }

    /// Number of memoized columns.
    pub fn cached_columns(&self) -> usize {
        self.cache.len()
    }

    /// Column data for `(x, z)`, computed on a cache miss.
    pub fn terrain_data(&mut self, x: i32, z: i32) -> TerrainData {
        if let Some(data) = self.cache.get(&(x, z)) {
            return *data;
        }

        let point = [x as f64, z as f64];
        let height_sample = Self::unit(self.height_noise.get(point));
        let offset_sample = Self::unit(self.offset_noise.get(point));
        let data = TerrainData {
            height: (height_sample.powf(1.5) * self.config.max_height as f64) as i32,
            offset: (offset_sample * OFFSET_AMPLITUDE) as i32,
        };
        self.cache.put((x, z), data);
        data
    }

    /// Maps a noise sample from roughly `[-1, 1]` into `[0, 1]`.
    fn unit(sample: f64) -> f64 {
        ((sample + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Block type for a cell given its column data.
    pub fn classify(&self, data: TerrainData, y: i32) -> BlockType {
        let grass_height = self.config.grass_level + data.offset;
        let water_level = self.config.water_level;

        if y > data.height {
            if y > water_level {
                BlockType::AIR
            } else {
                BlockType::WATER
            }
        } else if y > grass_height {
            BlockType::STONE
        } else if data.height < water_level + BEACH_MARGIN && y > data.height - data.offset / 2 {
            BlockType::SAND
        } else if y == data.height {
            BlockType::GRASS
        } else {
            BlockType::DIRT
        }
    }
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self::new(TerrainConfig::default())
    }
}

impl TerrainSource for TerrainGenerator {
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockType {
        let data = self.terrain_data(x, z);
        self.classify(data, y)
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
