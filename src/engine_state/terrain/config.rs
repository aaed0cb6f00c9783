//! Fixed configuration constants for the terrain pipeline.
//!
//! Everything here is compile-time configuration; nothing is parsed at
//! runtime. Chunk dimensions are a power of two so chunk-coordinate math
//! stays exact in `f32` over the playable range.

/// Voxel cells per chunk along X.
pub const CHUNK_WIDTH: u32 = 64;
/// Voxel cells per chunk along Y.
pub const CHUNK_HEIGHT: u32 = 64;
/// Voxel cells per chunk along Z.
pub const CHUNK_DEPTH: u32 = 64;

/// Density grid points per chunk axis (one more than cells).
pub const GRID_POINTS_X: u32 = CHUNK_WIDTH + 1;
/// Density grid points per chunk axis (one more than cells).
pub const GRID_POINTS_Y: u32 = CHUNK_HEIGHT + 1;
/// Density grid points per chunk axis (one more than cells).
pub const GRID_POINTS_Z: u32 = CHUNK_DEPTH + 1;

/// Horizontal streaming radius around the observer, in chunks (Chebyshev).
pub const VIEW_DISTANCE: i32 = 6;
/// Vertical streaming half-height around the observer, in chunks.
pub const VERTICAL_BAND: i32 = 4;

/// Density value the extracted surface passes through.
pub const ISOLEVEL: f32 = 0.0;

/// Octaves of layered noise summed per density sample.
pub const NOISE_OCTAVES: u32 = 4;
/// Base spatial frequency of the first noise octave.
pub const NOISE_FREQUENCY: f32 = 0.01;
/// Amplitude multiplier applied per octave.
pub const NOISE_PERSISTENCE: f32 = 0.5;
/// Frequency multiplier applied per octave.
pub const NOISE_LACUNARITY: f32 = 2.0;
/// Height term subtracted from the noise sum so the field tilts toward a
/// roughly planar floor near y = 0 instead of pure volumetric noise.
pub const HEIGHT_BIAS: f32 = 0.015;

/// Far clipping plane distance in world units.
pub const RENDER_DISTANCE: f32 = 2000.0;
/// Near clipping plane distance in world units.
pub const NEAR_PLANE: f32 = 0.1;
/// Vertical field of view in degrees.
pub const FOV_DEGREES: f32 = 45.0;

/// Camera fly speed in world units per second.
pub const CAMERA_SPEED: f32 = 40.0;
/// Mouse-look sensitivity multiplier.
pub const MOUSE_SENSITIVITY: f32 = 0.4;
